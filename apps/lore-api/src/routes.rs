use axum::{
	Json, Router,
	extract::State,
	http::StatusCode,
	response::{IntoResponse, Response},
	routing::{get, post},
};
use serde::Serialize;

use crate::state::AppState;
use lore_service::{
	Error, GetContextRequest, GetContextResponse, ListContextsResponse, ProcessReport,
	ProcessScopeRequest, ProcessScopeResponse, RefreshContextRequest, RefreshContextResponse,
	RemoveContextRequest, RemoveContextResponse, ResolveContextRequest, ResolveContextResponse,
	ResolveRelevantContextRequest, SetContextRequest, SetContextResponse, StatsResponse,
};

pub fn router(state: AppState) -> Router {
	Router::new()
		.route("/health", get(health))
		.route("/v1/context/set", post(set_context))
		.route("/v1/context/remove", post(remove_context))
		.route("/v1/context/get", post(get_context))
		.route("/v1/context/list", get(list_contexts))
		.route("/v1/context/process", post(process_scope))
		.route("/v1/context/refresh", post(refresh_context))
		.route("/v1/context/resolve", post(resolve_context))
		.route("/v1/context/resolve-relevant", post(resolve_relevant_context))
		.with_state(state)
}

pub fn admin_router(state: AppState) -> Router {
	Router::new()
		.route("/v1/admin/stats", get(stats))
		.route("/v1/admin/process-unprocessed", post(process_unprocessed))
		.with_state(state)
}

async fn health() -> StatusCode {
	StatusCode::OK
}

async fn set_context(
	State(state): State<AppState>,
	Json(payload): Json<SetContextRequest>,
) -> Result<Json<SetContextResponse>, ApiError> {
	let response = state.service.set_context(payload).await?;

	Ok(Json(response))
}

async fn remove_context(
	State(state): State<AppState>,
	Json(payload): Json<RemoveContextRequest>,
) -> Result<Json<RemoveContextResponse>, ApiError> {
	let response = state.service.remove_context(payload).await?;

	Ok(Json(response))
}

async fn get_context(
	State(state): State<AppState>,
	Json(payload): Json<GetContextRequest>,
) -> Result<Json<GetContextResponse>, ApiError> {
	let response = state.service.get_context(payload).await?;

	Ok(Json(response))
}

async fn list_contexts(
	State(state): State<AppState>,
) -> Result<Json<ListContextsResponse>, ApiError> {
	let response = state.service.list_contexts().await?;

	Ok(Json(response))
}

async fn process_scope(
	State(state): State<AppState>,
	Json(payload): Json<ProcessScopeRequest>,
) -> Result<Json<ProcessScopeResponse>, ApiError> {
	let response = state.service.process_scope(payload).await?;

	Ok(Json(response))
}

async fn refresh_context(
	State(state): State<AppState>,
	Json(payload): Json<RefreshContextRequest>,
) -> Result<Json<RefreshContextResponse>, ApiError> {
	let response = state.service.refresh_context(payload).await?;

	Ok(Json(response))
}

// Resolution is fail-closed inside the service, so these two handlers cannot error; an
// empty prompt is the degraded response.
async fn resolve_context(
	State(state): State<AppState>,
	Json(payload): Json<ResolveContextRequest>,
) -> Json<ResolveContextResponse> {
	Json(state.service.resolve_context(payload).await)
}

async fn resolve_relevant_context(
	State(state): State<AppState>,
	Json(payload): Json<ResolveRelevantContextRequest>,
) -> Json<ResolveContextResponse> {
	Json(state.service.resolve_relevant_context(payload).await)
}

async fn stats(State(state): State<AppState>) -> Result<Json<StatsResponse>, ApiError> {
	let response = state.service.stats().await?;

	Ok(Json(response))
}

async fn process_unprocessed(
	State(state): State<AppState>,
) -> Result<Json<ProcessReport>, ApiError> {
	let response = state.service.process_all_unprocessed().await?;

	Ok(Json(response))
}

#[derive(Debug, Serialize)]
struct ErrorBody {
	error_code: String,
	message: String,
}

#[derive(Debug)]
pub struct ApiError {
	status: StatusCode,
	error_code: &'static str,
	message: String,
}

impl From<Error> for ApiError {
	fn from(err: Error) -> Self {
		let (status, error_code) = match &err {
			Error::InvalidRequest { .. } => (StatusCode::BAD_REQUEST, "invalid_request"),
			Error::ContentRejected { .. } =>
				(StatusCode::UNPROCESSABLE_ENTITY, "content_rejected"),
			Error::NotFound { .. } => (StatusCode::NOT_FOUND, "not_found"),
			Error::Fetch { .. } => (StatusCode::BAD_GATEWAY, "fetch_failed"),
			Error::Embedding { .. } => (StatusCode::BAD_GATEWAY, "embedding_failed"),
			Error::Storage { .. } => (StatusCode::INTERNAL_SERVER_ERROR, "storage_error"),
			Error::Qdrant { .. } => (StatusCode::INTERNAL_SERVER_ERROR, "qdrant_error"),
		};

		Self { status, error_code, message: err.to_string() }
	}
}
impl IntoResponse for ApiError {
	fn into_response(self) -> Response {
		let body = ErrorBody { error_code: self.error_code.to_string(), message: self.message };

		(self.status, Json(body)).into_response()
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn status_of(err: Error) -> (StatusCode, &'static str) {
		let api_err = ApiError::from(err);

		(api_err.status, api_err.error_code)
	}

	#[test]
	fn service_errors_map_to_stable_status_codes() {
		let invalid = Error::InvalidRequest { message: "blank target id".to_string() };
		let rejected = Error::ContentRejected { message: "too short".to_string() };
		let missing = Error::NotFound { message: "no document".to_string() };
		let fetch = Error::Fetch { message: "status 503".to_string() };
		let storage = Error::Storage { message: "pool closed".to_string() };

		assert_eq!(status_of(invalid), (StatusCode::BAD_REQUEST, "invalid_request"));
		assert_eq!(status_of(rejected), (StatusCode::UNPROCESSABLE_ENTITY, "content_rejected"));
		assert_eq!(status_of(missing), (StatusCode::NOT_FOUND, "not_found"));
		assert_eq!(status_of(fetch), (StatusCode::BAD_GATEWAY, "fetch_failed"));
		assert_eq!(status_of(storage), (StatusCode::INTERNAL_SERVER_ERROR, "storage_error"));
	}

	#[test]
	fn error_bodies_keep_the_service_message() {
		let err = Error::NotFound { message: "No context document for this scope.".to_string() };
		let api_err = ApiError::from(err);

		assert!(api_err.message.contains("No context document for this scope."));
	}
}
