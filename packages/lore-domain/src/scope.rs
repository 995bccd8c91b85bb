use serde::{Deserialize, Serialize};

/// Access tier of a context document. Guild and user scopes carry the id of the guild or
/// user they are bound to; the global scope is a system-wide singleton.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(tag = "scope", rename_all = "snake_case")]
pub enum ContextScope {
	Global,
	Guild { guild_id: String },
	User { user_id: String },
}

impl ContextScope {
	pub fn as_str(&self) -> &'static str {
		match self {
			Self::Global => "global",
			Self::Guild { .. } => "guild",
			Self::User { .. } => "user",
		}
	}

	pub fn target_guild_id(&self) -> Option<&str> {
		match self {
			Self::Guild { guild_id } => Some(guild_id.as_str()),
			_ => None,
		}
	}

	pub fn target_user_id(&self) -> Option<&str> {
		match self {
			Self::User { user_id } => Some(user_id.as_str()),
			_ => None,
		}
	}

	/// Cache key for this tier's fetched content: `context:{scope}` for the global
	/// singleton, `context:{scope}:{target}` otherwise.
	pub fn cache_key(&self) -> String {
		match self {
			Self::Global => "context:global".to_string(),
			Self::Guild { guild_id } => format!("context:guild:{guild_id}"),
			Self::User { user_id } => format!("context:user:{user_id}"),
		}
	}

	/// Ranking weight for relevance retrieval. Any user-scoped hit outranks any guild- or
	/// global-scoped hit, and any guild-scoped hit outranks any global-scoped hit.
	pub fn retrieval_weight(&self) -> u32 {
		match self {
			Self::Global => 1,
			Self::Guild { .. } => 2,
			Self::User { .. } => 3,
		}
	}

	pub fn tier_label(&self) -> &'static str {
		match self {
			Self::Global => "Global context",
			Self::Guild { .. } => "Server context",
			Self::User { .. } => "Personal context (highest priority)",
		}
	}

	/// Rebuilds a scope from its storage columns. Returns `None` when the column triple
	/// does not describe a valid scope.
	pub fn from_columns(
		scope: &str,
		target_guild_id: Option<String>,
		target_user_id: Option<String>,
	) -> Option<Self> {
		match (scope, target_guild_id, target_user_id) {
			("global", None, None) => Some(Self::Global),
			("guild", Some(guild_id), None) => Some(Self::Guild { guild_id }),
			("user", None, Some(user_id)) => Some(Self::User { user_id }),
			_ => None,
		}
	}

	/// True when the scope carries a usable target: non-blank ids for guild/user scopes.
	pub fn has_valid_target(&self) -> bool {
		match self {
			Self::Global => true,
			Self::Guild { guild_id } => !guild_id.trim().is_empty(),
			Self::User { user_id } => !user_id.trim().is_empty(),
		}
	}
}
