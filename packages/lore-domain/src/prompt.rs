/// Canned refusal the assistant must return when the answer is not in the supplied
/// context. Collaborators short-circuit with this message when the resolver returns an
/// empty context string, skipping the model call entirely.
pub const REFUSAL_MESSAGE: &str = "I don't have that information in my provided context.";

const GROUNDING_INSTRUCTIONS: &str = "Answer using ONLY the reference material below. Do not \
use outside knowledge. If the reference material does not contain the answer, reply exactly \
with:";

/// Wraps resolved context in the fixed instruction block. Empty context stays empty so the
/// caller can detect "nothing to ground on" and refuse without a model call.
pub fn render_grounding_prompt(context: &str) -> String {
	if context.trim().is_empty() {
		return String::new();
	}

	format!("{GROUNDING_INSTRUCTIONS} \"{REFUSAL_MESSAGE}\"\n\n{context}")
}
