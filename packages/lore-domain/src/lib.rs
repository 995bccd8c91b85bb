pub mod digest;
pub mod prompt;
pub mod scope;
pub mod source;
pub mod validate;

pub use scope::ContextScope;
