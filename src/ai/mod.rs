pub mod client;
pub mod command;
pub mod context;
pub mod features;
pub mod ollama;

pub use client::{AiClient, AiError, strip_code_fences};
pub use command::{AiCommand, Interpretation, ResetMode, parse_interpretation};
pub use features::{Assistant, CommitSuggestion, SuggestionResponse};
pub use ollama::OllamaClient;
