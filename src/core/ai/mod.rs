pub mod ai_service;
pub mod models;

pub use ai_service::{GuardedChatService, TextGenerator};
pub use models::{ChatMessage, ChatOutcome, GenerationConfig};
