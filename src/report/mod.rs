pub mod chat;
pub mod markdown;
pub mod webhook;

pub use chat::{BugListKind, ChatMessage};
pub use markdown::MarkdownReport;
pub use webhook::ChatDispatcher;
