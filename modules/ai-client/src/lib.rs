pub mod chat;
pub mod completion;
pub mod error;
pub mod retry;
pub mod types;
pub mod util;

pub use chat::ChatClient;
pub use completion::CompletionClient;
pub use error::{AiError, Result};
pub use retry::{retry_on_capacity, RetryPolicy};
pub use types::ChatMessage;
