pub mod config;
pub mod error;
pub mod message;
pub mod model;

/// Prelude module for convenient imports.
pub mod prelude {
    pub use crate::config::GenerationConfig;
    pub use crate::error::{ConfigError, JudgmentError, ModelError, QaError, Result};
    pub use crate::message::{Message, UsageMetadata};
    pub use crate::model::{CallOptions, ChatModel, ChatResult, ResponseFormat};
}
