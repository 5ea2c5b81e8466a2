pub mod assistant;
pub mod audio;
pub mod auth;
pub mod config;
pub mod conversation;
pub mod error;
pub mod http;
pub mod input;
pub mod logging;
pub mod speech;

pub use assistant::{Assistant, AssistantSettings, Collaborators};
pub use conversation::{ChatModel, Conversation};
pub use speech::SpeechApi;
