//! AI collaborator for the holding tracker
//!
//! A chat advisor and a strategic text analyzer, both built on an external
//! text generator reached through a command line tool.

pub mod assistant;
pub mod client;
pub mod prompts;

pub use assistant::{Assistant, ChatMessage, ChatRole, ChatSession};
pub use client::{AiClient, AiError, AiMode, AiRequest, TextGenerator};
