//! Chat and analysis front end over a [`TextGenerator`].
//!
//! Failures never reach the caller: errors and empty replies are logged and
//! replaced by fixed fallback texts.

use chrono::{DateTime, Utc};
use log::warn;
use serde::{Deserialize, Serialize};

use super::client::{AiRequest, TextGenerator};
use super::prompts;
use crate::models::new_id;

pub const CHAT_EMPTY_FALLBACK: &str = "Mi dispiace, non ho potuto elaborare una risposta.";
pub const ANALYSIS_EMPTY_FALLBACK: &str = "Analisi non disponibile.";
pub const ANALYSIS_ERROR_FALLBACK: &str = "Impossibile completare l'analisi strategica al momento.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    User,
    Model,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub id: String,
    pub role: ChatRole,
    pub text: String,
    pub timestamp: DateTime<Utc>,
}

impl ChatMessage {
    pub fn new(role: ChatRole, text: impl Into<String>) -> Self {
        Self {
            id: new_id("msg"),
            role,
            text: text.into(),
            timestamp: Utc::now(),
        }
    }
}

pub struct Assistant<G> {
    generator: G,
    holding_name: String,
}

impl<G: TextGenerator> Assistant<G> {
    pub fn new(generator: G, holding_name: impl Into<String>) -> Self {
        Self {
            generator,
            holding_name: holding_name.into(),
        }
    }

    pub fn holding_name(&self) -> &str {
        &self.holding_name
    }

    fn chat_error_fallback(&self) -> String {
        format!(
            "Si è verificato un errore di connessione con i sistemi AI di {}.",
            self.holding_name
        )
    }

    /// Reply to `new_message` given the prior `history`, oldest first
    pub fn send_chat_message(&self, history: &[ChatMessage], new_message: &str) -> String {
        let request = AiRequest {
            system_instruction: prompts::chat_instruction(&self.holding_name),
            prompt: prompts::build_chat_prompt(history, new_message),
        };
        match self.generator.generate(&request) {
            Ok(text) if !text.trim().is_empty() => text,
            Ok(_) => {
                warn!("AI chat returned an empty reply");
                CHAT_EMPTY_FALLBACK.to_string()
            }
            Err(e) => {
                warn!("AI chat error: {}", e);
                self.chat_error_fallback()
            }
        }
    }

    /// Markdown strategic analysis (SWOT, risks, opportunities) of free text
    pub fn analyze_business_text(&self, input: &str) -> String {
        let request = AiRequest {
            system_instruction: prompts::analysis_instruction(&self.holding_name),
            prompt: prompts::build_analysis_prompt(&self.holding_name, input),
        };
        match self.generator.generate(&request) {
            Ok(text) if !text.trim().is_empty() => text,
            Ok(_) => {
                warn!("AI analysis returned an empty reply");
                ANALYSIS_EMPTY_FALLBACK.to_string()
            }
            Err(e) => {
                warn!("AI analysis error: {}", e);
                ANALYSIS_ERROR_FALLBACK.to_string()
            }
        }
    }
}

/// Ordered conversation, opened by the advisor's welcome message
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatSession {
    messages: Vec<ChatMessage>,
}

impl ChatSession {
    pub fn new(advisor_name: &str) -> Self {
        let welcome = ChatMessage {
            id: "welcome".to_string(),
            role: ChatRole::Model,
            text: format!(
                "Salve. Sono {}. Come posso assisterla oggi nella gestione della holding?",
                advisor_name
            ),
            timestamp: Utc::now(),
        };
        Self {
            messages: vec![welcome],
        }
    }

    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    /// Sends `input` and records both sides. Blank input is ignored.
    ///
    /// The generator sees the history as it was before `input`.
    pub fn send<G: TextGenerator>(
        &mut self,
        assistant: &Assistant<G>,
        input: &str,
    ) -> Option<&ChatMessage> {
        if input.trim().is_empty() {
            return None;
        }
        let reply = assistant.send_chat_message(&self.messages, input);
        self.messages.push(ChatMessage::new(ChatRole::User, input));
        self.messages.push(ChatMessage::new(ChatRole::Model, reply));
        self.messages.last()
    }
}
