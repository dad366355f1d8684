//! AI Client Module
//!
//! Talks to an external text generator through a command line tool. The
//! generator is a black box: a request goes in, text or an error comes out.

use log::debug;
use std::path::{Path, PathBuf};
use std::process::Command;
use thiserror::Error;

use crate::config::{AiConfig, AiModeSetting};

/// Errors that can occur during AI operations
#[derive(Error, Debug)]
pub enum AiError {
    #[error("AI command not found: {0}")]
    CommandNotFound(String),

    #[error("AI command execution failed: {0}")]
    CommandFailed(String),

    #[error("Invalid response from AI: {0}")]
    InvalidResponse(String),

    #[error("AI integration not available")]
    NotAvailable,
}

/// One generation request: fixed instructions plus the rendered prompt
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AiRequest {
    pub system_instruction: String,
    pub prompt: String,
}

impl AiRequest {
    /// Instructions and prompt joined into the single text a CLI tool accepts
    pub fn render(&self) -> String {
        format!("{}\n\n{}", self.system_instruction.trim(), self.prompt)
    }
}

/// Anything that can turn a request into text
pub trait TextGenerator {
    fn generate(&self, request: &AiRequest) -> Result<String, AiError>;
}

/// AI operation mode
#[derive(Debug, Clone, Default)]
pub enum AiMode {
    /// Run `path` with `args`, then the prompt as the final argument
    Cli { path: PathBuf, args: Vec<String> },
    /// AI features disabled
    #[default]
    Disabled,
}

/// AI Client backed by a command line tool
#[derive(Debug, Clone, Default)]
pub struct AiClient {
    mode: AiMode,
}

impl AiClient {
    /// Create a client with a specific mode
    pub fn with_mode(mode: AiMode) -> Self {
        Self { mode }
    }

    /// Resolve the configured mode; a missing executable disables the client
    pub fn from_config(config: &AiConfig) -> Self {
        let mode = match config.mode {
            AiModeSetting::Disabled => AiMode::Disabled,
            AiModeSetting::Cli => match Self::find_command(&config.command) {
                Some(path) => AiMode::Cli {
                    path,
                    args: config.args.clone(),
                },
                None => {
                    debug!("AI command '{}' not found, AI disabled", config.command);
                    AiMode::Disabled
                }
            },
        };
        Self { mode }
    }

    /// Find an executable, either as given or on PATH
    fn find_command(command: &str) -> Option<PathBuf> {
        let direct = Path::new(command);
        if direct.components().count() > 1 {
            return direct.exists().then(|| direct.to_path_buf());
        }

        if let Ok(output) = Command::new("which").arg(command).output() {
            if output.status.success() {
                let path_str = String::from_utf8_lossy(&output.stdout);
                let path = PathBuf::from(path_str.trim());
                if path.exists() {
                    return Some(path);
                }
            }
        }

        None
    }

    /// Check if AI features are available
    pub fn is_available(&self) -> bool {
        match &self.mode {
            AiMode::Cli { path, .. } => path.exists(),
            AiMode::Disabled => false,
        }
    }

    /// Get a description of the current mode
    pub fn mode_description(&self) -> String {
        match &self.mode {
            AiMode::Cli { path, .. } => format!("CLI ({})", path.display()),
            AiMode::Disabled => "Disabled".to_string(),
        }
    }

    fn send_cli_request(&self, path: &Path, args: &[String], prompt: &str) -> Result<String, AiError> {
        if !path.exists() {
            return Err(AiError::CommandNotFound(path.display().to_string()));
        }

        let output = Command::new(path)
            .args(args)
            .arg(prompt)
            .output()
            .map_err(|e| AiError::CommandFailed(e.to_string()))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(AiError::CommandFailed(format!(
                "Exit code: {:?}, stderr: {}",
                output.status.code(),
                stderr
            )));
        }

        let response = String::from_utf8_lossy(&output.stdout).trim().to_string();

        if response.is_empty() {
            return Err(AiError::InvalidResponse("Empty response from CLI".to_string()));
        }

        Ok(response)
    }
}

impl TextGenerator for AiClient {
    fn generate(&self, request: &AiRequest) -> Result<String, AiError> {
        match &self.mode {
            AiMode::Cli { path, args } => self.send_cli_request(path, args, &request.render()),
            AiMode::Disabled => Err(AiError::NotAvailable),
        }
    }
}
