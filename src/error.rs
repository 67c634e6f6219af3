//! Errors raised while checking a text.
//!
//! None of these are fatal; each one ends the current check and can be
//! retried with a new submission.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CheckError {
    #[error("no text to check")]
    EmptyInput,

    #[error("model response is not a JSON array of records: {reason}")]
    InvalidResponse { reason: String },

    #[error("LLM integration is not configured: {0}")]
    NotConfigured(String),

    #[error("{provider} API error: {status} - {body}")]
    Api {
        provider: &'static str,
        status: reqwest::StatusCode,
        body: String,
    },

    #[error("empty response from {0}")]
    EmptyResponse(&'static str),

    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),
}

impl CheckError {
    /// Message shown to the person who submitted the text
    pub fn user_message(&self) -> &'static str {
        match self {
            CheckError::EmptyInput => "Kein Text zu prüfen!",
            CheckError::InvalidResponse { .. } => {
                "Text konnte nicht geprüft werden. Häufige Fehler: Sonderzeichen, Anführungszeichen etc. Diese Entfernen und Prüfung wiederholen."
            }
            CheckError::NotConfigured(_) => {
                "Kein Sprachdienst eingerichtet. Bitte `[llm] provider` in grammar-pointer.toml auf \"claude\" oder \"openai\" setzen."
            }
            CheckError::Api { .. } | CheckError::EmptyResponse(_) | CheckError::Http(_) => {
                "Der Sprachdienst ist gerade nicht erreichbar. Bitte Prüfung wiederholen."
            }
        }
    }
}
