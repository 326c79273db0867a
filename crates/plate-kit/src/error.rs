use std::time::Duration;

use crate::conversation::ConversationStatus;
use crate::surface::ConversationId;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RegistryError {
    #[error("duplicate extension name: {0}")]
    DuplicateExtension(String),
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ContributionError {
    #[error("extension `{extension}` failed to build its button: {message}")]
    Failed { extension: String, message: String },
    #[error("extension `{extension}` panicked while building its button")]
    Panicked { extension: String },
}

impl ContributionError {
    pub fn failed(extension: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Failed {
            extension: extension.into(),
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message}")]
pub struct ActionError {
    message: String,
}

impl ActionError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CompletionError {
    #[error("completion backend failed: {0}")]
    Backend(String),
    #[error("completion timed out after {0:?}")]
    TimedOut(Duration),
    #[error("completion stream panicked")]
    Panicked,
    #[error("completion backend gave up")]
    Abandoned,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConversationError {
    #[error("assistant surface is not open")]
    NotOpen,
    #[error("assistant surface is held by conversation {0}")]
    SurfaceBusy(ConversationId),
    #[error("a generation is already in flight")]
    Busy,
    #[error("prompt is empty")]
    EmptyPrompt,
    #[error("selection is empty")]
    EmptySelection,
    #[error("cannot {event} while {from:?}")]
    InvalidTransition {
        from: ConversationStatus,
        event: &'static str,
    },
    #[error("no cached turn to regenerate")]
    NothingToRegenerate,
    #[error("no async runtime available to run the completion")]
    NoRuntime,
    #[error("failed to apply result: {0}")]
    Apply(#[from] ActionError),
}
