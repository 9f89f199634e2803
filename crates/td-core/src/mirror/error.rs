//! Errors surfaced by mirror operations

use thiserror::Error;

use crate::remote::RemoteError;
use crate::storage::StorageError;

/// Everything a mirror operation can fail with
#[derive(Error, Debug)]
pub enum MirrorError {
    /// Local filesystem failure
    #[error(transparent)]
    Storage(#[from] StorageError),

    /// Server call failed (transport, timeout or server-side rejection)
    #[error(transparent)]
    Remote(#[from] RemoteError),

    /// Fetching now would discard unpushed local edits
    #[error("you have changes on the currently cached topics")]
    PendingChanges { topics: Vec<String> },

    /// No topic with this name in the index
    #[error("the topic '{name}' does not exist{}", did_you_mean(.suggestions))]
    UnknownTopic {
        name: String,
        suggestions: Vec<String>,
    },

    /// Another topic already has this name
    #[error("a topic named '{0}' already exists")]
    DuplicateName(String),

    /// The name cannot be used as a topic file name
    #[error("invalid topic name '{name}': {reason}")]
    InvalidName { name: String, reason: &'static str },
}

impl MirrorError {
    /// Whether trying again later may succeed
    pub fn is_retryable(&self) -> bool {
        matches!(self, MirrorError::Remote(e) if e.is_retryable())
    }

    /// What the user can do about this error, if anything
    pub fn hint(&self) -> Option<&'static str> {
        match self {
            MirrorError::Storage(e) => e.recovery_suggestion(),
            _ if self.is_retryable() => {
                Some("The server could not be reached in time. Try again later.")
            }
            MirrorError::PendingChanges { .. } => {
                Some("Push your changes first with `td push`.")
            }
            _ => None,
        }
    }
}

fn did_you_mean(suggestions: &[String]) -> String {
    if suggestions.is_empty() {
        return String::new();
    }

    let mut msg = String::from("\n\nDid you mean one of these?\n");
    for name in suggestions {
        msg.push('\t');
        msg.push_str(name);
        msg.push('\n');
    }
    msg
}

/// Result type for mirror operations
pub type MirrorResult<T> = Result<T, MirrorError>;
