//! Data models for td
//!
//! A topic is a named text record owned by the server. Its body lives in
//! the snapshot directories; the Topic Index only keeps identities.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A topic as exchanged with the server
///
/// Every field is optional on the wire, so missing fields deserialize to
/// their defaults and empty fields are left out when serializing.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Topic {
    /// Server-assigned identifier (opaque)
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub id: String,
    /// Unique, user-facing name; also the file stem in the snapshots
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub name: String,
    /// Text body
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub contents: String,
    /// Creation time as reported by the server
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    /// Rendered body, as some servers send it along
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub markdown: String,
    /// Application error reported by the server instead of a topic
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub error: String,
}

impl Topic {
    /// Create a topic with the given identity and no body
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            ..Self::default()
        }
    }

    /// Builder-style setter for the body
    pub fn with_contents(mut self, contents: impl Into<String>) -> Self {
        self.contents = contents.into();
        self
    }

    /// The same topic with its body fields cleared, as stored in the index
    pub fn identity(&self) -> Self {
        Self {
            id: self.id.clone(),
            name: self.name.clone(),
            created_at: self.created_at,
            ..Self::default()
        }
    }
}

/// Outcome of a push
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PushReport {
    /// Topics confirmed by the server and promoted into the baseline
    pub pushed: Vec<String>,
    /// Topics that failed and remain pending
    pub failed: Vec<String>,
}

impl PushReport {
    /// Whether every topic made it to the server
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty()
    }
}
