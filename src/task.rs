use crate::error::DraftError;
use chrono::{DateTime, NaiveDateTime};
use serde::{Deserialize, Serialize};

pub type TaskId = u64;

/// A todo record as the service stores it.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct Task {
    pub id: TaskId,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub completed: bool,
    pub created_at: String, // kept verbatim, see `created_at_display`
}

impl Task {
    /// Short local rendering of `created_at`, or the raw text when it does not parse.
    pub fn created_at_display(&self) -> String {
        if let Ok(at) = NaiveDateTime::parse_from_str(&self.created_at, "%Y-%m-%dT%H:%M:%S%.f") {
            return at.format("%Y-%m-%d %H:%M").to_string();
        }
        if let Ok(at) = DateTime::parse_from_rfc3339(&self.created_at) {
            return at.format("%Y-%m-%d %H:%M").to_string();
        }
        self.created_at.clone()
    }
}

/// Payload for create and update. Built only through [`TaskDraft::new`], so the
/// title is never blank and a blank description never reaches the wire.
#[derive(Debug, Serialize, Clone, PartialEq, Eq)]
pub struct TaskDraft {
    title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    description: Option<String>,
}

impl TaskDraft {
    pub fn new(title: &str, description: &str) -> Result<Self, DraftError> {
        let title = title.trim();
        if title.is_empty() {
            return Err(DraftError::BlankTitle);
        }
        let description = description.trim();
        Ok(Self {
            title: title.to_string(),
            description: (!description.is_empty()).then(|| description.to_string()),
        })
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }
}
