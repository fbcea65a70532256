use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::services::attribution;

/// Uniqueness tuple of a translation override.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RecordKey {
    pub kind: String,
    pub id: String,
    pub field: String,
    pub language: String,
}

impl RecordKey {
    pub fn new(
        kind: impl Into<String>,
        id: impl Into<String>,
        field: impl Into<String>,
        language: impl Into<String>,
    ) -> Self {
        RecordKey {
            kind: kind.into(),
            id: id.into(),
            field: field.into(),
            language: language.into(),
        }
    }

    pub fn tag(&self) -> String {
        attribution::format(&self.kind, &self.field, &self.id)
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct TranslationRecord {
    #[serde(flatten)]
    pub key: RecordKey,

    #[serde(default)]
    pub text: String,

    pub updated_at: DateTime<Utc>,
}

impl TranslationRecord {
    /// In-memory placeholder for a record that does not exist yet.
    pub fn blank(key: RecordKey) -> Self {
        TranslationRecord {
            key,
            text: String::new(),
            updated_at: DateTime::<Utc>::UNIX_EPOCH,
        }
    }
}

/// `Pending` → `InFlight` → `Done` | `Failed`. A finished run reports only
/// the last two.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum RecordState {
    Pending,
    InFlight,
    Done,
    Failed,
}
