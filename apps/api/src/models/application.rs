use chrono::{DateTime, Utc};
use serde_json::Value;
use sqlx::FromRow;
use uuid::Uuid;

/// A persisted application. `document` is schema-less: whatever the form posted,
/// plus the `photo`/`resume` stored filenames.
#[derive(Debug, Clone, FromRow)]
pub struct ApplicationRecord {
    pub id: Uuid,
    pub document: Value,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ApplicationRecord {
    /// String field from the document, `""` when missing or not a string.
    pub fn field(&self, name: &str) -> &str {
        self.document
            .get(name)
            .and_then(Value::as_str)
            .unwrap_or_default()
    }
}
