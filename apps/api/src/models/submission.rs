use std::collections::BTreeMap;

use serde::Deserialize;
use serde_json::{Map, Value};

use crate::models::attachment::{AttachmentKind, Attachments};

/// One applicant's text fields, keyed by form field name.
///
/// An open mapping: any field the form posts is kept, nothing is
/// required and nothing is coerced. Deserializes straight from a urlencoded body.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(transparent)]
pub struct Submission(BTreeMap<String, String>);

impl Submission {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a field. A repeated name replaces the earlier value.
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.0.insert(name.into(), value.into());
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.0.get(name).map(String::as_str)
    }

    /// First non-empty value among `keys`, in order. A key that was posted
    /// empty still counts as present, so `Some("")` is returned when no later
    /// key has a value; `None` only when none of the keys were posted.
    pub fn value_of(&self, keys: &[&str]) -> Option<&str> {
        let mut posted_empty = None;
        for value in keys.iter().filter_map(|key| self.get(key)) {
            if !value.is_empty() {
                return Some(value);
            }
            posted_empty = posted_empty.or(Some(value));
        }
        posted_empty
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// The record persisted for this submission: every field verbatim, with the
    /// `photo` and `resume` stored filenames overlaid (empty when not uploaded).
    pub fn to_document(&self, attachments: &Attachments) -> Map<String, Value> {
        let mut document: Map<String, Value> = self
            .0
            .iter()
            .map(|(name, value)| (name.clone(), Value::String(value.clone())))
            .collect();

        for kind in AttachmentKind::ALL {
            let stored = attachments
                .get(kind)
                .map(|a| a.stored_name.clone())
                .unwrap_or_default();
            document.insert(kind.field_name().to_string(), Value::String(stored));
        }
        document
    }
}

impl<K, V> FromIterator<(K, V)> for Submission
where
    K: Into<String>,
    V: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut submission = Submission::new();
        for (name, value) in iter {
            submission.insert(name, value);
        }
        submission
    }
}
