//! Usage errors: free-form validation messages attached to fields.
//!
//! These are separate from parse errors. A field can carry both, and can
//! collect any number of messages, including after it resolved cleanly.

use std::string::String;
use std::vec::Vec;

use indexmap::IndexMap;

use crate::field::FieldId;

/// Append-only usage messages, keyed by field, in first-append order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UsageErrors {
    by_field: IndexMap<FieldId, Vec<String>>,
}

impl UsageErrors {
    /// Create an empty log.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append `message` to the field's list.
    pub fn append(&mut self, field: impl Into<FieldId>, message: impl Into<String>) {
        self.by_field
            .entry(field.into())
            .or_default()
            .push(message.into());
    }

    /// Messages for a field, oldest first. Empty if none.
    pub fn get(&self, field: impl Into<FieldId>) -> &[String] {
        self.by_field
            .get(&field.into())
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// Whether the field has at least one message.
    pub fn contains(&self, field: impl Into<FieldId>) -> bool {
        !self.get(field).is_empty()
    }

    /// Whether no field has any message.
    pub fn is_empty(&self) -> bool {
        self.by_field.is_empty()
    }

    /// Number of fields with messages.
    pub fn len(&self) -> usize {
        self.by_field.len()
    }

    /// Fields and their messages, in first-append order.
    pub fn iter(&self) -> impl Iterator<Item = (FieldId, &[String])> {
        self.by_field.iter().map(|(id, msgs)| (*id, msgs.as_slice()))
    }
}
