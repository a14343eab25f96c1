//! Field-level validation errors shared by the board, note and area services.
//!
//! Validation always runs before any query, so a request that fails here has
//! not touched the database. The route layer renders the collected messages
//! as `422 {"errors": {"field": ["message", ...]}}`.

use std::collections::BTreeMap;

use serde::Serialize;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, thiserror::Error)]
#[error("validation failed for {}", .0.keys().copied().collect::<Vec<_>>().join(", "))]
#[serde(transparent)]
pub struct ValidationErrors(BTreeMap<&'static str, Vec<String>>);

impl ValidationErrors {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Shorthand for a single-field failure.
    #[cfg(test)]
    #[must_use]
    pub fn single(field: &'static str, message: impl Into<String>) -> Self {
        let mut errors = Self::new();
        errors.add(field, message);
        errors
    }

    pub fn add(&mut self, field: &'static str, message: impl Into<String>) {
        self.0.entry(field).or_default().push(message.into());
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    #[cfg(test)]
    #[must_use]
    pub fn has(&self, field: &str) -> bool {
        self.0.contains_key(field)
    }

    /// `Ok(())` when nothing was recorded.
    ///
    /// # Errors
    ///
    /// Returns `self` when at least one field failed.
    pub fn finish(self) -> Result<(), Self> {
        if self.is_empty() { Ok(()) } else { Err(self) }
    }
}

/// Record an error unless `value` has between 1 and `max` non-blank characters.
pub fn require_text(errors: &mut ValidationErrors, field: &'static str, label: &str, value: &str, max: usize) {
    if value.trim().is_empty() {
        errors.add(field, format!("{label}は必須です。"));
    } else if value.chars().count() > max {
        errors.add(field, format!("{label}は{max}文字以内で入力してください。"));
    }
}

/// Record an error if `value` is longer than `max` characters.
pub fn limit_text(errors: &mut ValidationErrors, field: &'static str, label: &str, value: &str, max: usize) {
    if value.chars().count() > max {
        errors.add(field, format!("{label}は{max}文字以内で入力してください。"));
    }
}

/// Record an error if a required integer is absent; returns 0 in that case.
pub fn require_int(errors: &mut ValidationErrors, field: &'static str, value: Option<i32>) -> i32 {
    value.unwrap_or_else(|| {
        errors.add(field, format!("{field}は必須です。"));
        0
    })
}

#[cfg(test)]
#[path = "validation_test.rs"]
mod tests;
