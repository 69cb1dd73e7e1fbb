//! The module contains the errors the engine can throw.
//!
//! The errors are:
//!
//! - [`Validation`] thrown when the input of an operation is rejected. It
//!   carries every problem found, keyed by field or scope.
//! - [`UnsupportedSplitMethod`] thrown when a split method name is unknown.
//! - [`KeyNotFound`] thrown when an item is not found.
//! - [`ExistingKey`] thrown when a unique item is already present.
//!
//!  [`Validation`]: EngineError::Validation
//!  [`UnsupportedSplitMethod`]: EngineError::UnsupportedSplitMethod
//!  [`KeyNotFound`]: EngineError::KeyNotFound
//!  [`ExistingKey`]: EngineError::ExistingKey
use std::{collections::BTreeMap, fmt};

use sea_orm::DbErr;
use serde::Serialize;
use thiserror::Error;

/// Scope key for errors about the expense as a whole (e.g. the percentages
/// do not add up to 100).
pub const NON_FIELD_ERRORS: &str = "non_field_errors";

/// Engine custom errors.
#[derive(Error, Debug)]
pub enum EngineError {
    #[error("Validation failed: {0}")]
    Validation(ValidationErrors),
    #[error("Unsupported split method: {0}")]
    UnsupportedSplitMethod(String),
    #[error("\"{0}\" key not found!")]
    KeyNotFound(String),
    #[error("\"{0}\" already present!")]
    ExistingKey(String),
    #[error("Invalid amount: {0}")]
    InvalidAmount(String),
    #[error("Invalid id: {0}")]
    InvalidId(String),
    #[error(transparent)]
    Database(#[from] DbErr),
}

impl PartialEq for EngineError {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Validation(a), Self::Validation(b)) => a == b,
            (Self::UnsupportedSplitMethod(a), Self::UnsupportedSplitMethod(b)) => a == b,
            (Self::KeyNotFound(a), Self::KeyNotFound(b)) => a == b,
            (Self::ExistingKey(a), Self::ExistingKey(b)) => a == b,
            (Self::InvalidAmount(a), Self::InvalidAmount(b)) => a == b,
            (Self::InvalidId(a), Self::InvalidId(b)) => a == b,
            (Self::Database(a), Self::Database(b)) => a.to_string() == b.to_string(),
            _ => false,
        }
    }
}

impl From<ValidationErrors> for EngineError {
    fn from(value: ValidationErrors) -> Self {
        Self::Validation(value)
    }
}

/// Human readable validation messages keyed by field (`shares[1].amount`) or
/// scope ([`NON_FIELD_ERRORS`], `shares`).
///
/// Serializes as a plain JSON object of string arrays.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ValidationErrors(BTreeMap<String, Vec<String>>);

impl ValidationErrors {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Records `message` under `key`, keeping earlier messages for the same key.
    pub fn add(&mut self, key: impl Into<String>, message: impl Into<String>) {
        self.0.entry(key.into()).or_default().push(message.into());
    }

    /// Moves every message of `other` into `self`.
    pub fn merge(&mut self, other: ValidationErrors) {
        for (key, messages) in other.0 {
            self.0.entry(key).or_default().extend(messages);
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Number of keys with at least one message.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn get(&self, key: &str) -> Option<&[String]> {
        self.0.get(key).map(Vec::as_slice)
    }

    #[must_use]
    pub fn contains_key(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    /// `Ok(value)` when nothing was recorded, the collected errors otherwise.
    pub fn into_result<T>(self, value: T) -> Result<T, ValidationErrors> {
        if self.is_empty() {
            Ok(value)
        } else {
            Err(self)
        }
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for (key, messages) in &self.0 {
            for message in messages {
                if !first {
                    f.write_str("; ")?;
                }
                write!(f, "{key}: {message}")?;
                first = false;
            }
        }
        Ok(())
    }
}
