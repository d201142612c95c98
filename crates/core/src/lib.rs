//! Shared primitives for all Rust crates in Loglake.

#![forbid(unsafe_code)]

use std::fmt::{Display, Formatter};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result type used across Loglake crates.
pub type AppResult<T> = Result<T, AppError>;

/// A validated non-empty UTF-8 string.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NonEmptyString(String);

impl NonEmptyString {
    /// Creates a validated non-empty string.
    pub fn new(value: impl Into<String>) -> AppResult<Self> {
        let value = value.into();
        if value.trim().is_empty() {
            return Err(AppError::Validation(
                "value must not be empty or whitespace".to_owned(),
            ));
        }

        Ok(Self(value))
    }

    /// Returns the underlying string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl From<NonEmptyString> for String {
    fn from(value: NonEmptyString) -> Self {
        value.0
    }
}

impl Display for NonEmptyString {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        formatter.write_str(self.0.as_str())
    }
}

/// Cloud account identifier owning the provisioned resources.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct AccountId(String);

impl AccountId {
    /// Creates a validated account identifier made of ASCII digits.
    pub fn new(value: impl Into<String>) -> AppResult<Self> {
        let value = value.into();
        let trimmed = value.trim();
        if trimmed.is_empty() || !trimmed.chars().all(|character| character.is_ascii_digit()) {
            return Err(AppError::Validation(format!(
                "account id '{value}' must be a non-empty string of digits"
            )));
        }

        Ok(Self(trimmed.to_owned()))
    }

    /// Returns the underlying string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl TryFrom<String> for AccountId {
    type Error = AppError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<AccountId> for String {
    fn from(value: AccountId) -> Self {
        value.0
    }
}

impl Display for AccountId {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        formatter.write_str(self.0.as_str())
    }
}

/// Platform region identifier such as `us-east-1`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Region(String);

impl Region {
    /// Region hosting global content-delivery resources.
    pub const GLOBAL_EDGE: &'static str = "us-east-1";

    /// Creates a validated region identifier.
    ///
    /// Regions are lower-case ASCII letters, digits and dashes.
    pub fn new(value: impl Into<String>) -> AppResult<Self> {
        let value = value.into();
        let trimmed = value.trim();
        let valid = !trimmed.is_empty()
            && !trimmed.starts_with('-')
            && !trimmed.ends_with('-')
            && trimmed.chars().all(|character| {
                character.is_ascii_lowercase() || character.is_ascii_digit() || character == '-'
            });

        if !valid {
            return Err(AppError::Validation(format!(
                "region '{value}' is not a valid region identifier"
            )));
        }

        Ok(Self(trimmed.to_owned()))
    }

    /// Returns the region that hosts global content-delivery resources.
    #[must_use]
    pub fn global_edge() -> Self {
        Self(Self::GLOBAL_EDGE.to_owned())
    }

    /// Returns the underlying string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl TryFrom<String> for Region {
    type Error = AppError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Region> for String {
    fn from(value: Region) -> Self {
        value.0
    }
}

impl Display for Region {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        formatter.write_str(self.0.as_str())
    }
}

/// Common application error categories.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AppError {
    /// Invalid input or violated invariant.
    #[error("validation error: {0}")]
    Validation(String),

    /// Requested resource does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// Create operation hit a resource that already exists.
    #[error("conflict: {0}")]
    Conflict(String),

    /// Resource configuration cannot be changed through the automated path.
    #[error("manual intervention required: {0}")]
    ManualInterventionRequired(String),

    /// Platform condition expected to clear on retry, such as propagation delay.
    #[error("transient error: {0}")]
    Transient(String),

    /// Internal unexpected error.
    #[error("internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Returns whether the operation that produced this error may be retried.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Transient(_))
    }

    /// Returns whether this error asks an operator to finish the change by hand.
    #[must_use]
    pub fn requires_manual_intervention(&self) -> bool {
        matches!(self, Self::ManualInterventionRequired(_))
    }

    /// Prefixes the error message with context while keeping the category.
    #[must_use]
    pub fn context(self, context: impl Display) -> Self {
        match self {
            Self::Validation(message) => Self::Validation(format!("{context}: {message}")),
            Self::NotFound(message) => Self::NotFound(format!("{context}: {message}")),
            Self::Conflict(message) => Self::Conflict(format!("{context}: {message}")),
            Self::ManualInterventionRequired(message) => {
                Self::ManualInterventionRequired(format!("{context}: {message}"))
            }
            Self::Transient(message) => Self::Transient(format!("{context}: {message}")),
            Self::Internal(message) => Self::Internal(format!("{context}: {message}")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{AccountId, AppError, NonEmptyString, Region};

    #[test]
    fn non_empty_string_rejects_whitespace() {
        let result = NonEmptyString::new("   ");
        assert!(result.is_err());
    }

    #[test]
    fn account_id_requires_digits() {
        assert!(AccountId::new("123456789012").is_ok());
        assert!(AccountId::new("12345abc").is_err());
        assert!(AccountId::new("").is_err());
    }

    #[test]
    fn region_rejects_upper_case_and_dangling_dashes() {
        assert!(Region::new("eu-west-1").is_ok());
        assert!(Region::new("EU-WEST-1").is_err());
        assert!(Region::new("-eu").is_err());
        assert!(Region::new("").is_err());
    }

    #[test]
    fn context_keeps_error_category() {
        let error = AppError::Transient("throttled".to_owned()).context("catalog database");
        assert!(error.is_retryable());
        assert_eq!(error.to_string(), "transient error: catalog database: throttled");

        let manual = AppError::ManualInterventionRequired("vpc origin".to_owned()).context("E1");
        assert!(manual.requires_manual_intervention());
    }
}
