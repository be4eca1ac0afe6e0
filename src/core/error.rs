use thiserror::Error;

/// Rejection produced by a codec while decoding wire data.
///
/// Carries every violation found, not just the first one.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("malformed {family}: {}", .violations.join("; "))]
pub struct FormatError {
    pub family: String,
    pub violations: Vec<String>,
}

impl FormatError {
    pub fn new(family: impl Into<String>, violations: Vec<String>) -> Self {
        Self {
            family: family.into(),
            violations,
        }
    }

    pub fn single(family: impl Into<String>, violation: impl Into<String>) -> Self {
        Self::new(family, vec![violation.into()])
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CoachError {
    #[error("Format error: {0}")]
    Format(#[from] FormatError),

    #[error("Domain invariant violated: {0}")]
    DomainInvariant(String),

    #[error("Referential integrity violation: field '{field}' references missing key '{key}'")]
    ReferentialIntegrity { field: String, key: String },

    #[error("Store I/O error: {0}")]
    StoreIo(String),

    #[error("Key '{key}' not found in collection '{collection}'")]
    UnknownKey { collection: String, key: String },

    /// A keyed update would take over the natural key of another stored document.
    #[error("Natural key conflict in collection '{collection}': '{key}' collides with '{held_by}'")]
    NaturalKeyConflict {
        collection: String,
        key: String,
        held_by: String,
    },

    #[error("Operation cancelled: {0}")]
    Cancelled(String),
}

impl CoachError {
    pub fn invariant(message: impl Into<String>) -> Self {
        Self::DomainInvariant(message.into())
    }

    pub fn store_io(message: impl Into<String>) -> Self {
        Self::StoreIo(message.into())
    }

    /// Only connectivity/driver failures are worth another attempt.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::StoreIo(_))
    }
}

pub type Result<T> = std::result::Result<T, CoachError>;

impl From<serde_json::Error> for CoachError {
    fn from(err: serde_json::Error) -> Self {
        Self::StoreIo(format!("document serialization failed: {err}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn format_error_lists_every_violation() {
        let err = FormatError::new(
            "person",
            vec!["email: missing required field".into(), "roles: expected array".into()],
        );
        assert_eq!(
            err.to_string(),
            "malformed person: email: missing required field; roles: expected array"
        );
    }

    #[test]
    fn only_store_io_is_retryable() {
        assert!(CoachError::store_io("socket closed").is_retryable());
        assert!(!CoachError::invariant("empty name").is_retryable());
        assert!(
            !CoachError::ReferentialIntegrity {
                field: "subjectKey".into(),
                key: "missing".into()
            }
            .is_retryable()
        );
    }
}
