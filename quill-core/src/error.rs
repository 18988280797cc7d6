//! Error types for Quill.

use thiserror::Error;

use crate::types::ColumnTag;

#[derive(Debug, Error)]
pub enum QuillError {
    /// The database file could not be opened or created.
    #[error("unable to open database '{path}': {message}")]
    UnableToOpen { path: String, message: String },

    /// An API-order violation reached the engine.
    #[error("interface misuse: {0}")]
    InterfaceMisuse(String),

    /// The engine rejected the SQL text (syntax, schema mismatch).
    #[error("unable to execute query: {0}")]
    UnableToExecuteQuery(String),

    /// A unique or NOT NULL constraint was violated. The statement
    /// remains reusable.
    #[error("unmet constraint: {0}")]
    UnmetConstraint(String),

    /// A placeholder is absent from the compiled statement.
    #[error("bind parameter not found: {0}")]
    BindParameterNotFound(String),

    /// The column's storage tag is incompatible with the field descriptor.
    #[error("column '{column}' holds {actual:?}, expected {expected}")]
    MismatchedType {
        column: String,
        expected: &'static str,
        actual: ColumnTag,
    },

    /// The stored integer does not fit the field's ordinal type.
    #[error("column '{column}' value does not fit in {expected} bits")]
    MismatchedSize { column: String, expected: u32 },

    /// The stored value is outside the field's domain.
    #[error("column '{column}' holds out-of-domain value {value}")]
    MismatchedValue { column: String, value: String },

    /// A mandatory field read a NULL column.
    #[error("column '{column}' is NULL but the field is not optional")]
    UnexpectedNullValue { column: String },

    /// Column count or label set disagrees with the shape.
    #[error("shape mismatch: {0}")]
    MismatchedFields(String),

    /// `PRAGMA integrity_check` reported problems.
    #[error("integrity check failed: {0}")]
    FailedIntegrityChecks(String),

    /// A builder step was invoked out of order.
    #[error("invalid function chain: {0}")]
    InvalidFunctionChain(String),

    /// The Exact/All constraint gate disagrees with the built clauses.
    #[error("mismatched constraint: {0}")]
    MismatchedConstraint(String),

    /// A field label does not belong to the governing shape.
    #[error("'{field}' is not a field of the {shape} shape")]
    InvalidNamingConvention { field: String, shape: &'static str },

    /// The URN string is not a hyphenated 8-4-4-4-12 rendering.
    #[error("malformed URN string: {0}")]
    MalformedUrnString(String),

    /// A non-hex character appeared inside a URN group.
    #[error("invalid hex character '{character}' at position {position}")]
    InvalidHexCharacter { character: char, position: usize },

    /// JSON encoding or decoding of a nested record failed.
    #[error("json codec error: {0}")]
    Json(#[from] serde_json::Error),
}

impl QuillError {
    /// Create a chain-order error naming the step that was refused.
    pub fn chain(step: &'static str, detail: impl Into<String>) -> Self {
        Self::InvalidFunctionChain(format!("{}: {}", step, detail.into()))
    }

    /// Create a shape-mismatch error.
    pub fn fields(detail: impl Into<String>) -> Self {
        Self::MismatchedFields(detail.into())
    }
}

/// Result type alias for Quill operations.
pub type QuillResult<T> = Result<T, QuillError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = QuillError::UnexpectedNullValue {
            column: "age".into(),
        };
        assert_eq!(
            err.to_string(),
            "column 'age' is NULL but the field is not optional"
        );
    }

    #[test]
    fn test_chain_helper() {
        let err = QuillError::chain("sort", "already past ORDER BY");
        assert!(err.to_string().contains("sort"));
    }
}
