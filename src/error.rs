//! Engine Error Types
//!
//! Every failure the engine can produce is a variant of [`RelError`].
//! Errors detected while building an expression latch on the new node and
//! short-circuit everything downstream; errors detected while streaming
//! latch on the node after its workers exit. Callers read the latched
//! error with `Relation::err` once the output channel has drained.

use thiserror::Error;

/// Relational engine errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RelError {
    /// A declared candidate key has zero attributes
    #[error("candidate key has no attributes")]
    EmptyCandidateKey,

    /// A declared candidate key references an attribute outside the heading
    #[error("candidate key attribute '{attribute}' is not in heading {heading}")]
    UnknownKeyAttribute { attribute: String, heading: String },

    /// Operands with incompatible headings or types
    #[error("schema mismatch: {0}")]
    SchemaMismatch(String),

    /// A user function produced a tuple that does not conform to the
    /// declared output shape
    #[error("channel shape mismatch: expected {expected}, got {actual}")]
    ChannelShapeMismatch { expected: String, actual: String },

    /// A predicate reads attributes that are not in the bound heading
    #[error("predicate domain attribute '{attribute}' is not in heading {heading}")]
    PredicateDomainOutOfSchema { attribute: String, heading: String },

    /// An error surfaced from a child node during streaming
    #[error("source error: {0}")]
    Source(Box<RelError>),
}

impl RelError {
    /// Wrap a child node's error for propagation to its parent.
    pub fn source(err: RelError) -> RelError {
        RelError::Source(Box::new(err))
    }

    /// Strip `Source` wrappers down to the originating error.
    pub fn root(&self) -> &RelError {
        match self {
            RelError::Source(inner) => inner.root(),
            other => other,
        }
    }
}

/// Result type for engine operations
pub type RelResult<T> = Result<T, RelError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_source_wrapping() {
        let inner = RelError::EmptyCandidateKey;
        let wrapped = RelError::source(RelError::source(inner.clone()));
        assert_eq!(wrapped.root(), &inner);
        assert_ne!(wrapped, inner);
    }

    #[test]
    fn test_display_includes_context() {
        let err = RelError::UnknownKeyAttribute {
            attribute: "PNO".to_string(),
            heading: "{SNO, SName}".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("PNO"));
        assert!(msg.contains("{SNO, SName}"));
    }
}
