//! Error types for the adapter runtime.

use thiserror::Error;

/// An exception raised by the distributed-object layer.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("distributed-object exception {repository_id} (minor {minor})")]
pub struct ForeignError {
    /// Repository id of the exception.
    pub repository_id: String,
    /// Minor code.
    pub minor: u32,
}

impl ForeignError {
    /// Creates a foreign exception.
    pub fn new(repository_id: impl Into<String>, minor: u32) -> Self {
        Self {
            repository_id: repository_id.into(),
            minor,
        }
    }
}

/// The single local exception kind signalled across the adapter boundary.
///
/// Converting from a [`ForeignError`] keeps none of its payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Error)]
#[error("a distributed-object exception occurred")]
pub struct AdapterError;

impl From<ForeignError> for AdapterError {
    fn from(error: ForeignError) -> Self {
        tracing::trace!(%error, "discarding foreign exception payload");
        Self
    }
}

/// Error type for value marshalling.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MarshalError {
    /// The value does not have the shape of the type.
    #[error("value does not match type '{expected}'")]
    TypeMismatch {
        /// IDL spelling of the expected type.
        expected: String,
    },

    /// A length-tagged sequence disagrees with its element count.
    #[error("sequence length {declared} does not match {actual} elements")]
    LengthMismatch {
        /// Length carried with the sequence.
        declared: u32,
        /// Number of elements present.
        actual: usize,
    },

    /// A sequence has more elements than a length can describe.
    #[error("sequence of {actual} elements exceeds the length range")]
    TooLong {
        /// Number of elements present.
        actual: usize,
    },

    /// A string holds a NUL, which the local representation cannot carry.
    #[error("string contains an interior NUL")]
    InteriorNul,

    /// The type has no value representation.
    #[error("type '{type_name}' cannot be marshalled")]
    Unsupported {
        /// IDL spelling of the type.
        type_name: String,
    },
}

impl MarshalError {
    /// Creates a type mismatch error.
    pub fn mismatch(expected: impl Into<String>) -> Self {
        Self::TypeMismatch {
            expected: expected.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_adapter_error_discards_payload() {
        let foreign = ForeignError::new("IDL:omg.org/CORBA/TRANSIENT:1.0", 7);
        let local: AdapterError = foreign.into();
        assert_eq!(local.to_string(), "a distributed-object exception occurred");
    }

    #[test]
    fn test_marshal_error_display() {
        let err = MarshalError::LengthMismatch {
            declared: 3,
            actual: 2,
        };
        assert_eq!(err.to_string(), "sequence length 3 does not match 2 elements");
    }
}
