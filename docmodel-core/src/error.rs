//! Error types for model mapping operations.

use thiserror::Error;

/// Result type for model mapping operations.
pub type ModelResult<T> = Result<T, ModelError>;

/// Errors raised while mapping documents to models and back.
#[derive(Error, Debug)]
pub enum ModelError {
    /// The model already carries an identifier.
    #[error("identifier already assigned: {0}")]
    IdentifierAssigned(String),

    /// A value could not be interpreted as an identifier.
    #[error("invalid object id: {0}")]
    InvalidObjectId(String),

    /// Field encryption failed.
    #[error(transparent)]
    Encryption(#[from] EncryptionError),
}

impl ModelError {
    /// Create an invalid object id error.
    pub fn invalid_object_id(message: impl Into<String>) -> Self {
        Self::InvalidObjectId(message.into())
    }

    /// Check if this is an encryption error.
    pub fn is_encryption(&self) -> bool {
        matches!(self, Self::Encryption(_))
    }
}

/// Errors raised by a [`FieldCipher`](crate::cipher::FieldCipher).
///
/// Kept apart from [`ModelError`] so callers can tell corrupted ciphertext
/// from a deployment problem.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EncryptionError {
    /// The stored value is not a ciphertext string or is not valid base64.
    #[error("failed to decode ciphertext for field '{field}': {message}")]
    Decode {
        /// Attribute being decrypted.
        field: String,
        /// Underlying reason.
        message: String,
    },

    /// The cipher rejected the ciphertext (wrong key or tampered data).
    #[error("failed to decrypt field '{field}'")]
    Decrypt {
        /// Attribute being decrypted.
        field: String,
    },

    /// The cipher failed while encrypting.
    #[error("failed to encrypt field '{field}'")]
    Encrypt {
        /// Attribute being encrypted.
        field: String,
    },

    /// The plaintext could not be (de)serialized.
    #[error("invalid payload for field '{field}': {message}")]
    Payload {
        /// Attribute being processed.
        field: String,
        /// Underlying reason.
        message: String,
    },
}

impl EncryptionError {
    /// The attribute the failure relates to.
    pub fn field(&self) -> &str {
        match self {
            Self::Decode { field, .. }
            | Self::Decrypt { field }
            | Self::Encrypt { field }
            | Self::Payload { field, .. } => field,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = ModelError::invalid_object_id("xyz");
        assert_eq!(err.to_string(), "invalid object id: xyz");

        let err = ModelError::IdentifierAssigned("65f1c0ffee0000000000beef".into());
        assert!(err.to_string().contains("already assigned"));
    }

    #[test]
    fn test_encryption_error_is_distinct() {
        let err: ModelError = EncryptionError::Decrypt {
            field: "ssn".into(),
        }
        .into();
        assert!(err.is_encryption());
        assert_eq!(err.to_string(), "failed to decrypt field 'ssn'");
    }

    #[test]
    fn test_encryption_error_field() {
        let err = EncryptionError::Decode {
            field: "card".into(),
            message: "bad padding".into(),
        };
        assert_eq!(err.field(), "card");
    }
}
