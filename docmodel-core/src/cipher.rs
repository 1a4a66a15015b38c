//! Field-level encryption.
//!
//! Attributes a [`Schema`] marks as encrypted are sealed through a
//! [`FieldCipher`] before a document is written and opened again after it is
//! read. The cipher only ever sees wire values; aliasing and inflation happen
//! on the opened document.
//!
//! [`AesFieldCipher`] (feature `encryption`) is the bundled implementation.

use bson::{Bson, Document};
use tracing::trace;

use crate::error::EncryptionError;
use crate::schema::Schema;

/// Encrypts and decrypts individual attribute values.
pub trait FieldCipher: Send + Sync {
    /// Encrypt the value stored under `field`.
    fn encrypt(&self, field: &str, value: &Bson) -> Result<Bson, EncryptionError>;

    /// Decrypt the value stored under `field`.
    fn decrypt(&self, field: &str, value: &Bson) -> Result<Bson, EncryptionError>;
}

/// Encrypt every encrypted attribute present in `doc`. Nulls are left as is.
pub fn seal_fields(
    cipher: &dyn FieldCipher,
    schema: &Schema,
    doc: &mut Document,
) -> Result<(), EncryptionError> {
    for attribute in schema.encrypted() {
        let wire = schema.wire_for(attribute);
        if let Some(value) = doc.get_mut(wire) {
            if matches!(value, Bson::Null) {
                continue;
            }
            *value = cipher.encrypt(attribute, value)?;
            trace!(model = %schema.name(), field = %attribute, "Sealed field");
        }
    }
    Ok(())
}

/// Decrypt every encrypted attribute present in `doc`. Nulls are left as is.
pub fn open_fields(
    cipher: &dyn FieldCipher,
    schema: &Schema,
    doc: &mut Document,
) -> Result<(), EncryptionError> {
    for attribute in schema.encrypted() {
        let wire = schema.wire_for(attribute);
        if let Some(value) = doc.get_mut(wire) {
            if matches!(value, Bson::Null) {
                continue;
            }
            *value = cipher.decrypt(attribute, value)?;
        }
    }
    Ok(())
}

#[cfg(feature = "encryption")]
pub use aes::AesFieldCipher;

#[cfg(feature = "encryption")]
mod aes {
    use aes_gcm::aead::{Aead, AeadCore, KeyInit, OsRng};
    use aes_gcm::{Aes256Gcm, Key, Nonce};
    use base64::Engine as _;
    use base64::engine::general_purpose::STANDARD;
    use bson::{Bson, Document};
    use sha2::{Digest, Sha256};

    use super::FieldCipher;
    use crate::error::EncryptionError;

    const NONCE_LEN: usize = 12;
    const PAYLOAD_KEY: &str = "v";

    /// AES-256-GCM field cipher.
    ///
    /// The key is the SHA-256 digest of a caller secret. Each value is wrapped
    /// in a one-entry document so any BSON type survives, encrypted under a
    /// fresh nonce, and stored as a base64 string of nonce followed by
    /// ciphertext.
    #[derive(Clone)]
    pub struct AesFieldCipher {
        cipher: Aes256Gcm,
    }

    impl AesFieldCipher {
        /// Derive the key from `secret`.
        pub fn new(secret: impl AsRef<[u8]>) -> Self {
            let digest = Sha256::digest(secret.as_ref());
            let key = Key::<Aes256Gcm>::from_slice(digest.as_slice());
            Self {
                cipher: Aes256Gcm::new(key),
            }
        }
    }

    impl std::fmt::Debug for AesFieldCipher {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            f.debug_struct("AesFieldCipher").finish_non_exhaustive()
        }
    }

    impl FieldCipher for AesFieldCipher {
        fn encrypt(&self, field: &str, value: &Bson) -> Result<Bson, EncryptionError> {
            let mut wrapper = Document::new();
            wrapper.insert(PAYLOAD_KEY, value.clone());
            let mut plaintext = Vec::new();
            wrapper
                .to_writer(&mut plaintext)
                .map_err(|e| EncryptionError::Payload {
                    field: field.to_string(),
                    message: e.to_string(),
                })?;

            let nonce = Aes256Gcm::generate_nonce(&mut OsRng);
            let ciphertext = self
                .cipher
                .encrypt(&nonce, plaintext.as_slice())
                .map_err(|_| EncryptionError::Encrypt {
                    field: field.to_string(),
                })?;

            let mut sealed = Vec::with_capacity(NONCE_LEN + ciphertext.len());
            sealed.extend_from_slice(nonce.as_slice());
            sealed.extend_from_slice(&ciphertext);
            Ok(Bson::String(STANDARD.encode(sealed)))
        }

        fn decrypt(&self, field: &str, value: &Bson) -> Result<Bson, EncryptionError> {
            let Bson::String(encoded) = value else {
                return Err(EncryptionError::Decode {
                    field: field.to_string(),
                    message: format!("expected a string, found {:?}", value.element_type()),
                });
            };
            let sealed = STANDARD
                .decode(encoded)
                .map_err(|e| EncryptionError::Decode {
                    field: field.to_string(),
                    message: e.to_string(),
                })?;
            if sealed.len() <= NONCE_LEN {
                return Err(EncryptionError::Decode {
                    field: field.to_string(),
                    message: "ciphertext too short".to_string(),
                });
            }

            let (nonce, ciphertext) = sealed.split_at(NONCE_LEN);
            let plaintext = self
                .cipher
                .decrypt(Nonce::from_slice(nonce), ciphertext)
                .map_err(|_| EncryptionError::Decrypt {
                    field: field.to_string(),
                })?;

            let mut payload =
                Document::from_reader(plaintext.as_slice()).map_err(|e| EncryptionError::Payload {
                    field: field.to_string(),
                    message: e.to_string(),
                })?;
            payload
                .remove(PAYLOAD_KEY)
                .ok_or_else(|| EncryptionError::Payload {
                    field: field.to_string(),
                    message: "missing payload value".to_string(),
                })
        }
    }
}
