//! Ed25519 key material: generation, base64 (de)serialization, and the
//! fingerprint used to look signing keys up in a [`engine_core::TrustPolicy`].

use ed25519_dalek::{Signer, SigningKey, Verifier, VerifyingKey};
use engine_core::canon;

use crate::error::AttestError;

/// A loaded Ed25519 key pair, ready to sign provenance bytes.
pub struct KeyMaterial {
    signing_key: SigningKey,
}

impl KeyMaterial {
    /// Generate a fresh key pair from the OS RNG.
    pub fn generate() -> Self {
        let mut csprng = rand::rngs::OsRng;
        Self {
            signing_key: SigningKey::generate(&mut csprng),
        }
    }

    /// Load from a 32-byte seed, as read from `TOOL_SIGNING_KEY`.
    pub fn from_seed_bytes(seed: &[u8]) -> Result<Self, AttestError> {
        let seed: [u8; 32] = seed
            .try_into()
            .map_err(|_| AttestError::KeyMissing("signing key must be 32 bytes".into()))?;
        Ok(Self {
            signing_key: SigningKey::from_bytes(&seed),
        })
    }

    /// The base64-encoded public key, as stored in [`engine_core::Signature::public_key`].
    pub fn public_key_base64(&self) -> String {
        encode_public_key(&self.signing_key.verifying_key())
    }

    /// SHA-256 fingerprint of the raw public key bytes, lowercase hex.
    ///
    /// A DER-encoded public key would be the more conventional fingerprint
    /// input, but this workspace has no `pkcs8`/`der` dependency, so the
    /// fingerprint is taken over the raw 32-byte Ed25519 public key instead
    /// (see `DESIGN.md`).
    pub fn fingerprint(&self) -> String {
        fingerprint_of(&self.signing_key.verifying_key())
    }

    /// Sign `bytes`, returning the raw 64-byte signature.
    pub fn sign(&self, bytes: &[u8]) -> [u8; 64] {
        self.signing_key.sign(bytes).to_bytes()
    }
}

/// SHA-256 fingerprint of a verifying key's raw bytes, lowercase hex.
pub fn fingerprint_of(key: &VerifyingKey) -> String {
    canon::sha256_hex(key.as_bytes())
}

/// Base64-encode a verifying key's raw bytes.
pub fn encode_public_key(key: &VerifyingKey) -> String {
    use base64::Engine as _;
    base64::engine::general_purpose::STANDARD.encode(key.as_bytes())
}

/// Decode a base64 public key and verify `signature` over `message`.
pub fn verify_raw(public_key_b64: &str, message: &[u8], signature: &[u8]) -> Result<(), AttestError> {
    use base64::Engine as _;
    let key_bytes = base64::engine::general_purpose::STANDARD
        .decode(public_key_b64)
        .map_err(|e| AttestError::MalformedAttestation(format!("invalid public key encoding: {e}")))?;
    let key_bytes: [u8; 32] = key_bytes
        .try_into()
        .map_err(|_| AttestError::MalformedAttestation("public key must be 32 bytes".into()))?;
    let verifying_key = VerifyingKey::from_bytes(&key_bytes)
        .map_err(|e| AttestError::MalformedAttestation(format!("invalid public key: {e}")))?;
    let sig_bytes: [u8; 64] = signature
        .try_into()
        .map_err(|_| AttestError::MalformedAttestation("signature must be 64 bytes".into()))?;
    let signature = ed25519_dalek::Signature::from_bytes(&sig_bytes);
    verifying_key
        .verify(message, &signature)
        .map_err(|e| AttestError::SignatureInvalid(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sign_and_verify_round_trips() {
        let key = KeyMaterial::generate();
        let message = b"provenance bytes";
        let signature = key.sign(message);
        verify_raw(&key.public_key_base64(), message, &signature).unwrap();
    }

    #[test]
    fn verification_fails_against_a_different_key() {
        let key = KeyMaterial::generate();
        let other = KeyMaterial::generate();
        let message = b"provenance bytes";
        let signature = key.sign(message);
        let err = verify_raw(&other.public_key_base64(), message, &signature).unwrap_err();
        assert!(matches!(err, AttestError::SignatureInvalid(_)));
    }

    #[test]
    fn fingerprint_is_stable_for_the_same_key() {
        let key = KeyMaterial::generate();
        assert_eq!(key.fingerprint(), key.fingerprint());
        assert_eq!(key.fingerprint().len(), 64);
    }

    #[test]
    fn from_seed_bytes_rejects_wrong_length() {
        let err = KeyMaterial::from_seed_bytes(&[0u8; 10]).unwrap_err();
        assert!(matches!(err, AttestError::KeyMissing(_)));
    }
}
