//! Fabric root public key.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use sha2::{Digest, Sha256};
use std::fmt;

/// Length of an uncompressed P-256 public key.
pub const ROOT_PUBLIC_KEY_LEN: usize = 65;

/// Error returned when key material does not have the fixed key length.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("root public key must be 65 bytes, got {actual}")]
pub struct KeyLengthError {
    /// Length of the rejected input.
    pub actual: usize,
}

/// Public key of a fabric's root of trust.
///
/// Two fabric references denote the same administrative domain only if
/// their root public keys are byte-for-byte equal. Construction rejects any
/// input that is not exactly [`ROOT_PUBLIC_KEY_LEN`] bytes; nothing is ever
/// truncated or padded.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct RootPublicKey([u8; ROOT_PUBLIC_KEY_LEN]);

impl RootPublicKey {
    /// Returns the raw key bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// Short SHA-256 based fingerprint, suitable for log lines.
    pub fn fingerprint(&self) -> String {
        let digest = Sha256::digest(self.0);
        hex::encode(&digest[..8])
    }
}

impl TryFrom<&[u8]> for RootPublicKey {
    type Error = KeyLengthError;

    fn try_from(bytes: &[u8]) -> Result<Self, Self::Error> {
        let raw: [u8; ROOT_PUBLIC_KEY_LEN] = bytes.try_into().map_err(|_| KeyLengthError {
            actual: bytes.len(),
        })?;
        Ok(Self(raw))
    }
}

impl AsRef<[u8]> for RootPublicKey {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl fmt::Debug for RootPublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "RootPublicKey({})", self.fingerprint())
    }
}

impl Serialize for RootPublicKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&hex::encode(self.0))
    }
}

impl<'de> Deserialize<'de> for RootPublicKey {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let encoded = String::deserialize(deserializer)?;
        let bytes = hex::decode(encoded.trim()).map_err(serde::de::Error::custom)?;
        RootPublicKey::try_from(bytes.as_slice()).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(fill: u8) -> Vec<u8> {
        let mut bytes = vec![fill; ROOT_PUBLIC_KEY_LEN];
        bytes[0] = 0x04;
        bytes
    }

    #[test]
    fn accepts_exact_length() {
        let parsed = RootPublicKey::try_from(key(1).as_slice()).unwrap();
        assert_eq!(parsed.as_bytes(), key(1).as_slice());
    }

    #[test]
    fn rejects_short_and_long_input() {
        let short = vec![0u8; ROOT_PUBLIC_KEY_LEN - 1];
        assert_eq!(
            RootPublicKey::try_from(short.as_slice()),
            Err(KeyLengthError {
                actual: ROOT_PUBLIC_KEY_LEN - 1
            })
        );
        let long = vec![0u8; ROOT_PUBLIC_KEY_LEN + 1];
        assert!(RootPublicKey::try_from(long.as_slice()).is_err());
    }

    #[test]
    fn equality_is_bytewise() {
        let a = RootPublicKey::try_from(key(1).as_slice()).unwrap();
        let b = RootPublicKey::try_from(key(1).as_slice()).unwrap();
        let c = RootPublicKey::try_from(key(2).as_slice()).unwrap();
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_ne!(a.fingerprint(), c.fingerprint());
    }

    #[test]
    fn hex_serialization() {
        let parsed = RootPublicKey::try_from(key(0xAB).as_slice()).unwrap();
        let json = serde_json::to_string(&parsed).unwrap();
        assert_eq!(json, format!("\"{}\"", hex::encode(key(0xAB))));
        let back: RootPublicKey = serde_json::from_str(&json).unwrap();
        assert_eq!(back, parsed);

        let truncated = format!("\"{}\"", hex::encode(&key(0xAB)[..10]));
        assert!(serde_json::from_str::<RootPublicKey>(&truncated).is_err());
    }
}
