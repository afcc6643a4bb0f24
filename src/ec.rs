//! secp256k1 key operations:
//! - point(k):  scalar -> compressed public key (k * G)
//! - strict SEC1 parsing of public key bytes

use std::fmt;

use secp256k1::{Secp256k1, SecretKey};
use serde::{Serialize, Serializer};

use crate::error::KeyError;

pub const COMPRESSED_LEN: usize = 33;
pub const UNCOMPRESSED_LEN: usize = 65;

/// Validated private scalar in [1, n-1].
#[derive(Clone)]
pub struct PrivateKey(SecretKey);

impl PrivateKey {
  /// Fails if the big-endian integer is 0 or >= the curve order.
  pub fn from_bytes(k: &[u8; 32]) -> Result<Self, KeyError> {
    SecretKey::from_byte_array(*k)
      .map(PrivateKey)
      .map_err(|_| KeyError::InvalidScalar)
  }

  pub fn public_key(&self) -> PublicKey {
    let secp = Secp256k1::new();
    PublicKey(secp256k1::PublicKey::from_secret_key(&secp, &self.0))
  }
}

impl fmt::Debug for PrivateKey {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str("PrivateKey(<redacted>)")
  }
}

/// A point on secp256k1, always handled in compressed form.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct PublicKey(secp256k1::PublicKey);

impl PublicKey {
  /// serP(P): compressed SEC1 encoding (0x02/0x03 + X)
  pub fn serialize(&self) -> [u8; COMPRESSED_LEN] {
    self.0.serialize()
  }

  pub fn to_hex(&self) -> String {
    hex::encode(self.serialize())
  }
}

impl fmt::Debug for PublicKey {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "PublicKey({})", self.to_hex())
  }
}

impl fmt::Display for PublicKey {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(&self.to_hex())
  }
}

impl Serialize for PublicKey {
  fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&self.to_hex())
  }
}

/// point(k): compute K = k * G and return it compressed.
pub fn public_key_from_private(k: &[u8; 32]) -> Result<PublicKey, KeyError> {
  Ok(PrivateKey::from_bytes(k)?.public_key())
}

/// Parse SEC1 public key bytes.
///
/// Only 33-byte compressed (0x02/0x03) and 65-byte uncompressed (0x04) forms
/// are accepted, and the point must satisfy y^2 = x^3 + 7 (mod p). Hybrid
/// encodings and the 0x00 private key marker are rejected.
pub fn parse_public_key(bytes: &[u8]) -> Result<PublicKey, KeyError> {
  let prefix = *bytes
    .first()
    .ok_or_else(|| KeyError::InvalidPoint("empty key".into()))?;
  let prefix_ok = match bytes.len() {
    COMPRESSED_LEN => prefix == 0x02 || prefix == 0x03,
    UNCOMPRESSED_LEN => prefix == 0x04,
    n => {
      return Err(KeyError::InvalidPoint(format!(
        "expected {COMPRESSED_LEN} or {UNCOMPRESSED_LEN} bytes, got {n}"
      )))
    }
  };
  if !prefix_ok {
    return Err(KeyError::InvalidPoint(format!(
      "prefix {prefix:#04x} not valid for a {}-byte key",
      bytes.len()
    )));
  }
  secp256k1::PublicKey::from_slice(bytes)
    .map(PublicKey)
    .map_err(|_| KeyError::InvalidPoint("point is not on secp256k1".into()))
}
