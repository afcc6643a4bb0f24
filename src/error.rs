use std::fmt;

use thiserror::Error;

use crate::codec::{KeyVersion, EXTENDED_KEY_LEN};

/// Failure of a single key-material operation.
///
/// Variants never carry raw key bytes. Anything echoed back from the caller's
/// input goes through [`redact`] first.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum KeyError {
  /// Malformed hex or base58 text, or a decoded value of the wrong length
  #[error("malformed input: {0}")]
  Format(String),
  /// Base58Check checksum did not match the payload
  #[error("base58check checksum mismatch")]
  Checksum,
  /// Extended key payload too short to hold a key field
  #[error("extended key payload is {len} bytes, need at least {}", EXTENDED_KEY_LEN)]
  Structure { len: usize },
  /// Private key is zero or not below the curve order
  #[error("private key scalar out of range [1, n-1]")]
  InvalidScalar,
  /// Public key bytes are not a valid secp256k1 point
  #[error("invalid public key: {0}")]
  InvalidPoint(String),
  /// Address could not be encoded for the given network parameters
  #[error("address encoding failed: {0}")]
  Encoding(String),
  /// Version prefix did not match the one required by the version policy
  #[error("extended key version {found:#010x} does not match required {expected}")]
  UnexpectedVersion { found: u32, expected: KeyVersion },
}

/// Pipeline checkpoint at which a verification failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
  DecodePrivateKey,
  DerivePublicKey,
  EncodePrivateKeyAddress,
  DecodeExtendedKey,
  ParseExtendedKey,
  ParseEmbeddedKey,
  EncodeExtendedKeyAddress,
}

impl fmt::Display for Stage {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    use Stage::*;
    let name = match self {
      DecodePrivateKey => "decode private key",
      DerivePublicKey => "derive public key",
      EncodePrivateKeyAddress => "encode private key address",
      DecodeExtendedKey => "decode extended key",
      ParseExtendedKey => "parse extended key",
      ParseEmbeddedKey => "parse embedded public key",
      EncodeExtendedKeyAddress => "encode extended key address",
    };
    f.write_str(name)
  }
}

/// A [`KeyError`] tagged with the stage that produced it.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{stage} failed: {source}")]
pub struct VerifyError {
  pub stage: Stage,
  pub source: KeyError,
}

impl VerifyError {
  pub fn kind(&self) -> &KeyError {
    &self.source
  }
}

/// Extension to tag a `Result<_, KeyError>` with its stage.
pub(crate) trait AtStage<T> {
  fn at(self, stage: Stage) -> Result<T, VerifyError>;
}

impl<T> AtStage<T> for Result<T, KeyError> {
  fn at(self, stage: Stage) -> Result<T, VerifyError> {
    self.map_err(|source| VerifyError { stage, source })
  }
}

const REDACT_PREFIX: usize = 6;

/// Shorten caller input for error messages: a short prefix plus the length.
pub fn redact(s: &str) -> String {
  let n = s.chars().count();
  if n <= REDACT_PREFIX {
    return format!("{:?} ({n} chars)", s);
  }
  let prefix: String = s.chars().take(REDACT_PREFIX).collect();
  format!("\"{prefix}...\" ({n} chars)")
}
