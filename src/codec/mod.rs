//! Key material codecs:
//! - hex decoding of raw private keys
//! - Base58Check decode/encode (double SHA-256 checksum, 4 bytes)
//! - flat layout of a serialized extended key (see [`xkey`])

mod xkey;

use zeroize::Zeroizing;

use crate::error::{redact, KeyError};

pub use xkey::{
  extract_extended_key_field, ExtendedKeyContainer, KeyVersion, VersionPolicy, EXTENDED_KEY_LEN,
  KEY_FIELD_LEN, KEY_FIELD_OFFSET,
};

/// Length of a raw secp256k1 private key.
pub const PRIVATE_KEY_LEN: usize = 32;

/// Decode a hex string. Fails on odd length or non-hex characters.
pub fn decode_hex(s: &str) -> Result<Vec<u8>, KeyError> {
  hex::decode(s).map_err(|e| match e {
    hex::FromHexError::OddLength => KeyError::Format(format!("odd-length hex {}", redact(s))),
    hex::FromHexError::InvalidHexCharacter { index, .. } => {
      KeyError::Format(format!("non-hex character at index {index} in {}", redact(s)))
    }
    other => KeyError::Format(format!("{other} in {}", redact(s))),
  })
}

/// Decode a private key given as exactly 64 hex characters (no `0x` prefix).
///
/// The decoded bytes are wiped when the returned buffer is dropped.
pub fn decode_private_key_hex(s: &str) -> Result<Zeroizing<[u8; PRIVATE_KEY_LEN]>, KeyError> {
  let bytes = Zeroizing::new(decode_hex(s)?);
  if bytes.len() != PRIVATE_KEY_LEN {
    return Err(KeyError::Format(format!(
      "private key must be {PRIVATE_KEY_LEN} bytes, got {} from {}",
      bytes.len(),
      redact(s)
    )));
  }
  let mut out = Zeroizing::new([0u8; PRIVATE_KEY_LEN]);
  out.copy_from_slice(&bytes);
  Ok(out)
}

/// Base58 decode `s`, verify and strip the trailing 4-byte checksum.
///
/// Whitespace is outside the alphabet and rejected like any other character.
pub fn base58check_decode(s: &str) -> Result<Vec<u8>, KeyError> {
  bs58::decode(s)
    .with_check(None)
    .into_vec()
    .map_err(|e| match e {
      bs58::decode::Error::InvalidChecksum { .. } => KeyError::Checksum,
      bs58::decode::Error::NoChecksum => {
        KeyError::Format(format!("too short to carry a checksum: {}", redact(s)))
      }
      bs58::decode::Error::InvalidCharacter { character, index } => {
        KeyError::Format(format!("invalid base58 character {character:?} at index {index}"))
      }
      bs58::decode::Error::NonAsciiCharacter { index } => {
        KeyError::Format(format!("non-ascii character at index {index}"))
      }
      other => KeyError::Format(format!("base58 decode failed: {other}")),
    })
}

/// Base58 encode `payload` with a freshly computed checksum.
pub fn base58check_encode(payload: &[u8]) -> String {
  bs58::encode(payload).with_check().into_string()
}
