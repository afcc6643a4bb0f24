//! Flat view of a serialized extended key.
//!
//! Payload layout after Base58Check (78 bytes):
//!   version(4) | depth(1) | parent fingerprint(4) | child number(4) | chain code(32) | key(33)
//!
//! Only the key field is consumed downstream. The other fields are split out
//! for inspection and version checks; no derivation happens here.

use std::fmt;

use serde::Serialize;

use crate::error::KeyError;

/// Minimum payload length of a serialized extended key.
pub const EXTENDED_KEY_LEN: usize = 78;
pub const KEY_FIELD_OFFSET: usize = 45;
pub const KEY_FIELD_LEN: usize = 33;

/// SLIP-132 version prefixes for extended *public* keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum KeyVersion {
  /// mainnet, P2PKH / generic
  Xpub,
  /// mainnet, P2WPKH nested in P2SH
  Ypub,
  /// mainnet, native P2WPKH
  Zpub,
  /// testnet, P2PKH / generic
  Tpub,
  /// testnet, P2WPKH nested in P2SH
  Upub,
  /// testnet, native P2WPKH
  Vpub,
}

impl KeyVersion {
  pub const ALL: [KeyVersion; 6] = [
    KeyVersion::Xpub,
    KeyVersion::Ypub,
    KeyVersion::Zpub,
    KeyVersion::Tpub,
    KeyVersion::Upub,
    KeyVersion::Vpub,
  ];

  pub fn bytes(self) -> u32 {
    match self {
      KeyVersion::Xpub => 0x0488_B21E,
      KeyVersion::Ypub => 0x049D_7CB2,
      KeyVersion::Zpub => 0x04B2_4746,
      KeyVersion::Tpub => 0x0435_87CF,
      KeyVersion::Upub => 0x044A_5262,
      KeyVersion::Vpub => 0x045F_1CF6,
    }
  }

  pub fn from_bytes(v: u32) -> Option<Self> {
    Self::ALL.into_iter().find(|k| k.bytes() == v)
  }

  pub fn name(self) -> &'static str {
    match self {
      KeyVersion::Xpub => "xpub",
      KeyVersion::Ypub => "ypub",
      KeyVersion::Zpub => "zpub",
      KeyVersion::Tpub => "tpub",
      KeyVersion::Upub => "upub",
      KeyVersion::Vpub => "vpub",
    }
  }

  pub fn from_name(s: &str) -> Option<Self> {
    Self::ALL.into_iter().find(|k| k.name().eq_ignore_ascii_case(s))
  }
}

impl fmt::Display for KeyVersion {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{} ({:#010x})", self.name(), self.bytes())
  }
}

/// Whether the version prefix is checked before the key field is trusted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum VersionPolicy {
  /// Accept any version bytes.
  #[default]
  Permissive,
  /// Reject payloads whose version differs from the given prefix.
  Require(KeyVersion),
}

/// Decoded extended key, split into its fixed-width fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtendedKeyContainer {
  pub version: u32,
  pub depth: u8,
  pub parent_fingerprint: [u8; 4],
  pub child_number: u32,
  pub chain_code: [u8; 32],
  pub key_field: [u8; KEY_FIELD_LEN],
  /// Bytes past the 78-byte layout (tolerated, not interpreted)
  pub trailing_len: usize,
}

impl ExtendedKeyContainer {
  /// Split a Base58Check-decoded payload. Requires at least 78 bytes.
  pub fn parse(data: &[u8]) -> Result<Self, KeyError> {
    let key_field = extract_extended_key_field(data)?;

    let version = u32::from_be_bytes([data[0], data[1], data[2], data[3]]);
    let depth = data[4];
    let mut parent_fingerprint = [0u8; 4];
    parent_fingerprint.copy_from_slice(&data[5..9]);
    let child_number = u32::from_be_bytes([data[9], data[10], data[11], data[12]]);
    let mut chain_code = [0u8; 32];
    chain_code.copy_from_slice(&data[13..KEY_FIELD_OFFSET]);

    Ok(ExtendedKeyContainer {
      version,
      depth,
      parent_fingerprint,
      child_number,
      chain_code,
      key_field,
      trailing_len: data.len() - EXTENDED_KEY_LEN,
    })
  }

  /// Known SLIP-132 prefix of this payload, if any.
  pub fn key_version(&self) -> Option<KeyVersion> {
    KeyVersion::from_bytes(self.version)
  }

  /// Leading byte 0x00 marks private key material in the key field.
  pub fn holds_private_key(&self) -> bool {
    self.key_field[0] == 0x00
  }

  pub fn check_version(&self, policy: VersionPolicy) -> Result<(), KeyError> {
    match policy {
      VersionPolicy::Permissive => Ok(()),
      VersionPolicy::Require(expected) if expected.bytes() == self.version => Ok(()),
      VersionPolicy::Require(expected) => Err(KeyError::UnexpectedVersion {
        found: self.version,
        expected,
      }),
    }
  }
}

/// Key field of an extended key payload: bytes `45..78`.
pub fn extract_extended_key_field(data: &[u8]) -> Result<[u8; KEY_FIELD_LEN], KeyError> {
  if data.len() < EXTENDED_KEY_LEN {
    return Err(KeyError::Structure { len: data.len() });
  }
  let mut out = [0u8; KEY_FIELD_LEN];
  out.copy_from_slice(&data[KEY_FIELD_OFFSET..KEY_FIELD_OFFSET + KEY_FIELD_LEN]);
  Ok(out)
}
