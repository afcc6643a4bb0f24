//! Native segwit v0 (P2WPKH) addresses:
//! - HASH160(P) = RIPEMD160(SHA256(serP(P)))
//! - bech32(hrp, 0 || HASH160(P))

use std::fmt;

use bech32::{hrp::Hrp, segwit};
use ripemd::Ripemd160;
use serde::Serialize;
use sha2::{Digest, Sha256};

use crate::ec::PublicKey;
use crate::error::KeyError;

/// The only witness version this encoder produces.
pub const WITNESS_VERSION_0: u8 = 0;

/// Address-level parameters of one network.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NetworkParams {
  /// Human-readable part of bech32 addresses
  pub hrp: String,
  pub witness_version: u8,
}

impl NetworkParams {
  pub fn new(hrp: impl Into<String>) -> Self {
    NetworkParams {
      hrp: hrp.into(),
      witness_version: WITNESS_VERSION_0,
    }
  }

  pub fn mainnet() -> Self {
    Self::new("bc")
  }

  pub fn testnet() -> Self {
    Self::new("tb")
  }

  pub fn regtest() -> Self {
    Self::new("bcrt")
  }

  /// Resolve a preset by name (mainnet/testnet/regtest).
  pub fn preset(name: &str) -> Option<Self> {
    match name {
      "mainnet" | "bitcoin" => Some(Self::mainnet()),
      "testnet" => Some(Self::testnet()),
      "regtest" => Some(Self::regtest()),
      _ => None,
    }
  }

  /// Mainnet and testnet.
  pub fn defaults() -> Vec<Self> {
    vec![Self::mainnet(), Self::testnet()]
  }
}

impl fmt::Display for NetworkParams {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self.hrp.as_str() {
      "bc" => f.write_str("mainnet"),
      "tb" => f.write_str("testnet"),
      "bcrt" => f.write_str("regtest"),
      other => write!(f, "hrp {other:?}"),
    }
  }
}

/// Bech32-encoded segwit address.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Address(String);

impl Address {
  pub fn as_str(&self) -> &str {
    &self.0
  }
}

impl fmt::Display for Address {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(&self.0)
  }
}

pub fn hash160(data: &[u8]) -> [u8; 20] {
  let mut sha = Sha256::new();
  sha.update(data);
  let mid = sha.finalize();

  let mut rip = Ripemd160::new();
  rip.update(mid);
  let out = rip.finalize();
  let mut r = [0u8; 20];
  r.copy_from_slice(&out);
  r
}

/// P2WPKH address of `pk` under `params`.
pub fn encode_segwit_v0(pk: &PublicKey, params: &NetworkParams) -> Result<Address, KeyError> {
  if params.witness_version != WITNESS_VERSION_0 {
    return Err(KeyError::Encoding(format!(
      "witness version {} not supported, only v0",
      params.witness_version
    )));
  }
  let hrp = Hrp::parse(&params.hrp)
    .map_err(|e| KeyError::Encoding(format!("invalid hrp {:?}: {e}", params.hrp)))?;
  let program = hash160(&pk.serialize());
  segwit::encode_v0(hrp, &program)
    .map(Address)
    .map_err(|e| KeyError::Encoding(e.to_string()))
}

/// Decode a segwit address into (hrp, witness version, witness program).
pub fn decode_segwit(address: &str) -> Result<(String, u8, Vec<u8>), KeyError> {
  let (hrp, version, program) =
    segwit::decode(address).map_err(|e| KeyError::Encoding(e.to_string()))?;
  Ok((hrp.to_string(), version.to_u8(), program))
}
