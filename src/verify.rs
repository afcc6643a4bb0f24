//! Verification pipeline.
//!
//! Derives one address set from a raw private key and another from the key
//! embedded in an extended public key, then compares them:
//!
//! ```text
//! private key hex -> k -> k*G -> P2WPKH(net)   (A)
//! extended key    -> payload[45..78] -> P -> P2WPKH(net)   (B)
//! ```
//!
//! The verdict is `Confirmed` when the two derivations disagree, which is the
//! discrepancy this check exists to demonstrate. An exact match is surfaced as
//! `NotConfirmed`.

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::address::{encode_segwit_v0, Address, NetworkParams};
use crate::codec::{self, ExtendedKeyContainer, KeyVersion, VersionPolicy};
use crate::ec::{self, PublicKey};
use crate::error::{AtStage, Stage, VerifyError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Verdict {
  /// The private key and the extended key disagree
  Confirmed,
  /// Everything matched, no discrepancy shown
  NotConfirmed,
}

/// Addresses of both keys under one network.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NetworkComparison {
  pub network: NetworkParams,
  pub private_key_address: Address,
  pub extended_key_address: Address,
  pub addresses_equal: bool,
  pub differing_chars: usize,
}

/// Header fields of the extended key, kept for reports.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExtendedKeyInfo {
  pub version: u32,
  pub known_version: Option<KeyVersion>,
  pub depth: u8,
  pub parent_fingerprint: String,
  pub child_number: u32,
}

impl From<&ExtendedKeyContainer> for ExtendedKeyInfo {
  fn from(xk: &ExtendedKeyContainer) -> Self {
    ExtendedKeyInfo {
      version: xk.version,
      known_version: xk.key_version(),
      depth: xk.depth,
      parent_fingerprint: hex::encode(xk.parent_fingerprint),
      child_number: xk.child_number,
    }
  }
}

/// Outcome of one verification run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VerificationResult {
  pub private_key_public_key: PublicKey,
  pub extended_key_public_key: PublicKey,
  pub extended_key: ExtendedKeyInfo,
  pub public_keys_equal: bool,
  pub networks: Vec<NetworkComparison>,
  pub verdict: Verdict,
}

impl VerificationResult {
  pub fn all_addresses_equal(&self) -> bool {
    self.networks.iter().all(|n| n.addresses_equal)
  }

  pub fn is_confirmed(&self) -> bool {
    self.verdict == Verdict::Confirmed
  }
}

/// Character-level Hamming distance over the shorter string; each extra
/// character of the longer string counts as one difference.
pub fn differing_chars(a: &str, b: &str) -> usize {
  let (la, lb) = (a.chars().count(), b.chars().count());
  let mismatched = a.chars().zip(b.chars()).filter(|(x, y)| x != y).count();
  mismatched + la.abs_diff(lb)
}

/// Verification settings: networks to compare under and how strictly to
/// treat the extended key's version prefix.
#[derive(Debug, Clone)]
pub struct Verifier {
  networks: Vec<NetworkParams>,
  version_policy: VersionPolicy,
}

impl Default for Verifier {
  fn default() -> Self {
    Verifier {
      networks: NetworkParams::defaults(),
      version_policy: VersionPolicy::Permissive,
    }
  }
}

impl Verifier {
  pub fn new() -> Self {
    Self::default()
  }

  /// An empty list keeps the default networks.
  pub fn with_networks(mut self, networks: Vec<NetworkParams>) -> Self {
    if networks.is_empty() {
      debug!("empty network list, keeping defaults");
    } else {
      self.networks = networks;
    }
    self
  }

  pub fn with_version_policy(mut self, policy: VersionPolicy) -> Self {
    self.version_policy = policy;
    self
  }

  pub fn networks(&self) -> &[NetworkParams] {
    &self.networks
  }

  pub fn version_policy(&self) -> VersionPolicy {
    self.version_policy
  }

  /// Run the full pipeline. Any failing stage ends the run.
  pub fn run(
    &self,
    private_key_hex: &str,
    extended_key: &str,
  ) -> Result<VerificationResult, VerifyError> {
    // 1. private key -> public key A -> addresses A
    let k = codec::decode_private_key_hex(private_key_hex).at(Stage::DecodePrivateKey)?;
    let pk_a = ec::public_key_from_private(&k).at(Stage::DerivePublicKey)?;
    drop(k);
    debug!(public_key = %pk_a, "derived public key from private key");
    let addrs_a = self.encode_all(&pk_a).at(Stage::EncodePrivateKeyAddress)?;

    // 2. extended key -> embedded public key B -> addresses B
    let payload = codec::base58check_decode(extended_key).at(Stage::DecodeExtendedKey)?;
    let xk = ExtendedKeyContainer::parse(&payload).at(Stage::ParseExtendedKey)?;
    xk.check_version(self.version_policy).at(Stage::ParseExtendedKey)?;
    debug!(
      version = %format!("{:#010x}", xk.version),
      depth = xk.depth,
      child_number = xk.child_number,
      trailing = xk.trailing_len,
      "parsed extended key"
    );
    let pk_b = ec::parse_public_key(&xk.key_field).at(Stage::ParseEmbeddedKey)?;
    debug!(public_key = %pk_b, "parsed embedded public key");
    let addrs_b = self.encode_all(&pk_b).at(Stage::EncodeExtendedKeyAddress)?;

    // 3. public keys
    let public_keys_equal = pk_a.serialize() == pk_b.serialize();

    // 4. addresses per network
    let networks: Vec<NetworkComparison> = self
      .networks
      .iter()
      .zip(addrs_a.into_iter().zip(addrs_b))
      .map(|(net, (a, b))| {
        let differing = differing_chars(a.as_str(), b.as_str());
        NetworkComparison {
          network: net.clone(),
          addresses_equal: a == b,
          differing_chars: differing,
          private_key_address: a,
          extended_key_address: b,
        }
      })
      .collect();

    // 5. verdict
    let any_address_differs = networks.iter().any(|n| !n.addresses_equal);
    let verdict = if !public_keys_equal || any_address_differs {
      info!(public_keys_equal, "discrepancy confirmed");
      Verdict::Confirmed
    } else {
      warn!("private key and extended key derive identical addresses, no discrepancy shown");
      Verdict::NotConfirmed
    };

    Ok(VerificationResult {
      private_key_public_key: pk_a,
      extended_key_public_key: pk_b,
      extended_key: ExtendedKeyInfo::from(&xk),
      public_keys_equal,
      networks,
      verdict,
    })
  }

  /// Verify independent (private key, extended key) pairs. Results keep the
  /// input order; one failing pair does not affect the others.
  pub fn run_batch<'a, I>(&self, inputs: I) -> Vec<Result<VerificationResult, VerifyError>>
  where
    I: IntoIterator<Item = (&'a str, &'a str)>,
  {
    inputs
      .into_iter()
      .map(|(private_key_hex, extended_key)| self.run(private_key_hex, extended_key))
      .collect()
  }

  fn encode_all(&self, pk: &PublicKey) -> Result<Vec<Address>, crate::error::KeyError> {
    self.networks.iter().map(|net| encode_segwit_v0(pk, net)).collect()
  }
}

/// Run the pipeline with the given networks and a permissive version policy.
pub fn run(
  private_key_hex: &str,
  extended_key: &str,
  networks: &[NetworkParams],
) -> Result<VerificationResult, VerifyError> {
  Verifier::new().with_networks(networks.to_vec()).run(private_key_hex, extended_key)
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::error::KeyError;
  use test_case::test_case;

  const ZPUB: &str = "zpub6s3Buz3fYNRSZk9BFYo9RCMkAvSiknUtRVjuYYCZmDJPrxTwYEW6fBXzYwMdT3DaKaE7TxN1QQwU2tjpNzAYS3S9G2xGEPQcMsrgxQNwh47";
  const PRIV: &str = "0f688c5d4ba70afba86924114e9055823482580f8bad62d32eeb00be9f4c7b50";

  /// Re-encode the zpub with `key` in place of its key field.
  fn zpub_with_key(key: &[u8; 33]) -> String {
    let mut payload = codec::base58check_decode(ZPUB).unwrap();
    payload[45..78].copy_from_slice(key);
    codec::base58check_encode(&payload)
  }

  #[test_case("abcd", "abcd", 0 ; "equal")]
  #[test_case("abcd", "abce", 1 ; "one differs")]
  #[test_case("abcd", "ab", 2 ; "shorter")]
  #[test_case("ab", "xbcd", 3 ; "longer and differing")]
  #[test_case("", "", 0 ; "empty")]
  fn hamming(a: &str, b: &str, want: usize) {
    assert_eq!(differing_chars(a, b), want);
    assert_eq!(differing_chars(b, a), want);
  }

  #[test]
  fn mismatched_keys_confirmed() {
    let res = run(PRIV, ZPUB, &NetworkParams::defaults()).unwrap();
    assert_eq!(res.verdict, Verdict::Confirmed);
    assert!(!res.public_keys_equal);
    assert_eq!(res.networks.len(), 2);
    assert!(res.networks.iter().all(|n| !n.addresses_equal));

    let main = &res.networks[0];
    assert_eq!(main.private_key_address.as_str(), "bc1qjz5ml4u2rmrsdc5ms8vvjf2pfzls3eclk5u5lk");
    assert_eq!(main.extended_key_address.as_str(), "bc1q0mxqum7mk7mjq4rrlgvg4679rmgcczzdz6kw39");
    assert_eq!(main.differing_chars, 37);

    let test = &res.networks[1];
    assert_eq!(test.private_key_address.as_str(), "tb1qjz5ml4u2rmrsdc5ms8vvjf2pfzls3ecluj88y9");
    assert_eq!(test.extended_key_address.as_str(), "tb1q0mxqum7mk7mjq4rrlgvg4679rmgcczzdguda2k");
    assert_eq!(test.differing_chars, 37);
  }

  #[test]
  fn matching_keys_not_confirmed() {
    let mut k = [0u8; 32];
    hex::decode_to_slice(PRIV, &mut k).unwrap();
    let pk = ec::public_key_from_private(&k).unwrap();
    let xkey = zpub_with_key(&pk.serialize());

    let res = run(PRIV, &xkey, &NetworkParams::defaults()).unwrap();
    assert_eq!(res.verdict, Verdict::NotConfirmed);
    assert!(res.public_keys_equal);
    assert!(res.all_addresses_equal());
    assert!(res.networks.iter().all(|n| n.differing_chars == 0));
  }

  #[test]
  fn result_carries_intermediate_values() {
    let res = run(PRIV, ZPUB, &[NetworkParams::testnet()]).unwrap();
    assert_eq!(
      res.private_key_public_key.to_hex(),
      "026b6eadb10ad2b787e70fb8b29d270ac6a61d34e5a76b63bd953cbb9fa31d5e22"
    );
    assert_eq!(
      res.extended_key_public_key.to_hex(),
      "022fad1f6ab360676c12399e0d9bd9dc7442bba7d2020082842042452891739514"
    );
    assert_eq!(res.extended_key.known_version, Some(KeyVersion::Zpub));
    assert_eq!(res.extended_key.depth, 3);
    assert_eq!(res.networks.len(), 1);
  }

  #[test]
  fn empty_network_list_uses_defaults() {
    let res = run(PRIV, ZPUB, &[]).unwrap();
    let hrps: Vec<_> = res.networks.iter().map(|n| n.network.hrp.as_str()).collect();
    assert_eq!(hrps, ["bc", "tb"]);
  }

  #[test]
  fn malformed_private_key_rejected_before_curve_ops() {
    // 33 bytes
    let err = run(&format!("{PRIV}00"), ZPUB, &[]).unwrap_err();
    assert_eq!(err.stage, Stage::DecodePrivateKey);
    assert!(matches!(err.source, KeyError::Format(_)));
    assert!(!err.to_string().contains(&PRIV[6..]));

    let err = run(&PRIV[1..], ZPUB, &[]).unwrap_err();
    assert_eq!(err.stage, Stage::DecodePrivateKey);
  }

  #[test]
  fn surrounding_whitespace_rejected() {
    let err = run(&format!(" {PRIV}"), ZPUB, &[]).unwrap_err();
    assert_eq!(err.stage, Stage::DecodePrivateKey);
    assert!(matches!(err.source, KeyError::Format(_)));

    let err = run(PRIV, &format!("{ZPUB}\n"), &[]).unwrap_err();
    assert_eq!(err.stage, Stage::DecodeExtendedKey);
    assert!(matches!(err.source, KeyError::Format(_)));
  }

  #[test]
  fn zero_private_key() {
    let err = run(&"00".repeat(32), ZPUB, &[]).unwrap_err();
    assert_eq!(err.stage, Stage::DerivePublicKey);
    assert_eq!(err.source, KeyError::InvalidScalar);
  }

  #[test]
  fn bad_checksum() {
    let mut s = ZPUB.to_string();
    s.pop();
    s.push('8');
    let err = run(PRIV, &s, &[]).unwrap_err();
    assert_eq!(err.stage, Stage::DecodeExtendedKey);
    assert_eq!(err.source, KeyError::Checksum);
  }

  #[test]
  fn short_payload() {
    let payload = codec::base58check_decode(ZPUB).unwrap();
    let short = codec::base58check_encode(&payload[..77]);
    let err = run(PRIV, &short, &[]).unwrap_err();
    assert_eq!(err.stage, Stage::ParseExtendedKey);
    assert_eq!(err.source, KeyError::Structure { len: 77 });
  }

  #[test]
  fn off_curve_embedded_key() {
    let mut bogus = [0u8; 33];
    bogus[0] = 0x02;
    let err = run(PRIV, &zpub_with_key(&bogus), &[]).unwrap_err();
    assert_eq!(err.stage, Stage::ParseEmbeddedKey);
    assert!(matches!(err.source, KeyError::InvalidPoint(_)));
  }

  #[test]
  fn private_key_material_in_key_field() {
    let mut field = [0x11u8; 33];
    field[0] = 0x00;
    let err = run(PRIV, &zpub_with_key(&field), &[]).unwrap_err();
    assert_eq!(err.stage, Stage::ParseEmbeddedKey);
  }

  #[test]
  fn bad_network_params() {
    let err = run(PRIV, ZPUB, &[NetworkParams::new("")]).unwrap_err();
    assert_eq!(err.stage, Stage::EncodePrivateKeyAddress);
    assert!(matches!(err.source, KeyError::Encoding(_)));
  }

  #[test]
  fn version_policy_branches() {
    let strict_ok = Verifier::new().with_version_policy(VersionPolicy::Require(KeyVersion::Zpub));
    assert!(strict_ok.run(PRIV, ZPUB).is_ok());

    let strict_bad = Verifier::new().with_version_policy(VersionPolicy::Require(KeyVersion::Xpub));
    let err = strict_bad.run(PRIV, ZPUB).unwrap_err();
    assert_eq!(err.stage, Stage::ParseExtendedKey);
    assert!(matches!(err.source, KeyError::UnexpectedVersion { .. }));

    assert!(Verifier::new().run(PRIV, ZPUB).is_ok());
  }

  #[test]
  fn batch_keeps_order_and_isolates_failures() {
    let zero = "00".repeat(32);
    let results = Verifier::new().run_batch([(PRIV, ZPUB), (zero.as_str(), ZPUB), (PRIV, ZPUB)]);
    assert_eq!(results.len(), 3);
    assert!(results[0].as_ref().unwrap().is_confirmed());
    assert!(results[1].is_err());
    assert_eq!(results[0], results[2]);
  }
}
