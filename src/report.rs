//! Plain-text rendering of pipeline output.

use std::fmt;

use crate::codec::ExtendedKeyContainer;
use crate::verify::{Verdict, VerificationResult};

fn yes_no(b: bool) -> &'static str {
  if b {
    "yes"
  } else {
    "no"
  }
}

fn version_label(version: u32, known: Option<impl fmt::Display>) -> String {
  match known {
    Some(v) => v.to_string(),
    None => format!("unknown ({version:#010x})"),
  }
}

impl fmt::Display for Verdict {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Verdict::Confirmed => f.write_str("CONFIRMED: the keys derive different addresses"),
      Verdict::NotConfirmed => f.write_str("NOT CONFIRMED: the keys derive identical addresses"),
    }
  }
}

impl fmt::Display for VerificationResult {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let xk = &self.extended_key;
    writeln!(
      f,
      "extended key: {}, depth {}, child {:#010x}",
      version_label(xk.version, xk.known_version),
      xk.depth,
      xk.child_number
    )?;
    writeln!(f, "public key (private key):  {}", self.private_key_public_key)?;
    writeln!(f, "public key (extended key): {}", self.extended_key_public_key)?;
    writeln!(f, "public keys match: {}", yes_no(self.public_keys_equal))?;
    for n in &self.networks {
      let width = n.private_key_address.as_str().len().max(n.extended_key_address.as_str().len());
      writeln!(f)?;
      writeln!(f, "{}:", n.network)?;
      writeln!(f, "  private key address:  {}", n.private_key_address)?;
      writeln!(f, "  extended key address: {}", n.extended_key_address)?;
      writeln!(
        f,
        "  match: {} ({} of {width} characters differ)",
        yes_no(n.addresses_equal),
        n.differing_chars
      )?;
    }
    writeln!(f)?;
    writeln!(f, "{}", self.verdict)
  }
}

impl fmt::Display for ExtendedKeyContainer {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let version = version_label(self.version, self.key_version());
    writeln!(f, "version:            {version}")?;
    writeln!(f, "depth:              {}", self.depth)?;
    writeln!(f, "parent fingerprint: {}", hex::encode(self.parent_fingerprint))?;
    writeln!(f, "child number:       {:#010x}", self.child_number)?;
    writeln!(f, "chain code:         {}", hex::encode(self.chain_code))?;
    writeln!(f, "key field:          {}", hex::encode(self.key_field))?;
    if self.trailing_len > 0 {
      writeln!(f, "trailing bytes:     {}", self.trailing_len)?;
    }
    Ok(())
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::address::NetworkParams;
  use crate::codec::base58check_decode;
  use crate::verify::run;

  const ZPUB: &str = "zpub6s3Buz3fYNRSZk9BFYo9RCMkAvSiknUtRVjuYYCZmDJPrxTwYEW6fBXzYwMdT3DaKaE7TxN1QQwU2tjpNzAYS3S9G2xGEPQcMsrgxQNwh47";
  const PRIV: &str = "0f688c5d4ba70afba86924114e9055823482580f8bad62d32eeb00be9f4c7b50";

  #[test]
  fn result_report() {
    let res = run(PRIV, ZPUB, &NetworkParams::defaults()).unwrap();
    let text = res.to_string();
    assert!(text.contains("zpub (0x04b24746)"));
    assert!(text.contains("mainnet:"));
    assert!(text.contains("testnet:"));
    assert!(text.contains("37 of 42 characters differ"));
    assert!(text.ends_with("CONFIRMED: the keys derive different addresses\n"));
    assert!(!text.contains("NOT CONFIRMED"));
    assert!(!text.contains(PRIV));
  }

  #[test]
  fn container_report() {
    let xk = ExtendedKeyContainer::parse(&base58check_decode(ZPUB).unwrap()).unwrap();
    let text = xk.to_string();
    assert!(text.contains("version:            zpub (0x04b24746)"));
    assert!(text.contains("parent fingerprint: ea517ee5"));
    assert!(text.contains("child number:       0x80000000"));
    assert!(!text.contains("trailing"));
  }

  #[test]
  fn container_report_unknown_version_and_trailing_bytes() {
    let mut payload = base58check_decode(ZPUB).unwrap();
    payload[..4].copy_from_slice(&[0xde, 0xad, 0xbe, 0xef]);
    payload.push(0x00);
    let xk = ExtendedKeyContainer::parse(&payload).unwrap();
    let text = xk.to_string();
    assert!(text.contains("unknown (0xdeadbeef)"));
    assert!(text.contains("trailing bytes:     1"));
  }

  #[test]
  fn json_shape() {
    let res = run(PRIV, ZPUB, &[NetworkParams::mainnet()]).unwrap();
    let v = serde_json::to_value(&res).unwrap();
    assert_eq!(v["verdict"], "confirmed");
    assert_eq!(v["public_keys_equal"], false);
    assert_eq!(v["extended_key"]["known_version"], "zpub");
    assert_eq!(v["networks"][0]["network"]["hrp"], "bc");
    assert_eq!(
      v["private_key_public_key"],
      "026b6eadb10ad2b787e70fb8b29d270ac6a61d34e5a76b63bd953cbb9fa31d5e22"
    );
  }
}
