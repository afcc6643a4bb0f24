//! Check whether a raw secp256k1 private key and an extended public key
//! (xpub/zpub/tpub...) derive the same native segwit address.
//!
//! The library entry point is [`verify::Verifier`] (or [`verify::run`]);
//! [`run`] wraps it in a small command line tool.

pub mod address;
pub mod codec;
pub mod ec;
pub mod error;
pub mod report;
pub mod verify;

use clap::{arg, ArgMatches, Command};
use thiserror::Error;
use tracing_subscriber::EnvFilter;

use crate::address::NetworkParams;
use crate::codec::{KeyVersion, VersionPolicy};
use crate::verify::Verifier;

pub use crate::error::{KeyError, Stage, VerifyError};
pub use crate::verify::{Verdict, VerificationResult};

/// Failure of a CLI command.
#[derive(Debug, Error)]
enum CliError {
  #[error(transparent)]
  Verify(#[from] VerifyError),
  #[error("failed to serialize result: {0}")]
  Json(#[from] serde_json::Error),
}

fn init_logging() {
  let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
  let _ = tracing_subscriber::fmt()
    .with_env_filter(filter)
    .with_writer(std::io::stderr)
    .try_init();
}

fn networks_from_matches(matches: &ArgMatches) -> Vec<NetworkParams> {
  let mut networks: Vec<NetworkParams> = matches
    .get_many::<String>("network")
    .into_iter()
    .flatten()
    .filter_map(|name| NetworkParams::preset(name))
    .collect();
  networks.extend(
    matches
      .get_many::<String>("hrp")
      .into_iter()
      .flatten()
      .map(NetworkParams::new),
  );
  networks
}

/// Argument value with surrounding whitespace removed.
fn cli_value<'a>(matches: &'a ArgMatches, id: &str) -> &'a str {
  matches
    .get_one::<String>(id)
    .map(|s| s.trim())
    .expect("argument should be required")
}

fn render_json(result: &VerificationResult) -> Result<String, CliError> {
  Ok(serde_json::to_string_pretty(result)?)
}

fn run_cmd_verify(matches: &ArgMatches) -> Result<(), CliError> {
  let private_key = cli_value(matches, "private-key");
  let xkey = cli_value(matches, "xkey");
  let policy = match matches.get_one::<String>("require-version") {
    Some(name) => VersionPolicy::Require(
      KeyVersion::from_name(name).expect("value parser only admits known versions"),
    ),
    None => VersionPolicy::Permissive,
  };

  let verifier = Verifier::new()
    .with_networks(networks_from_matches(matches))
    .with_version_policy(policy);
  let result = verifier.run(private_key, xkey)?;

  if matches.get_flag("json") {
    println!("{}", render_json(&result)?);
  } else {
    print!("{result}");
  }
  Ok(())
}

fn run_cmd_inspect(matches: &ArgMatches) -> Result<(), CliError> {
  use crate::error::AtStage;

  let xkey = cli_value(matches, "xkey");
  let payload = codec::base58check_decode(xkey).at(Stage::DecodeExtendedKey)?;
  let xk = codec::ExtendedKeyContainer::parse(&payload).at(Stage::ParseExtendedKey)?;
  print!("{xk}");

  let pk = ec::parse_public_key(&xk.key_field).at(Stage::ParseEmbeddedKey)?;
  for net in networks_from_matches(matches) {
    let addr = address::encode_segwit_v0(&pk, &net).at(Stage::EncodeExtendedKeyAddress)?;
    println!("{net} address: {addr}");
  }
  Ok(())
}

fn network_args(cmd: Command) -> Command {
  cmd
    .arg(
      arg!(-n --network <NETWORK> "network preset (repeatable)")
        .id("network")
        .action(clap::ArgAction::Append)
        .default_values(["mainnet", "testnet"])
        .value_parser(["mainnet", "testnet", "regtest"]),
    )
    .arg(
      arg!(--hrp <HRP> "additional bech32 human-readable prefix (repeatable)")
        .id("hrp")
        .action(clap::ArgAction::Append),
    )
}

pub fn run() {
  init_logging();

  let matches = Command::new(env!("CARGO_CRATE_NAME"))
    .version(env!("CARGO_PKG_VERSION"))
    .about("Check whether a private key and an extended public key derive the same P2WPKH address")
    .arg_required_else_help(true)
    .subcommand(network_args(
      Command::new("verify")
        .about("Compare the addresses derived from a private key and an extended public key")
        .arg(
          arg!(-k --"private-key" <HEX> "32-byte private key as 64 hex characters")
            .id("private-key")
            .env("KEYMATCH_PRIVATE_KEY")
            .hide_env_values(true)
            .required(true),
        )
        .arg(
          arg!(<XKEY> "Base58Check extended public key (xpub/zpub/tpub...)").id("xkey"),
        )
        .arg(
          arg!(
            --"require-version" <VERSION>
            "reject extended keys with a different version prefix"
          )
          .id("require-version")
          .value_parser(["xpub", "ypub", "zpub", "tpub", "upub", "vpub"]),
        )
        .arg(arg!(--json "print the result as JSON").id("json")),
    ))
    .subcommand(network_args(
      Command::new("inspect")
        .about("Print the fields and embedded-key addresses of an extended public key")
        .arg(arg!(<XKEY> "Base58Check extended public key").id("xkey")),
    ))
    .get_matches();

  let outcome = match matches.subcommand() {
    Some(("verify", matches)) => run_cmd_verify(matches),
    Some(("inspect", matches)) => run_cmd_inspect(matches),
    _ => unreachable!("subcommand should be required"),
  };

  if let Err(e) = outcome {
    eprintln!("error: {e}");
    std::process::exit(1);
  }
}
