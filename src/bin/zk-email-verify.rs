//! Operator CLI: trusted setup, code derivation, proving and verification.

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{anyhow, Context, Result};
use clap::{Args, Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use zk_email_verify::config::KeyConfig;
use zk_email_verify::keys::KeyFile;
use zk_email_verify::processor::{Groth16ProofProcessor, ProofProcessor};
use zk_email_verify::setup::bootstrap;
use zk_email_verify::generate_code;

/// Zero-knowledge email verification tooling.
#[derive(Parser, Debug)]
#[command(name = "zk-email-verify", version, about, long_about = None)]
struct Cli {
    /// Enable verbose output. Repeat for more verbosity (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run the Groth16 ceremony and replace the key file with a new key pair.
    Setup(KeyFileArgs),

    /// Derive the verification code for an email and salt.
    Code(CodeArgs),

    /// Prove that an email derives a code and print the proof as hex.
    Prove(ProveArgs),

    /// Check a hex proof against a code and salt.
    Verify(VerifyArgs),
}

#[derive(Args, Debug)]
struct KeyFileArgs {
    /// Key pair file. Defaults to $ZK_KEY_FILE.
    #[arg(long)]
    keys: Option<PathBuf>,
}

#[derive(Args, Debug)]
struct CodeArgs {
    #[arg(long)]
    email: String,
    #[arg(long)]
    salt: String,
}

#[derive(Args, Debug)]
struct ProveArgs {
    #[arg(long)]
    email: String,
    #[arg(long)]
    salt: String,
    #[arg(long)]
    code: String,
    #[command(flatten)]
    key_file: KeyFileArgs,
}

#[derive(Args, Debug)]
struct VerifyArgs {
    #[arg(long)]
    code: String,
    #[arg(long)]
    salt: String,
    /// Proof bytes as hex.
    #[arg(long)]
    proof: String,
    #[command(flatten)]
    key_file: KeyFileArgs,
}

impl KeyFileArgs {
    /// `--keys` wins over `ZK_KEY_FILE`.
    fn key_file(&self, config: &KeyConfig) -> Result<KeyFile> {
        self.keys
            .clone()
            .or_else(|| config.key_file.clone())
            .map(KeyFile::new)
            .ok_or_else(|| anyhow!("no key file given; pass --keys or set ZK_KEY_FILE"))
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let filter = match cli.verbose {
        0 => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        1 => EnvFilter::new("info"),
        2 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();

    let result = KeyConfig::from_env()
        .context("reading key configuration")
        .and_then(|config| match cli.command {
            Commands::Setup(args) => run_setup_command(&args, &config),
            Commands::Code(args) => run_code(&args),
            Commands::Prove(args) => run_prove(&args, &config),
            Commands::Verify(args) => run_verify(&args, &config),
        });

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("{e:#}");
            ExitCode::from(1)
        }
    }
}

fn run_setup_command(args: &KeyFileArgs, config: &KeyConfig) -> Result<()> {
    let key_file = args.key_file(config)?;
    let keys = bootstrap(&key_file, true).context("trusted setup failed")?;

    println!(
        "wrote key pair {} ({}) to {}",
        keys.key_pair_id,
        keys.shape.fingerprint(),
        key_file.path().display()
    );
    Ok(())
}

fn run_code(args: &CodeArgs) -> Result<()> {
    println!("{}", generate_code(&args.email, &args.salt)?);
    Ok(())
}

fn run_prove(args: &ProveArgs, config: &KeyConfig) -> Result<()> {
    let processor = load_processor(&args.key_file.key_file(config)?, config)?;
    let (proof, key_pair_id) = processor
        .generate_proof(&args.email, &args.salt, &args.code)
        .context("proof generation failed")?;

    tracing::info!(key_pair_id, bytes = proof.len(), "proof generated");
    println!("{}", hex::encode(proof));
    Ok(())
}

fn run_verify(args: &VerifyArgs, config: &KeyConfig) -> Result<()> {
    let processor = load_processor(&args.key_file.key_file(config)?, config)?;
    let proof = hex::decode(args.proof.trim()).context("proof is not valid hex")?;

    processor
        .verify_proof(&args.code, &args.salt, &proof)
        .context("proof rejected")?;

    println!("ok");
    Ok(())
}

/// Keys per `GENERATE_NEW_ZK_SNARKS_KEYS`: a fresh ceremony, or the latest key pair in the file.
fn load_processor(key_file: &KeyFile, config: &KeyConfig) -> Result<Groth16ProofProcessor> {
    let keys = bootstrap(key_file, config.generate_new_keys)
        .with_context(|| format!("loading keys from {}", key_file.path().display()))?;
    Ok(Groth16ProofProcessor::new(keys)?)
}
