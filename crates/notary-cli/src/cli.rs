use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "notary",
    about = "Notarize documents on a shared append-only ledger",
    version,
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[arg(long, global = true, default_value = "text")]
    pub format: OutputFormat,

    /// TOML file with `[notary]` and `[ledger]` sections
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Dev ledger state file
    #[arg(long, global = true, default_value = "notary-ledger.json")]
    pub ledger: PathBuf,
}

#[derive(Clone, Debug, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
pub enum Command {
    /// Create a dev ledger with the configured accounts and stores
    Init(InitArgs),
    /// Print the digest of a document
    Digest(DigestArgs),
    /// Digest a document and record it on the ledger
    Notarize(NotarizeArgs),
    /// List entries by signer and/or document digest
    Search(SearchArgs),
}

#[derive(Args)]
pub struct InitArgs {
    /// Overwrite an existing ledger file
    #[arg(long)]
    pub force: bool,
}

#[derive(Args)]
pub struct DigestArgs {
    /// Only the first file is used
    #[arg(required = true)]
    pub files: Vec<PathBuf>,
}

#[derive(Args)]
pub struct NotarizeArgs {
    /// Only the first file is used
    #[arg(required = true)]
    pub files: Vec<PathBuf>,
    /// Signer identity; defaults to the ledger's first account
    #[arg(long)]
    pub signer: Option<String>,
}

#[derive(Args)]
pub struct SearchArgs {
    #[arg(long)]
    pub signer: Option<String>,
    /// Document digest, with or without `0x`
    #[arg(long)]
    pub hash: Option<String>,
    /// Keep running and print new entries as they are recorded
    #[arg(short, long)]
    pub follow: bool,
    /// How often to check the ledger file for new blocks while following
    #[arg(long, default_value = "1000")]
    pub poll_ms: u64,
}
