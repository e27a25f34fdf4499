use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use pastedb_sdk::CompressionMode;

#[derive(Parser)]
#[command(
    name = "pastedb",
    about = "PasteDB: a document key-value store on top of a paste/blob service",
    version
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[arg(long, global = true, default_value = "text")]
    pub format: OutputFormat,

    /// TOML configuration file
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Root blob id of the database (overrides config and PASTEDB_ROOT_ID)
    #[arg(long, global = true)]
    pub root: Option<String>,

    /// none, pretty or binary
    #[arg(long, global = true)]
    pub compression: Option<CompressionMode>,

    /// Directory the local blob store lives in
    #[arg(long, global = true, default_value = ".pastedb")]
    pub data_dir: PathBuf,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
pub enum Command {
    /// Create a new database and print its root id
    Create(CreateArgs),
    /// Delete a database and every document in it
    Destroy(DestroyArgs),
    /// Print a document
    Get(GetArgs),
    /// Write a document
    Set(SetArgs),
    /// Delete documents
    Delete(DeleteArgs),
    /// List keys
    Keys,
    /// Evict every expired document
    Purge,
}

#[derive(Args)]
pub struct CreateArgs {
    #[arg(short, long)]
    pub public: bool,
    #[arg(short, long)]
    pub description: Option<String>,
}

#[derive(Args)]
pub struct DestroyArgs {
    /// Root blob id of the database to destroy
    pub root_id: String,
}

#[derive(Args)]
pub struct GetArgs {
    pub key: String,
    /// Fail unless the stored revision is this one
    #[arg(long)]
    pub rev: Option<String>,
}

#[derive(Args)]
pub struct SetArgs {
    pub key: String,
    /// Document value as a JSON object
    pub value: String,
    #[arg(long)]
    pub ttl_ms: Option<u64>,
    /// Expected current revision
    #[arg(long)]
    pub rev: Option<String>,
    /// Attach a file as NAME=PATH (repeatable)
    #[arg(long = "file")]
    pub files: Vec<String>,
    #[arg(short, long)]
    pub description: Option<String>,
}

#[derive(Args)]
pub struct DeleteArgs {
    #[arg(required = true)]
    pub keys: Vec<String>,
}
