use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "chanlog",
    about = "Replicated append-only channel logs with last-write-wins reads",
    version
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Path to a TOML configuration file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Acting user for writes
    #[arg(short, long, global = true)]
    pub user: Option<String>,

    /// Channel password
    #[arg(short, long, global = true, default_value = "")]
    pub password: String,

    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[arg(long, global = true, default_value = "text")]
    pub format: OutputFormat,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
pub enum Command {
    /// Set a key
    Put(PutArgs),
    /// Append a keyless value
    Add(AddArgs),
    /// Delete a key
    Del(KeyArgs),
    /// Read the current value of a key
    Get(KeyArgs),
    /// Range query over a channel
    Query(QueryArgs),
    /// Merge a remote head into a channel
    Sync(SyncArgs),
    /// Show a channel's persisted head
    Head(ChannelArgs),
    /// Clear every entry of a channel
    Drop(ChannelArgs),
}

#[derive(Args)]
pub struct ChannelArgs {
    pub channel: String,
}

#[derive(Args)]
pub struct PutArgs {
    pub channel: String,
    pub key: String,
    /// JSON value; anything that does not parse is stored as a string
    pub value: String,
}

#[derive(Args)]
pub struct AddArgs {
    pub channel: String,
    pub value: String,
}

#[derive(Args)]
pub struct KeyArgs {
    pub channel: String,
    pub key: String,
}

#[derive(Args)]
pub struct QueryArgs {
    pub channel: String,
    #[arg(long, conflicts_with = "gte")]
    pub gt: Option<String>,
    #[arg(long)]
    pub gte: Option<String>,
    #[arg(long, conflicts_with = "lte")]
    pub lt: Option<String>,
    #[arg(long)]
    pub lte: Option<String>,
    /// Number of results; negative for all
    #[arg(short = 'n', long, allow_hyphen_values = true)]
    pub limit: Option<i64>,
    #[arg(short, long)]
    pub reverse: bool,
}

#[derive(Args)]
pub struct SyncArgs {
    pub channel: String,
    /// Hex head hash of the remote log snapshot
    pub head: String,
}
