use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing::Level;

pub const VERSION_STRING: &str = env!("CARGO_PKG_VERSION");

#[derive(Parser)]
#[command(
    name = "outliner-hashtree",
    version = VERSION_STRING,
    about = "Cross-module stable-hash trie driver for two-round LTO machine outlining"
)]
pub struct Cli {
    #[arg(
        long = "hash-tree-file",
        value_name = "HASH_TREE_FILE",
        default_value = "outliner.hashtree.json",
        help = "Path to the on-disk hash tree.",
        help_heading = "Hash tree options"
    )]
    pub hash_tree_file: PathBuf,
    #[arg(
        long = "hash-tree-mode",
        value_name = "MODE",
        default_value = "",
        help = "\"write\" to persist local outlining decisions, \"read\" to consume a prior round's tree.",
        help_heading = "Hash tree options"
    )]
    pub hash_tree_mode: String,
    #[arg(
        long = "use-singleton-hash-tree",
        action = clap::ArgAction::SetTrue,
        help = "Read/write through a process-wide singleton trie instead of the on-disk file.",
        help_heading = "Hash tree options"
    )]
    pub use_singleton_hash_tree: bool,
    #[arg(
        long = "log-level",
        default_value_t = Level::INFO,
        value_name = "LOG_LEVEL",
        help = "The verbosity level used for logs.",
        help_heading = "Hash tree options"
    )]
    pub log_level: Level,
    #[arg(
        long = "outline-dead-code-only",
        action = clap::ArgAction::SetTrue,
        help = "Restrict outlining to profile-marked dead code.",
        help_heading = "Outlining scope options"
    )]
    pub outline_dead_code_only: bool,
    #[arg(
        long = "outline-cold-code-only",
        action = clap::ArgAction::SetTrue,
        help = "Restrict outlining to profile-marked cold code.",
        help_heading = "Outlining scope options"
    )]
    pub outline_cold_code_only: bool,
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Round one: insert every sequence in `sequences_file` and persist
    /// the resulting tree to `--hash-tree-file`.
    Record {
        #[arg(value_name = "SEQUENCES_FILE")]
        sequences_file: PathBuf,
    },
    /// Round two: load the persisted tree and scan a single instruction
    /// stream for terminal matches. Requires `--hash-tree-mode=read`.
    Scan {
        #[arg(value_name = "INSTRUCTIONS_FILE")]
        instructions_file: PathBuf,
    },
    /// Print node/terminal counts and depth for the persisted tree.
    Dump,
}
