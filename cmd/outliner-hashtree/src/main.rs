//! Standalone driver for `stable-hash-tree`, demonstrating the two rounds
//! of the protocol the library is built around without requiring an
//! actual LTO-capable codegen backend.
//!
//! Round one (`record`) treats each line of its input file as a
//! whitespace-separated instruction sequence and inserts it into a trie,
//! which is then persisted to `--hash-tree-file`. Round two (`scan`)
//! rehydrates that trie and runs the incremental matcher against a single
//! instruction stream, printing every terminal match it finds.
//!
//! Real instruction hashing is an external collaborator the library never
//! assumes a default for (see `stable_hash_tree::HashOracle`); this binary
//! stands in for it with the simplest possible oracle, since there is no
//! real machine-instruction representation to hash in a standalone CLI.

mod cli;

use std::fs;
use std::process::ExitCode;

use clap::Parser;
use tracing::{error, info};

use stable_hash_tree::{
    codec, mode, outliner, HashTrie, HashTreeMode, MatchedEntry, Matcher, RuntimeOptions,
    StableHash,
};

use cli::{Cli, Command};

fn init_tracing(log_level: tracing::Level) {
    let filter = tracing_subscriber::EnvFilter::builder()
        .with_default_directive(log_level.into())
        .from_env_lossy();
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

/// The demo oracle: each whitespace-separated token in an input file is
/// already a decimal `StableHash`, so hashing an instruction is parsing
/// its token.
fn identity_oracle(token: &u64) -> StableHash {
    *token
}

fn parse_sequences(path: &std::path::Path) -> std::io::Result<Vec<Vec<u64>>> {
    let text = fs::read_to_string(path)?;
    Ok(text
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(|line| {
            line.split_whitespace()
                .filter_map(|tok| tok.parse::<u64>().ok())
                .collect()
        })
        .collect())
}

fn run(cli: Cli) -> Result<(), String> {
    let hash_tree_mode = HashTreeMode::from_option_str(&cli.hash_tree_mode);
    let options = RuntimeOptions::new(
        &cli.hash_tree_mode,
        cli.use_singleton_hash_tree,
        cli.outline_dead_code_only,
        cli.outline_cold_code_only,
    );

    match cli.command {
        Command::Record { sequences_file } => {
            let sequences =
                parse_sequences(&sequences_file).map_err(|e| format!("reading sequences: {e}"))?;

            if options.use_singleton_hash_tree {
                mode::insert_many_singleton(&sequences);
                info!(
                    sequences = sequences.len(),
                    "recorded round-one sequences into the singleton hash tree"
                );
                return Ok(());
            }

            let mut trie = HashTrie::load_or_default(&cli.hash_tree_file);
            for sequence in &sequences {
                outliner::record_local_outlining(&mut trie, sequence);
            }
            info!(
                sequences = sequences.len(),
                nodes = trie.size(false),
                terminals = trie.size(true),
                "recorded round-one sequences"
            );

            codec::write_to_file(&trie, &cli.hash_tree_file)
                .map_err(|e| format!("writing hash tree: {e}"))?;
            Ok(())
        }
        Command::Scan { instructions_file } => {
            if hash_tree_mode != HashTreeMode::Reading {
                error!("scan requires --hash-tree-mode=read");
                return Err("scan requires --hash-tree-mode=read".to_string());
            }

            let trie = mode::load_trie(&cli.hash_tree_file, &options);
            let instructions = parse_sequences(&instructions_file)
                .map_err(|e| format!("reading instructions: {e}"))?
                .into_iter()
                .next()
                .unwrap_or_default();
            let invalid_mask = vec![0usize; instructions.len()];

            let matcher = Matcher::new(&trie);
            let matches: Vec<MatchedEntry> =
                matcher.find_matches(&instructions, &invalid_mask, &identity_oracle);

            info!(matches = matches.len(), "round-two scan complete");
            for m in &matches {
                let slice = &instructions[m.start_index..m.start_index + m.length];
                println!(
                    "match start={} length={} sequence={:?}",
                    m.start_index, m.length, slice
                );
            }
            Ok(())
        }
        Command::Dump => {
            let trie = mode::load_trie(&cli.hash_tree_file, &options);
            println!(
                "{}",
                dump_summary(trie.size(false), trie.size(true), trie.depth())
            );
            Ok(())
        }
    }
}

fn dump_summary(nodes: usize, terminals: usize, depth: usize) -> String {
    format!("{{\"nodes\": {nodes}, \"terminals\": {terminals}, \"depth\": {depth}}}")
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.log_level);

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(message) => {
            error!(%message, "outliner-hashtree failed");
            ExitCode::FAILURE
        }
    }
}
