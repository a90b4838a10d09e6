//! Command line definitions.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use permapatch::{BoundaryPolicy, DEFAULT_CHUNK_SIZE, MatchPolicy, PatcherConfig};

use crate::commands::hex_utils::parse_number;

#[derive(Parser)]
#[command(name = "permapatch")]
#[command(version, about = "Metroid Prime permadeath patcher")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Size of each streaming read (decimal or 0x-prefixed hex)
    #[arg(long, global = true, env = "PERMAPATCH_CHUNK_SIZE", default_value_t = DEFAULT_CHUNK_SIZE, value_parser = parse_chunk_size)]
    pub chunk_size: usize,

    /// Accept up to 10 matches per signature and allow a signature to be missing
    #[arg(long, global = true, env = "PERMAPATCH_LENIENT")]
    pub lenient: bool,

    /// Do not carry bytes across chunk reads (misses matches split by a chunk boundary)
    #[arg(long, global = true, env = "PERMAPATCH_CHUNK_LOCAL")]
    pub chunk_local: bool,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

impl Cli {
    /// Engine configuration from the global flags
    pub fn patcher_config(&self, force: bool) -> PatcherConfig {
        PatcherConfig::builder()
            .chunk_size(self.chunk_size)
            .match_policy(if self.lenient {
                MatchPolicy::LENIENT
            } else {
                MatchPolicy::STRICT
            })
            .boundary_policy(if self.chunk_local {
                BoundaryPolicy::ChunkLocal
            } else {
                BoundaryPolicy::Overlap
            })
            .allow_ambiguous(force)
            .build()
    }
}

#[derive(Subcommand)]
pub enum Command {
    /// Show the detected version and the state of every patch
    Check {
        /// Disc image (.iso)
        image: PathBuf,

        /// Print the inspection as JSON
        #[arg(long)]
        json: bool,
    },

    /// Install patches (all groups unless --group is given)
    Install(PatchArgs),

    /// Remove patches, restoring the original bytes
    Remove(PatchArgs),

    /// Set both patches at once: 1 installs, 0 removes
    Set {
        /// Disc image (.iso)
        image: PathBuf,

        /// Permadeath (1 = enable, 0 = disable)
        #[arg(value_parser = clap::value_parser!(u8).range(0..=1))]
        permadeath: u8,

        /// No-saving (1 = disable saving, 0 = restore saving)
        #[arg(value_parser = clap::value_parser!(u8).range(0..=1))]
        no_saving: u8,

        /// Write groups whose state is partial
        #[arg(long)]
        force: bool,
    },

    /// Interactively flip each patch
    Toggle {
        /// Disc image (.iso)
        image: PathBuf,

        /// Write groups whose state is partial
        #[arg(long)]
        force: bool,
    },

    /// List every signature match and the bytes at its patch site
    Scan {
        /// Disc image (.iso)
        image: PathBuf,

        /// Print the matches as JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(Args)]
pub struct PatchArgs {
    /// Disc image (.iso)
    pub image: PathBuf,

    /// Patch group to change (permadeath, no-saving); repeatable
    #[arg(short, long = "group")]
    pub groups: Vec<String>,

    /// Write groups whose state is partial
    #[arg(long)]
    pub force: bool,

    /// Print the outcome as JSON
    #[arg(long)]
    pub json: bool,
}

fn parse_chunk_size(s: &str) -> Result<usize, String> {
    let value = parse_number(s).map_err(|e| e.to_string())?;
    usize::try_from(value)
        .ok()
        .filter(|size| *size > 0)
        .ok_or_else(|| format!("invalid chunk size: {}", s))
}
