//! Subcommand implementations.

pub mod check;
pub mod hex_utils;
pub mod patch;
pub mod scan;
pub mod toggle;

use std::fs::{File, OpenOptions};
use std::path::Path;

use anyhow::{Context, Result};
use permapatch::Patcher;
use tracing::debug;

use crate::cli::Cli;

/// Open a disc image, read-only unless the command writes to it
pub fn open_image(path: &Path, writable: bool) -> Result<File> {
    debug!(
        "Opening {} ({})",
        path.display(),
        if writable { "read-write" } else { "read-only" }
    );
    let file = if writable {
        OpenOptions::new().read(true).write(true).open(path)
    } else {
        File::open(path)
    };
    file.with_context(|| format!("Failed to open image {}", path.display()))
}

pub fn patcher(cli: &Cli, force: bool) -> Patcher {
    Patcher::with_config(cli.patcher_config(force))
}
