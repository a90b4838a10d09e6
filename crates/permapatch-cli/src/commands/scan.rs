//! Scan command implementation.
//!
//! Lists raw signature matches without applying the match policy, which
//! helps diagnose images that `check` rejects.

use std::path::Path;

use anyhow::Result;
use permapatch::{
    ImageHandle, ImageVersion, Patcher, ScanOptions, ScanResult, SiteState, format_pattern,
    scan_image,
};
use serde::Serialize;

use super::hex_utils::format_hex_address;
use super::{open_image, patcher};
use crate::cli::Cli;

/// Per-signature cap for diagnostic scans, far above any policy limit
pub const DIAGNOSTIC_MAX_MATCHES: usize = 4096;

#[derive(Debug, Serialize)]
pub struct ScanEntry {
    pub group: String,
    pub offset: u64,
    pub site: u64,
    pub bytes: String,
    pub state: SiteState,
}

/// Scan `image` with the patcher's chunking but without its match cap
pub fn collect_entries<H: ImageHandle>(
    patcher: &Patcher,
    image: &mut H,
) -> Result<(ImageVersion, ScanResult, Vec<ScanEntry>)> {
    let (version, profile) = patcher.resolve_profile(image)?;

    let options = ScanOptions {
        max_matches: DIAGNOSTIC_MAX_MATCHES,
        ..patcher.config().scan_options()
    };
    let signatures: Vec<_> = profile.groups.iter().map(|g| &g.signature).collect();
    let scan = scan_image(image, &signatures, &options)?;

    let mut entries = Vec::new();
    for (group, found) in profile.groups.iter().zip(&scan.matches) {
        for &offset in &found.offsets {
            let site = group.descriptor.site(offset);
            let bytes = image.read_array::<4>(site)?;
            entries.push(ScanEntry {
                group: group.id.clone(),
                offset,
                site,
                bytes: format_pattern(&bytes),
                state: group.descriptor.classify(bytes),
            });
        }
    }

    Ok((version, scan, entries))
}

/// Run the scan command
pub fn run(cli: &Cli, image: &Path, json: bool) -> Result<()> {
    let mut file = open_image(image, false)?;
    let patcher = patcher(cli, false);
    let (version, scan, entries) = collect_entries(&patcher, &mut file)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&entries)?);
        return Ok(());
    }

    println!("Version Detected: {}", version);
    println!(
        "Scanned {} bytes in {} chunk(s)",
        scan.bytes_scanned, scan.chunks
    );
    for entry in &entries {
        println!(
            "  {:<12} match {}  site {}  [{}]  {}",
            entry.group,
            format_hex_address(entry.offset),
            format_hex_address(entry.site),
            entry.bytes,
            state_name(entry.state)
        );
    }
    println!("{} match(es)", entries.len());
    Ok(())
}

fn state_name(state: SiteState) -> &'static str {
    match state {
        SiteState::Patched => "patched",
        SiteState::Unpatched => "vanilla",
        SiteState::Unrecognized { .. } => "unrecognized",
    }
}
