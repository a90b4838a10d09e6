//! Streaming signature scanner
//!
//! The image is read front to back in fixed-size chunks and never held in
//! memory as a whole. Each signature is searched with a pre-built
//! [`memchr::memmem::Finder`], which runs in linear time over the chunk.
//!
//! # Chunk boundaries
//!
//! Under [`BoundaryPolicy::ChunkLocal`] a signature is only found when it lies
//! entirely inside one chunk read. Under [`BoundaryPolicy::Overlap`] the last
//! `signature.len() - 1` bytes of each chunk are searched again together with
//! the next chunk, so a signature straddling the boundary is found exactly
//! once.
//!
//! ```text
//!   chunk n                 chunk n+1
//! ┌───────────────────────┬───────────────────────┐
//! │ ............ 57 E4 06 │ 3E 4B FC ...          │
//! └───────────────────────┴───────────────────────┘
//!                ◄─ tail ─►  (carried under Overlap)
//! ```

mod policy;

use memchr::memmem::Finder;
use serde::Serialize;
use tracing::debug;

use crate::error::{Error, Result};
use crate::image::ImageHandle;
use crate::signature::Signature;

pub use policy::*;

/// Default chunk size for streaming reads (2KB)
pub const DEFAULT_CHUNK_SIZE: usize = 2048;

/// Scanner settings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ScanOptions {
    pub chunk_size: usize,
    pub boundary: BoundaryPolicy,
    /// Hard cap on matches per signature; exceeding it aborts the scan
    pub max_matches: usize,
}

impl Default for ScanOptions {
    fn default() -> Self {
        Self {
            chunk_size: DEFAULT_CHUNK_SIZE,
            boundary: BoundaryPolicy::default(),
            max_matches: MatchPolicy::default().max_matches,
        }
    }
}

/// Match offsets of one signature, in ascending order
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SignatureMatches {
    pub name: String,
    pub offsets: Vec<u64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScanResult {
    /// One entry per scanned signature, in the order they were given
    pub matches: Vec<SignatureMatches>,
    pub bytes_scanned: u64,
    pub chunks: u64,
}

impl ScanResult {
    pub fn offsets(&self, name: &str) -> Option<&[u64]> {
        self.matches
            .iter()
            .find(|m| m.name == name)
            .map(|m| m.offsets.as_slice())
    }
}

struct PreparedSignature<'a> {
    signature: &'a Signature,
    finder: Finder<'a>,
    /// Bytes from the previous chunk that must be searched again
    carry: usize,
    /// End of the last recorded match; later matches may not start before it
    next_start: u64,
}

/// Scan the whole image for every signature.
///
/// Fails with [`Error::TooManyMatches`] as soon as any signature exceeds
/// `options.max_matches`; no partial result is returned in that case.
pub fn scan_image<H: ImageHandle>(
    image: &mut H,
    signatures: &[&Signature],
    options: &ScanOptions,
) -> Result<ScanResult> {
    validate_options(signatures, options)?;

    let mut prepared: Vec<PreparedSignature> = signatures
        .iter()
        .map(|&signature| PreparedSignature {
            signature,
            finder: Finder::new(signature.bytes()),
            carry: match options.boundary {
                BoundaryPolicy::ChunkLocal => 0,
                BoundaryPolicy::Overlap => signature.len() - 1,
            },
            next_start: 0,
        })
        .collect();
    let max_carry = prepared.iter().map(|p| p.carry).max().unwrap_or(0);

    let mut matches: Vec<SignatureMatches> = signatures
        .iter()
        .map(|signature| SignatureMatches {
            name: signature.name().to_string(),
            offsets: Vec::new(),
        })
        .collect();

    let mut chunk = vec![0u8; options.chunk_size];
    let mut window: Vec<u8> = Vec::with_capacity(max_carry + options.chunk_size);
    let mut address: u64 = 0;
    let mut chunks: u64 = 0;

    loop {
        let read = image.read_at(address, &mut chunk)?;
        if read == 0 {
            break;
        }

        // window = carried tail of the previous chunk + this chunk
        let tail_len = window.len();
        window.extend_from_slice(&chunk[..read]);
        let window_base = address - tail_len as u64;

        for (entry, found) in prepared.iter_mut().zip(matches.iter_mut()) {
            // Never re-enter a match recorded from the previous window
            let resume = entry.next_start.saturating_sub(window_base) as usize;
            let start = (tail_len - entry.carry.min(tail_len)).max(resume.min(window.len()));
            for pos in entry.finder.find_iter(&window[start..]) {
                let offset = window_base + (start + pos) as u64;
                debug!(
                    "Found '{}' at 0x{:X} (chunk {})",
                    entry.signature.name(),
                    offset,
                    chunks
                );
                found.offsets.push(offset);
                entry.next_start = offset + entry.signature.len() as u64;

                if found.offsets.len() > options.max_matches {
                    return Err(Error::TooManyMatches {
                        group: found.name.clone(),
                        limit: options.max_matches,
                    });
                }
            }
        }

        address += read as u64;
        chunks += 1;

        let keep = max_carry.min(window.len());
        window.drain(..window.len() - keep);
    }

    debug!(
        "Scanned 0x{:X} bytes in {} chunk(s) of 0x{:X}",
        address, chunks, options.chunk_size
    );

    Ok(ScanResult {
        matches,
        bytes_scanned: address,
        chunks,
    })
}

fn validate_options(signatures: &[&Signature], options: &ScanOptions) -> Result<()> {
    if options.chunk_size == 0 {
        return Err(Error::InvalidConfig("Chunk size must be non-zero".to_string()));
    }

    if let Some(longest) = signatures.iter().max_by_key(|s| s.len())
        && longest.len() >= options.chunk_size
    {
        return Err(Error::InvalidConfig(format!(
            "Chunk size {} must be larger than signature '{}' ({} bytes)",
            options.chunk_size,
            longest.name(),
            longest.len()
        )));
    }

    Ok(())
}
