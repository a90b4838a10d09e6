//! # permapatch
//!
//! Core library for the Metroid Prime permadeath patcher.
//!
//! This crate provides:
//! - Disc header version detection
//! - Streaming signature scanning over large disc images
//! - Patch-site classification (patched / vanilla / unrecognized)
//! - Payload application with first-failure reporting
//!
//! The caller owns the image handle: the engine seeks, reads and writes
//! through it but never opens or closes files, and never prints.

pub mod error;
pub mod image;
pub mod patch;
pub mod patcher;
pub mod prelude;
pub mod scan;
pub mod signature;

pub use error::{Error, Result};
pub use image::{HeaderRule, ImageHandle, ImageVersion, VERSION_RULES, detect_version};
pub use patch::{
    Direction, GroupReport, GroupState, MatchRecord, Operation, PatchReport, PatchRequest,
    PatchStatus, SiteState, apply_patches, classify_group, group_status, overall_status,
};
pub use patcher::{Inspection, Patcher, PatcherConfig, PatcherConfigBuilder, RunOutcome};
pub use scan::{
    BoundaryPolicy, DEFAULT_CHUNK_SIZE, MatchPolicy, ScanOptions, ScanResult, SignatureMatches,
    scan_image,
};
pub use signature::{
    NO_SAVING, PERMADEATH, PatchDescriptor, PatchGroup, PatchProfile, Signature,
    builtin_profiles, format_pattern, profile_for, supported_versions,
};
