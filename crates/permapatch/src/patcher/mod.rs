//! Scan-and-patch engine.
//!
//! A [`Patcher`] owns its configuration and signature profiles; the image
//! handle is passed into every call, so one patcher can serve any number of
//! images without shared state.
//!
//! ## Example
//!
//! ```no_run
//! use std::fs::OpenOptions;
//! use permapatch::{Direction, PatchRequest, Patcher};
//!
//! let mut file = OpenOptions::new().read(true).write(true).open("prime.iso")?;
//! let patcher = Patcher::new();
//!
//! let inspection = patcher.inspect(&mut file)?;
//! println!("{}: {}", inspection.version, inspection.overall);
//!
//! let outcome = patcher.run(&mut file, &PatchRequest::all(Direction::Install))?;
//! assert!(outcome.after.is_some());
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

mod config;

use serde::Serialize;
use tracing::{info, warn};

use crate::error::{Error, Result};
use crate::image::{ImageHandle, ImageVersion, detect_version};
use crate::patch::{
    GroupState, PatchReport, PatchRequest, PatchStatus, PatchTarget, apply_patches,
    classify_group, overall_status,
};
use crate::scan::scan_image;
use crate::signature::{PatchProfile, builtin_profiles, profile_for};

pub use config::*;

/// Current state of an image
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Inspection {
    pub version: ImageVersion,
    pub profile: String,
    pub bytes_scanned: u64,
    /// One entry per profile group, in profile order
    pub groups: Vec<GroupState>,
    pub overall: PatchStatus,
}

impl Inspection {
    pub fn group(&self, id: &str) -> Option<&GroupState> {
        self.groups.iter().find(|g| g.id.eq_ignore_ascii_case(id))
    }

    /// Whether any group, or the image as a whole, is in partial state
    pub fn is_ambiguous(&self) -> bool {
        self.overall == PatchStatus::Partial
            || self.groups.iter().any(|g| g.status == PatchStatus::Partial)
    }
}

/// Result of [`Patcher::run`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RunOutcome {
    pub before: Inspection,
    /// Present when the request wrote anything
    pub report: Option<PatchReport>,
    /// Re-inspection after writing
    pub after: Option<Inspection>,
}

impl RunOutcome {
    /// The latest known state of the image
    pub fn current(&self) -> &Inspection {
        self.after.as_ref().unwrap_or(&self.before)
    }
}

pub struct Patcher {
    config: PatcherConfig,
    profiles: Vec<PatchProfile>,
}

impl Patcher {
    /// Create a patcher with default configuration and the built-in profiles
    pub fn new() -> Self {
        Self::with_config(PatcherConfig::default())
    }

    pub fn with_config(config: PatcherConfig) -> Self {
        Self::with_profiles(config, builtin_profiles())
    }

    pub fn with_profiles(config: PatcherConfig, profiles: Vec<PatchProfile>) -> Self {
        Self { config, profiles }
    }

    pub fn config(&self) -> &PatcherConfig {
        &self.config
    }

    pub fn profiles(&self) -> &[PatchProfile] {
        &self.profiles
    }

    /// Detect the image variant without checking support
    pub fn classify_version<H: ImageHandle>(&self, image: &mut H) -> Result<Option<ImageVersion>> {
        detect_version(image)
    }

    /// Detect the image variant and pick its profile
    pub fn resolve_profile<H: ImageHandle>(
        &self,
        image: &mut H,
    ) -> Result<(ImageVersion, &PatchProfile)> {
        let version = self
            .classify_version(image)?
            .ok_or(Error::UnrecognizedImage)?;
        info!("Version detected: {}", version);

        let profile =
            profile_for(&self.profiles, version).ok_or(Error::UnsupportedVersion(version))?;
        Ok((version, profile))
    }

    /// Detect, scan and classify the image
    pub fn inspect<H: ImageHandle>(&self, image: &mut H) -> Result<Inspection> {
        let (version, profile) = self.resolve_profile(image)?;
        self.check_chunk_size(profile)?;

        info!("Scanning image for {} signature(s)...", profile.groups.len());
        let signatures: Vec<_> = profile.groups.iter().map(|g| &g.signature).collect();
        let scan = scan_image(image, &signatures, &self.config.scan_options())?;
        self.config.match_policy.validate(&scan)?;

        let mut groups = Vec::with_capacity(profile.groups.len());
        for (group, matches) in profile.groups.iter().zip(&scan.matches) {
            groups.push(classify_group(image, group, &matches.offsets)?);
        }

        let overall = overall_status(&groups);
        for group in &groups {
            info!(
                "{}: {} ({} match(es))",
                group.display_name,
                group.status,
                group.matches.len()
            );
        }
        if overall == PatchStatus::Partial {
            warn!("Patch state is partial across groups");
        }

        Ok(Inspection {
            version,
            profile: profile.name.clone(),
            bytes_scanned: scan.bytes_scanned,
            groups,
            overall,
        })
    }

    /// Apply `request` to an image described by `inspection`.
    ///
    /// Not atomic: on a write failure, writes made before it remain on disk.
    /// Inspect again to learn the resulting state.
    pub fn apply<H: ImageHandle>(
        &self,
        image: &mut H,
        inspection: &Inspection,
        request: &PatchRequest,
    ) -> Result<PatchReport> {
        let profile = profile_for(&self.profiles, inspection.version)
            .ok_or(Error::UnsupportedVersion(inspection.version))?;

        for id in request.named_groups() {
            if profile.group(id).is_none() {
                return Err(Error::UnknownGroup(id.to_string()));
            }
        }

        let mut targets = Vec::new();
        for group in &profile.groups {
            let Some(direction) = request.operation(&group.id).direction() else {
                continue;
            };
            let state = inspection
                .group(&group.id)
                .ok_or_else(|| Error::UnknownGroup(group.id.clone()))?;

            info!("{} {} patch...", direction, group.display_name);
            targets.push(PatchTarget {
                group,
                state,
                direction,
            });
        }

        apply_patches(image, &targets, self.config.allow_ambiguous)
    }

    /// Inspect, apply `request` if it writes anything, then inspect again
    pub fn run<H: ImageHandle>(&self, image: &mut H, request: &PatchRequest) -> Result<RunOutcome> {
        let before = self.inspect(image)?;

        if !request.is_mutating() {
            return Ok(RunOutcome {
                before,
                report: None,
                after: None,
            });
        }

        let report = self.apply(image, &before, request)?;
        let after = self.inspect(image)?;
        Ok(RunOutcome {
            before,
            report: Some(report),
            after: Some(after),
        })
    }

    fn check_chunk_size(&self, profile: &PatchProfile) -> Result<()> {
        let longest = profile.max_signature_len();
        if self.config.chunk_size <= longest {
            return Err(Error::InvalidConfig(format!(
                "Chunk size {} must be larger than the longest signature ({} bytes)",
                self.config.chunk_size, longest
            )));
        }
        Ok(())
    }
}

impl Default for Patcher {
    fn default() -> Self {
        Self::new()
    }
}
