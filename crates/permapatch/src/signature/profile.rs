//! Built-in signature sets and the image versions they apply to

use serde::Serialize;

use super::{PatchDescriptor, PatchGroup, Signature};
use crate::image::ImageVersion;

/// Group id of the permadeath patch (signature A)
pub const PERMADEATH: &str = "permadeath";
/// Group id of the save-disabling patch (signature B)
pub const NO_SAVING: &str = "no-saving";

const PERMADEATH_SIGNATURE: [u8; 20] = [
    0x57, 0xE4, 0x06, 0x3E, 0x4B, 0xFC, 0x85, 0x59, 0xC0, 0x02, 0x85, 0x68, 0xFC, 0x1D, 0x00, 0x40,
    0x4C, 0x40, 0x13, 0x82,
];
const PERMADEATH_DELTA: u64 = 0x14;
const PERMADEATH_PATCHED: [u8; 4] = [0x60, 0x00, 0x00, 0x00];
const PERMADEATH_UNPATCHED: [u8; 4] = [0x40, 0x82, 0x00, 0x7C];

const NO_SAVING_SIGNATURE: [u8; 12] = [
    0x80, 0x83, 0x00, 0x58, 0x28, 0x00, 0x00, 0x10, 0x80, 0xA4, 0x00, 0xC4,
];
const NO_SAVING_DELTA: u64 = 0xC;
const NO_SAVING_PATCHED: [u8; 4] = [0x48, 0x00, 0x03, 0x6C];
const NO_SAVING_UNPATCHED: [u8; 4] = [0x41, 0x81, 0x03, 0x78];

/// Signature set bound to the image versions it is valid for
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PatchProfile {
    pub name: String,
    pub versions: Vec<ImageVersion>,
    pub groups: Vec<PatchGroup>,
}

impl PatchProfile {
    pub fn supports(&self, version: ImageVersion) -> bool {
        self.versions.contains(&version)
    }

    pub fn group(&self, id: &str) -> Option<&PatchGroup> {
        self.groups
            .iter()
            .find(|group| group.id.eq_ignore_ascii_case(id))
    }

    pub fn group_ids(&self) -> impl Iterator<Item = &str> {
        self.groups.iter().map(|group| group.id.as_str())
    }

    pub fn max_signature_len(&self) -> usize {
        self.groups
            .iter()
            .map(|group| group.signature.len())
            .max()
            .unwrap_or(0)
    }
}

pub fn permadeath_group() -> PatchGroup {
    PatchGroup::new(
        PERMADEATH,
        "Permadeath",
        Signature {
            name: PERMADEATH.to_string(),
            bytes: PERMADEATH_SIGNATURE.to_vec(),
        },
        PatchDescriptor {
            delta: PERMADEATH_DELTA,
            patched: PERMADEATH_PATCHED,
            unpatched: PERMADEATH_UNPATCHED,
        },
    )
    .with_labels("Enabled (Modded)", "Disabled (Vanilla)")
}

pub fn no_saving_group() -> PatchGroup {
    PatchGroup::new(
        NO_SAVING,
        "Saving",
        Signature {
            name: NO_SAVING.to_string(),
            bytes: NO_SAVING_SIGNATURE.to_vec(),
        },
        PatchDescriptor {
            delta: NO_SAVING_DELTA,
            patched: NO_SAVING_PATCHED,
            unpatched: NO_SAVING_UNPATCHED,
        },
    )
    .with_labels("Disabled (Modded)", "Enabled (Vanilla)")
}

/// All built-in profiles
pub fn builtin_profiles() -> Vec<PatchProfile> {
    vec![PatchProfile {
        name: "Metroid Prime (NTSC-U)".to_string(),
        versions: vec![ImageVersion::UsaV1_0, ImageVersion::UsaV1_1],
        groups: vec![permadeath_group(), no_saving_group()],
    }]
}

/// Find the profile covering `version`
pub fn profile_for(profiles: &[PatchProfile], version: ImageVersion) -> Option<&PatchProfile> {
    profiles.iter().find(|profile| profile.supports(version))
}

/// Versions covered by any of `profiles`
pub fn supported_versions(profiles: &[PatchProfile]) -> Vec<ImageVersion> {
    profiles
        .iter()
        .flat_map(|profile| profile.versions.iter().copied())
        .collect()
}
