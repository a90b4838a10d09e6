use serde::Serialize;
use tracing::{debug, warn};

use crate::error::Result;
use crate::image::ImageHandle;
use crate::patch::{PatchStatus, SiteState};
use crate::signature::{PAYLOAD_LEN, PatchGroup};

/// One signature occurrence and the state of its patch site
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct MatchRecord {
    /// Absolute offset of the signature match
    pub offset: u64,
    /// Absolute address of the patch site (`offset + delta`)
    pub site: u64,
    pub state: SiteState,
}

/// Classified matches of one patch group
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GroupState {
    pub id: String,
    pub display_name: String,
    pub matches: Vec<MatchRecord>,
    pub status: PatchStatus,
}

impl GroupState {
    pub fn patched_count(&self) -> usize {
        self.count(|state| state == SiteState::Patched)
    }

    pub fn unpatched_count(&self) -> usize {
        self.count(|state| state == SiteState::Unpatched)
    }

    /// Sites holding neither known payload
    pub fn unrecognized(&self) -> impl Iterator<Item = &MatchRecord> {
        self.matches
            .iter()
            .filter(|record| matches!(record.state, SiteState::Unrecognized { .. }))
    }

    pub fn is_installed(&self) -> bool {
        self.status == PatchStatus::Installed
    }

    fn count(&self, predicate: impl Fn(SiteState) -> bool) -> usize {
        self.matches
            .iter()
            .filter(|record| predicate(record.state))
            .count()
    }
}

/// Read and classify the patch site of every match of `group`
pub fn classify_group<H: ImageHandle>(
    image: &mut H,
    group: &PatchGroup,
    offsets: &[u64],
) -> Result<GroupState> {
    let mut matches = Vec::with_capacity(offsets.len());

    for &offset in offsets {
        let site = group.descriptor.site(offset);
        let found = image.read_array::<PAYLOAD_LEN>(site)?;
        let state = group.descriptor.classify(found);

        match state {
            SiteState::Unrecognized { found } => warn!(
                "'{}' patch site 0x{:X} holds unrecognized bytes {:02X?}",
                group.id, site, found
            ),
            _ => debug!("'{}' patch site 0x{:X}: {:?}", group.id, site, state),
        }

        matches.push(MatchRecord {
            offset,
            site,
            state,
        });
    }

    let status = group_status(&matches);
    Ok(GroupState {
        id: group.id.clone(),
        display_name: group.display_name.clone(),
        matches,
        status,
    })
}

/// Status of a single group
///
/// A group with no matches is `Partial`: the signature set is incomplete for
/// this image.
pub fn group_status(matches: &[MatchRecord]) -> PatchStatus {
    if matches.is_empty() {
        return PatchStatus::Partial;
    }
    if matches.iter().all(|m| m.state == SiteState::Patched) {
        return PatchStatus::Installed;
    }
    if matches.iter().all(|m| m.state == SiteState::Unpatched) {
        return PatchStatus::NotInstalled;
    }
    PatchStatus::Partial
}

/// Status across all groups
///
/// Unequal match counts between groups (including zero against nonzero)
/// are always `Partial`, whatever the individual sites hold.
pub fn overall_status(groups: &[GroupState]) -> PatchStatus {
    let Some(first) = groups.first() else {
        return PatchStatus::Partial;
    };
    if groups.iter().any(|g| g.matches.len() != first.matches.len()) {
        return PatchStatus::Partial;
    }

    let mut records = groups.iter().flat_map(|g| g.matches.iter());
    if first.matches.is_empty() {
        return PatchStatus::Partial;
    }
    if records.clone().all(|m| m.state == SiteState::Patched) {
        return PatchStatus::Installed;
    }
    if records.all(|m| m.state == SiteState::Unpatched) {
        return PatchStatus::NotInstalled;
    }
    PatchStatus::Partial
}
