//! Payload writer
//!
//! Writes are NOT transactional. The first failed write stops the run and
//! everything written before it stays on disk; re-inspecting the image is the
//! only way to see the resulting state.

use serde::Serialize;
use tracing::{debug, info};

use crate::error::{Error, Result};
use crate::image::ImageHandle;
use crate::patch::{Direction, GroupState, PatchStatus, SiteState};
use crate::signature::PatchGroup;

/// One group to drive in one direction
#[derive(Debug, Clone, Copy)]
pub struct PatchTarget<'a> {
    pub group: &'a PatchGroup,
    pub state: &'a GroupState,
    pub direction: Direction,
}

/// Writes performed for one group
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GroupReport {
    pub id: String,
    pub direction: Direction,
    /// Patch sites that were rewritten
    pub written: Vec<u64>,
    /// Patch sites that already held the target payload
    pub skipped: Vec<u64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct PatchReport {
    pub groups: Vec<GroupReport>,
}

impl PatchReport {
    pub fn written_count(&self) -> usize {
        self.groups.iter().map(|g| g.written.len()).sum()
    }

    pub fn skipped_count(&self) -> usize {
        self.groups.iter().map(|g| g.skipped.len()).sum()
    }

    pub fn group(&self, id: &str) -> Option<&GroupReport> {
        self.groups.iter().find(|g| g.id == id)
    }
}

/// Refuse targets whose current state makes writing unsafe.
///
/// Runs before any write, so a refused run leaves the image untouched.
pub fn preflight(targets: &[PatchTarget], allow_ambiguous: bool) -> Result<()> {
    for target in targets {
        if let Some(record) = target.state.unrecognized().next()
            && let SiteState::Unrecognized { found } = record.state
        {
            return Err(Error::UnrecognizedPatchSite {
                address: record.site,
                found,
            });
        }

        if target.state.status == PatchStatus::Partial && !allow_ambiguous {
            return Err(Error::AmbiguousPatchState {
                group: target.group.id.clone(),
            });
        }
    }
    Ok(())
}

/// Write the payload for each target's direction at every match.
///
/// Matches are visited by index, and at each index every target with a match
/// at that index is written in order. Sites already holding the target
/// payload are skipped.
pub fn apply_patches<H: ImageHandle>(
    image: &mut H,
    targets: &[PatchTarget],
    allow_ambiguous: bool,
) -> Result<PatchReport> {
    preflight(targets, allow_ambiguous)?;

    let mut report = PatchReport {
        groups: targets
            .iter()
            .map(|t| GroupReport {
                id: t.group.id.clone(),
                direction: t.direction,
                written: Vec::new(),
                skipped: Vec::new(),
            })
            .collect(),
    };

    let rounds = targets
        .iter()
        .map(|t| t.state.matches.len())
        .max()
        .unwrap_or(0);
    let mut written = 0usize;

    for index in 0..rounds {
        for (target, group_report) in targets.iter().zip(report.groups.iter_mut()) {
            let Some(record) = target.state.matches.get(index) else {
                continue;
            };

            if record.state == target.direction.target_state() {
                debug!(
                    "'{}' site 0x{:X} already {:?}, skipping",
                    target.group.id, record.site, record.state
                );
                group_report.skipped.push(record.site);
                continue;
            }

            let payload = target.group.descriptor.payload(target.direction);
            image
                .write_at(record.site, &payload)
                .map_err(|source| Error::WriteFailed {
                    address: record.site,
                    written,
                    source,
                })?;

            debug!(
                "Wrote {:02X?} to 0x{:X} ('{}' {})",
                payload, record.site, target.group.id, target.direction
            );
            written += 1;
            group_report.written.push(record.site);
        }
    }

    if written > 0 {
        image
            .flush_image()
            .map_err(|source| Error::FlushFailed { written, source })?;
    }

    info!(
        "Patch run finished: {} site(s) written, {} already up to date",
        report.written_count(),
        report.skipped_count()
    );
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::image::MockImage;
    use crate::patch::classify_group;
    use crate::signature::{no_saving_group, permadeath_group};

    struct Fixture {
        image: MockImage,
        a: PatchGroup,
        b: PatchGroup,
        a_offsets: Vec<u64>,
        b_offsets: Vec<u64>,
    }

    /// Two A and two B matches, all vanilla
    fn fixture() -> Fixture {
        let a = permadeath_group();
        let b = no_saving_group();
        let a_offsets = vec![0x100, 0x900];
        let b_offsets = vec![0x500, 0xD00];

        let mut data = vec![0u8; 0x1000];
        for &offset in &a_offsets {
            let site = a.descriptor.site(offset) as usize;
            data[site..site + 4].copy_from_slice(&a.descriptor.unpatched);
        }
        for &offset in &b_offsets {
            let site = b.descriptor.site(offset) as usize;
            data[site..site + 4].copy_from_slice(&b.descriptor.unpatched);
        }

        Fixture {
            image: MockImage::new(data),
            a,
            b,
            a_offsets,
            b_offsets,
        }
    }

    fn classify(f: &mut Fixture) -> (GroupState, GroupState) {
        let a = classify_group(&mut f.image, &f.a, &f.a_offsets).unwrap();
        let b = classify_group(&mut f.image, &f.b, &f.b_offsets).unwrap();
        (a, b)
    }

    #[test]
    fn test_install_interleaves_groups_by_index() {
        let mut f = fixture();
        let (a_state, b_state) = classify(&mut f);
        let targets = [
            PatchTarget {
                group: &f.a,
                state: &a_state,
                direction: Direction::Install,
            },
            PatchTarget {
                group: &f.b,
                state: &b_state,
                direction: Direction::Install,
            },
        ];

        let report = apply_patches(&mut f.image, &targets, false).unwrap();
        assert_eq!(report.written_count(), 4);
        assert_eq!(f.image.write_log, vec![0x114, 0x50C, 0x914, 0xD0C]);
        assert_eq!(f.image.bytes_at(0x914, 4), &f.a.descriptor.patched);
        assert_eq!(f.image.bytes_at(0xD0C, 4), &f.b.descriptor.patched);
    }

    #[test]
    fn test_install_on_installed_is_noop() {
        let mut f = fixture();
        let (a_state, _) = classify(&mut f);
        let install = [PatchTarget {
            group: &f.a,
            state: &a_state,
            direction: Direction::Install,
        }];
        apply_patches(&mut f.image, &install, false).unwrap();

        let (a_state, _) = classify(&mut f);
        assert!(a_state.is_installed());
        f.image.write_log.clear();

        let install = [PatchTarget {
            group: &f.a,
            state: &a_state,
            direction: Direction::Install,
        }];
        let report = apply_patches(&mut f.image, &install, false).unwrap();
        assert_eq!(report.written_count(), 0);
        assert_eq!(report.group("permadeath").unwrap().skipped, vec![0x114, 0x914]);
        assert!(f.image.write_log.is_empty());
    }

    #[test]
    fn test_write_failure_halts_without_rollback() {
        let mut f = fixture();
        // Index 1 of group B: A@0 B@0 A@1 succeed, B@1 fails
        f.image = std::mem::take(&mut f.image).fail_write_at(0xD0C);
        let (a_state, b_state) = classify(&mut f);
        let targets = [
            PatchTarget {
                group: &f.a,
                state: &a_state,
                direction: Direction::Install,
            },
            PatchTarget {
                group: &f.b,
                state: &b_state,
                direction: Direction::Install,
            },
        ];

        let err = apply_patches(&mut f.image, &targets, false).unwrap_err();
        match err {
            Error::WriteFailed {
                address, written, ..
            } => {
                assert_eq!(address, 0xD0C);
                assert_eq!(written, 3);
            }
            other => panic!("unexpected error: {other}"),
        }

        // Earlier writes remain applied
        assert_eq!(f.image.bytes_at(0x114, 4), &f.a.descriptor.patched);
        assert_eq!(f.image.bytes_at(0x50C, 4), &f.b.descriptor.patched);
        assert_eq!(f.image.bytes_at(0x914, 4), &f.a.descriptor.patched);
        // The failing site is untouched
        assert_eq!(f.image.bytes_at(0xD0C, 4), &f.b.descriptor.unpatched);

        let (a_state, b_state) = classify(&mut f);
        assert_eq!(a_state.status, PatchStatus::Installed);
        assert_eq!(b_state.status, PatchStatus::Partial);
    }

    #[test]
    fn test_write_failure_stops_later_indices() {
        let mut f = fixture();
        // A@0 fails: nothing else is attempted
        f.image = std::mem::take(&mut f.image).fail_write_at(0x114);
        let (a_state, b_state) = classify(&mut f);
        let targets = [
            PatchTarget {
                group: &f.a,
                state: &a_state,
                direction: Direction::Install,
            },
            PatchTarget {
                group: &f.b,
                state: &b_state,
                direction: Direction::Install,
            },
        ];

        let err = apply_patches(&mut f.image, &targets, false).unwrap_err();
        assert_eq!(err.failing_address(), Some(0x114));
        assert!(f.image.write_log.is_empty());
        assert_eq!(f.image.bytes_at(0x50C, 4), &f.b.descriptor.unpatched);
        assert_eq!(f.image.bytes_at(0x914, 4), &f.a.descriptor.unpatched);
    }

    #[test]
    fn test_flush_failure_is_not_a_write_failure() {
        let mut f = fixture();
        f.image = std::mem::take(&mut f.image).fail_flush();
        let (a_state, _) = classify(&mut f);
        let install = [PatchTarget {
            group: &f.a,
            state: &a_state,
            direction: Direction::Install,
        }];

        let err = apply_patches(&mut f.image, &install, false).unwrap_err();
        assert!(matches!(err, Error::FlushFailed { written: 2, .. }));
        assert_eq!(err.failing_address(), None);
        assert_eq!(f.image.write_log, vec![0x114, 0x914]);
    }

    #[test]
    fn test_nothing_written_skips_flush() {
        let mut f = fixture();
        f.image = std::mem::take(&mut f.image).fail_flush();
        let (a_state, _) = classify(&mut f);
        let remove = [PatchTarget {
            group: &f.a,
            state: &a_state,
            direction: Direction::Remove,
        }];

        let report = apply_patches(&mut f.image, &remove, false).unwrap();
        assert_eq!(report.skipped_count(), 2);
    }

    #[test]
    fn test_unrecognized_site_refused_before_any_write() {
        let mut f = fixture();
        let (a_state, mut b_state) = classify(&mut f);
        b_state.matches[1].state = SiteState::Unrecognized { found: [0xAA; 4] };
        let targets = [
            PatchTarget {
                group: &f.a,
                state: &a_state,
                direction: Direction::Install,
            },
            PatchTarget {
                group: &f.b,
                state: &b_state,
                direction: Direction::Install,
            },
        ];

        // Refused even when ambiguous writes are allowed
        let err = apply_patches(&mut f.image, &targets, true).unwrap_err();
        assert!(matches!(
            err,
            Error::UnrecognizedPatchSite {
                address: 0xD0C,
                found: [0xAA, 0xAA, 0xAA, 0xAA]
            }
        ));
        assert!(f.image.write_log.is_empty());
    }

    #[test]
    fn test_partial_group_requires_allow_ambiguous() {
        let mut f = fixture();
        let (mut a_state, _) = classify(&mut f);
        a_state.matches[0].state = SiteState::Patched;
        a_state.status = PatchStatus::Partial;

        let remove = [PatchTarget {
            group: &f.a,
            state: &a_state,
            direction: Direction::Remove,
        }];
        let err = apply_patches(&mut f.image, &remove, false).unwrap_err();
        assert!(matches!(err, Error::AmbiguousPatchState { ref group } if group == "permadeath"));

        let report = apply_patches(&mut f.image, &remove, true).unwrap();
        let group = report.group("permadeath").unwrap();
        assert_eq!(group.written, vec![0x114]);
        assert_eq!(group.skipped, vec![0x914]);
    }
}
