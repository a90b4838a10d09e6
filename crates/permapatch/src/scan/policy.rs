use serde::Serialize;
use strum::{Display, EnumString};

use crate::error::{Error, Result};
use crate::scan::ScanResult;

/// How matches that straddle two chunk reads are handled
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Display, EnumString)]
#[strum(serialize_all = "kebab-case")]
pub enum BoundaryPolicy {
    /// A match must lie entirely within one chunk read; straddling matches are missed
    ChunkLocal,
    /// The tail of each chunk is carried into the next so straddling matches are found
    #[default]
    Overlap,
}

/// Bounds on how many matches a well-formed image yields per signature
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct MatchPolicy {
    /// More matches than this for any signature means the image is invalid
    pub max_matches: usize,
    /// Whether every signature must match at least once
    pub require_every_group: bool,
}

impl MatchPolicy {
    /// At most two matches per signature and no signature may be missing
    pub const STRICT: Self = Self {
        max_matches: 2,
        require_every_group: true,
    };

    /// Up to ten matches per signature; a missing signature is reported as partial state
    pub const LENIENT: Self = Self {
        max_matches: 10,
        require_every_group: false,
    };

    pub fn new(max_matches: usize, require_every_group: bool) -> Self {
        Self {
            max_matches,
            require_every_group,
        }
    }

    /// Check a completed scan against this policy
    pub fn validate(&self, result: &ScanResult) -> Result<()> {
        if result.matches.iter().all(|m| m.offsets.is_empty()) {
            return Err(Error::NoMatches);
        }

        for matches in &result.matches {
            if matches.offsets.len() > self.max_matches {
                return Err(Error::TooManyMatches {
                    group: matches.name.clone(),
                    limit: self.max_matches,
                });
            }
            if self.require_every_group && matches.offsets.is_empty() {
                return Err(Error::MissingMatches {
                    group: matches.name.clone(),
                });
            }
        }

        Ok(())
    }
}

impl Default for MatchPolicy {
    fn default() -> Self {
        Self::STRICT
    }
}
