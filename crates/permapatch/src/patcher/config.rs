use serde::Serialize;

use crate::scan::{BoundaryPolicy, DEFAULT_CHUNK_SIZE, MatchPolicy, ScanOptions};

/// Configuration for a [`Patcher`](super::Patcher)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PatcherConfig {
    /// Size of each streaming read
    pub chunk_size: usize,
    /// Match-count bounds and missing-signature handling
    pub match_policy: MatchPolicy,
    /// Handling of matches split across two chunk reads
    pub boundary_policy: BoundaryPolicy,
    /// Whether groups in partial state may be written
    pub allow_ambiguous: bool,
}

impl Default for PatcherConfig {
    fn default() -> Self {
        Self {
            chunk_size: DEFAULT_CHUNK_SIZE,
            match_policy: MatchPolicy::default(),
            boundary_policy: BoundaryPolicy::default(),
            allow_ambiguous: false,
        }
    }
}

impl PatcherConfig {
    /// Create a new configuration builder
    pub fn builder() -> PatcherConfigBuilder {
        PatcherConfigBuilder::default()
    }

    pub fn scan_options(&self) -> ScanOptions {
        ScanOptions {
            chunk_size: self.chunk_size,
            boundary: self.boundary_policy,
            max_matches: self.match_policy.max_matches,
        }
    }
}

/// Builder for PatcherConfig
#[derive(Debug, Clone, Default)]
pub struct PatcherConfigBuilder {
    chunk_size: Option<usize>,
    match_policy: Option<MatchPolicy>,
    boundary_policy: Option<BoundaryPolicy>,
    allow_ambiguous: Option<bool>,
}

impl PatcherConfigBuilder {
    pub fn chunk_size(mut self, size: usize) -> Self {
        self.chunk_size = Some(size);
        self
    }

    pub fn match_policy(mut self, policy: MatchPolicy) -> Self {
        self.match_policy = Some(policy);
        self
    }

    pub fn boundary_policy(mut self, policy: BoundaryPolicy) -> Self {
        self.boundary_policy = Some(policy);
        self
    }

    /// Allow writing groups whose sites are mixed patched/unpatched
    pub fn allow_ambiguous(mut self, allow: bool) -> Self {
        self.allow_ambiguous = Some(allow);
        self
    }

    /// Build the configuration
    pub fn build(self) -> PatcherConfig {
        let default = PatcherConfig::default();
        PatcherConfig {
            chunk_size: self.chunk_size.unwrap_or(default.chunk_size),
            match_policy: self.match_policy.unwrap_or(default.match_policy),
            boundary_policy: self.boundary_policy.unwrap_or(default.boundary_policy),
            allow_ambiguous: self.allow_ambiguous.unwrap_or(default.allow_ambiguous),
        }
    }
}
