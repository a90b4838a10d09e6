//! Patch-state classification and payload application

mod apply;
mod state;

use serde::Serialize;
use strum::{Display, EnumString};

use crate::signature::Payload;

pub use apply::*;
pub use state::*;

/// Which payload a mutating operation writes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Display, EnumString)]
#[strum(serialize_all = "lowercase")]
pub enum Direction {
    /// Write the patched payload
    Install,
    /// Write the original (vanilla) payload
    Remove,
}

impl Direction {
    /// `true` installs, `false` removes
    pub fn from_enabled(enabled: bool) -> Self {
        if enabled { Self::Install } else { Self::Remove }
    }

    pub fn opposite(self) -> Self {
        match self {
            Self::Install => Self::Remove,
            Self::Remove => Self::Install,
        }
    }

    /// Site state a successful write in this direction produces
    pub fn target_state(self) -> SiteState {
        match self {
            Self::Install => SiteState::Patched,
            Self::Remove => SiteState::Unpatched,
        }
    }
}

/// Requested operation for one patch group
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Display, EnumString)]
#[strum(serialize_all = "lowercase")]
pub enum Operation {
    #[default]
    Check,
    Install,
    Remove,
}

impl Operation {
    pub fn direction(self) -> Option<Direction> {
        match self {
            Self::Check => None,
            Self::Install => Some(Direction::Install),
            Self::Remove => Some(Direction::Remove),
        }
    }
}

impl From<Direction> for Operation {
    fn from(direction: Direction) -> Self {
        match direction {
            Direction::Install => Self::Install,
            Direction::Remove => Self::Remove,
        }
    }
}

/// Per-group operations for one patcher run
///
/// Groups without an explicit entry get the default operation.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct PatchRequest {
    default: Operation,
    overrides: Vec<(String, Operation)>,
}

impl PatchRequest {
    /// Inspect only, touch nothing
    pub fn check() -> Self {
        Self::default()
    }

    /// Apply `direction` to every group
    pub fn all(direction: Direction) -> Self {
        Self {
            default: direction.into(),
            overrides: Vec::new(),
        }
    }

    /// Set the operation for a single group
    pub fn with(mut self, group: impl Into<String>, operation: impl Into<Operation>) -> Self {
        let group = group.into();
        let operation = operation.into();
        match self
            .overrides
            .iter_mut()
            .find(|(id, _)| id.eq_ignore_ascii_case(&group))
        {
            Some(entry) => entry.1 = operation,
            None => self.overrides.push((group, operation)),
        }
        self
    }

    pub fn operation(&self, group: &str) -> Operation {
        self.overrides
            .iter()
            .find(|(id, _)| id.eq_ignore_ascii_case(group))
            .map(|(_, operation)| *operation)
            .unwrap_or(self.default)
    }

    /// Group ids named explicitly in this request
    pub fn named_groups(&self) -> impl Iterator<Item = &str> {
        self.overrides.iter().map(|(id, _)| id.as_str())
    }

    pub fn is_mutating(&self) -> bool {
        self.default != Operation::Check
            || self
                .overrides
                .iter()
                .any(|(_, operation)| *operation != Operation::Check)
    }
}

/// Classification of the four bytes at one patch site
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum SiteState {
    Patched,
    Unpatched,
    /// Neither known payload; writing over it is refused
    Unrecognized { found: Payload },
}

/// Aggregated installation status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Display)]
#[serde(rename_all = "snake_case")]
pub enum PatchStatus {
    #[strum(serialize = "installed")]
    Installed,
    #[strum(serialize = "not installed")]
    NotInstalled,
    /// Mixed or inconsistent state; never resolved automatically
    #[strum(serialize = "partially installed, or image is invalid")]
    Partial,
}
