//! Prelude module for convenient imports
//!
//! ```ignore
//! use permapatch::prelude::*;
//! ```
//!
//! This brings the engine, its configuration, request and status types, and
//! the error type into scope.

// Engine
pub use crate::patcher::{Inspection, Patcher, PatcherConfig, RunOutcome};

// Error handling
pub use crate::error::{Error, Result};

// Requests and results
pub use crate::patch::{Direction, Operation, PatchReport, PatchRequest, PatchStatus, SiteState};

// Policies
pub use crate::scan::{BoundaryPolicy, MatchPolicy};

// Image access
pub use crate::image::{ImageHandle, ImageVersion};
