//! Pass graph infrastructure.
//!
//! The pass graph provides a declarative way to describe a deferred frame's
//! subpasses and their attachment dependencies. Planning over a finalized
//! graph computes:
//!
//! - Execution order (declaration order; dependencies are validated, not
//!   reordered)
//! - Which attachments must be materialized in memory and which may stay
//!   tile-local
//! - Attachment lifetimes and first-write clear values
//!
//! No GPU resource is allocated anywhere in this module; the graph is a
//! specification consumed by an external executor.

mod attachment;
mod planner;
mod subpass;

pub use attachment::{
    AttachmentDesc, AttachmentFormat, AttachmentTable, ClearValue, SlotId, StoragePolicy,
};
pub use planner::{AttachmentPlan, ExecutionPlan, PlannedBinding, PlannedSubpass, SlotLifetime};
pub use subpass::{PassGraph, PassTag, Subpass, SubpassDesc};

use thiserror::Error;

/// Errors raised while building or planning a pass graph.
///
/// All of these are structural-configuration errors: they surface at graph
/// build time, before any per-frame work.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum GraphError {
    /// The slot id is already registered.
    #[error("slot {0:?} is already registered")]
    DuplicateSlot(SlotId),
    /// A second depth-format attachment was registered.
    #[error("a depth attachment is already registered at {existing:?}")]
    DuplicateDepth { existing: SlotId },
    /// The slot id is not present in the attachment table.
    #[error("slot {0:?} is not registered")]
    UnknownSlot(SlotId),
    /// A subpass both reads and writes the same slot.
    #[error("subpass reads and writes slot {0:?}")]
    InvalidFeedback(SlotId),
    /// A read slot has no earlier writer and is not externally pre-populated.
    #[error("slot {0:?} is read but never written by an earlier subpass")]
    UnresolvedRead(SlotId),
    /// No subpass writes the designated present target.
    #[error("no subpass writes the present target {0:?}")]
    PresentTargetNotWritten(SlotId),
    /// The present target has transient storage.
    #[error("present target {0:?} has transient storage")]
    PresentTargetTransient(SlotId),
    /// The graph is finalized; mutation is no longer allowed.
    #[error("pass graph is already finalized")]
    GraphFinalized,
    /// Planning was requested on a graph that was never finalized.
    #[error("pass graph has not been finalized")]
    NotFinalized,
}
