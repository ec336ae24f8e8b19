//! Execution planning over a finalized pass graph.
//!
//! Planning is pure computation over the graph's data model: no GPU calls,
//! fully unit-testable without a graphics device. Planning the same graph
//! twice yields identical plans.

use crate::render_graph::attachment::{AttachmentFormat, ClearValue, SlotId, StoragePolicy};
use crate::render_graph::subpass::{PassGraph, PassTag};
use crate::render_graph::GraphError;

/// First and last subpass (by execution order) touching an attachment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SlotLifetime {
    pub first_use: usize,
    pub last_use: usize,
}

/// Planner verdict for one attachment slot.
#[derive(Debug, Clone, PartialEq)]
pub struct AttachmentPlan {
    pub slot: SlotId,
    pub format: AttachmentFormat,
    pub storage: StoragePolicy,
    /// The executor may keep this attachment in tile/local memory and never
    /// allocate full backing storage.
    pub elidable: bool,
    /// `None` when no subpass touches the slot.
    pub lifetime: Option<SlotLifetime>,
}

/// A write or read binding resolved against the attachment table.
#[derive(Debug, Clone, PartialEq)]
pub struct PlannedBinding {
    pub slot: SlotId,
    pub format: AttachmentFormat,
    /// Present on the slot's first write only; the executor clears the
    /// attachment to this value before that write.
    pub clear: Option<ClearValue>,
}

/// One ordered step of the execution plan.
#[derive(Debug, Clone, PartialEq)]
pub struct PlannedSubpass {
    pub subpass: usize,
    pub tag: PassTag,
    pub writes: Vec<PlannedBinding>,
    pub reads: Vec<PlannedBinding>,
    pub depth_read_only: bool,
}

/// Ordered execution plan consumable by an external renderer.
#[derive(Debug, Clone, PartialEq)]
pub struct ExecutionPlan {
    pub steps: Vec<PlannedSubpass>,
    /// Attachment verdicts in registration order.
    pub attachments: Vec<AttachmentPlan>,
    pub present_slot: SlotId,
}

impl ExecutionPlan {
    pub fn attachment(&self, slot: SlotId) -> Option<&AttachmentPlan> {
        self.attachments.iter().find(|a| a.slot == slot)
    }

    pub fn is_elidable(&self, slot: SlotId) -> bool {
        self.attachment(slot).map(|a| a.elidable).unwrap_or(false)
    }
}

impl PassGraph {
    /// Compute the execution plan for this graph.
    ///
    /// Subpasses execute in declared order; dependencies are expressed only
    /// through same-graph read-after-write, so no reordering is inferred. An
    /// attachment is elidable when its storage is transient and nothing
    /// outside the graph observes it; the present target is persistent by
    /// construction and therefore always materialized.
    pub fn plan(&self) -> Result<ExecutionPlan, GraphError> {
        let present_slot = self.present_slot().ok_or(GraphError::NotFinalized)?;

        let mut written: Vec<SlotId> = Vec::new();
        let mut steps = Vec::with_capacity(self.subpasses().len());
        for subpass in self.subpasses() {
            let desc = subpass.desc();
            let mut writes = Vec::with_capacity(desc.write_slots.len());
            for &slot in &desc.write_slots {
                let attachment = self.attachments().get(slot)?;
                let first_write = !written.contains(&slot);
                writes.push(PlannedBinding {
                    slot,
                    format: attachment.format,
                    clear: if first_write { attachment.clear } else { None },
                });
                if first_write {
                    written.push(slot);
                }
            }
            let mut reads = Vec::with_capacity(desc.read_slots.len());
            for &slot in &desc.read_slots {
                let attachment = self.attachments().get(slot)?;
                reads.push(PlannedBinding {
                    slot,
                    format: attachment.format,
                    clear: None,
                });
            }
            steps.push(PlannedSubpass {
                subpass: subpass.order_index(),
                tag: subpass.tag(),
                writes,
                reads,
                depth_read_only: desc.depth_read_only,
            });
        }

        let mut attachments = Vec::with_capacity(self.attachments().len());
        for (slot, desc) in self.attachments().iter() {
            let elidable = desc.storage == StoragePolicy::Transient && !desc.externally_visible;
            let lifetime = self.slot_lifetime(slot);
            log::debug!(
                "attachment {:?} ({}): elidable={}, lifetime={:?}",
                slot,
                desc.name,
                elidable,
                lifetime
            );
            attachments.push(AttachmentPlan {
                slot,
                format: desc.format,
                storage: desc.storage,
                elidable,
                lifetime,
            });
        }

        Ok(ExecutionPlan {
            steps,
            attachments,
            present_slot,
        })
    }

    fn slot_lifetime(&self, slot: SlotId) -> Option<SlotLifetime> {
        let mut lifetime: Option<SlotLifetime> = None;
        for subpass in self.subpasses() {
            if subpass.writes_slot(slot) || subpass.reads_slot(slot) {
                let order = subpass.order_index();
                lifetime = Some(match lifetime {
                    None => SlotLifetime {
                        first_use: order,
                        last_use: order,
                    },
                    Some(l) => SlotLifetime {
                        first_use: l.first_use,
                        last_use: order,
                    },
                });
            }
        }
        lifetime
    }
}
