//! Subpass declarations and the pass graph.

use std::collections::HashSet;

use crate::render_graph::attachment::{AttachmentTable, SlotId, StoragePolicy};
use crate::render_graph::GraphError;

/// Tag identifying what a subpass renders.
///
/// The executor matches this against renderable material variants, so an
/// unknown tag is impossible by construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PassTag {
    /// Geometry into the G-buffer targets.
    GBuffer,
    /// Fullscreen lighting from the G-buffer.
    Lighting,
    /// HDR to LDR resolve into the present target.
    Tonemap,
    /// Background/skybox draw into the present target.
    Skybox,
}

/// Declaration of a single subpass: which slots it writes, which it reads,
/// and whether depth is bound read-only.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubpassDesc {
    pub tag: PassTag,
    pub write_slots: Vec<SlotId>,
    pub read_slots: Vec<SlotId>,
    pub depth_read_only: bool,
}

impl SubpassDesc {
    pub fn new(tag: PassTag) -> Self {
        Self {
            tag,
            write_slots: Vec::new(),
            read_slots: Vec::new(),
            depth_read_only: false,
        }
    }

    pub fn writes(mut self, slots: &[SlotId]) -> Self {
        self.write_slots.extend_from_slice(slots);
        self
    }

    pub fn reads(mut self, slots: &[SlotId]) -> Self {
        self.read_slots.extend_from_slice(slots);
        self
    }

    /// Depth may be read but must not be written during this subpass.
    pub fn depth_read_only(mut self) -> Self {
        self.depth_read_only = true;
        self
    }
}

/// A validated subpass inside a graph.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Subpass {
    order_index: usize,
    desc: SubpassDesc,
}

impl Subpass {
    pub fn order_index(&self) -> usize {
        self.order_index
    }

    pub fn desc(&self) -> &SubpassDesc {
        &self.desc
    }

    pub fn tag(&self) -> PassTag {
        self.desc.tag
    }

    pub fn writes_slot(&self, slot: SlotId) -> bool {
        self.desc.write_slots.contains(&slot)
    }

    pub fn reads_slot(&self, slot: SlotId) -> bool {
        self.desc.read_slots.contains(&slot)
    }
}

/// Ordered sequence of subpasses bound to an attachment table and, once
/// finalized, to a present target.
///
/// Declaration order is execution order. Dependencies are expressed only
/// through same-graph read-after-write on attachment slots and are validated
/// as subpasses are added, so a malformed pipeline configuration fails at
/// build time, never mid-frame.
#[derive(Debug, Clone)]
pub struct PassGraph {
    attachments: AttachmentTable,
    subpasses: Vec<Subpass>,
    external_inputs: HashSet<SlotId>,
    present_slot: Option<SlotId>,
}

impl PassGraph {
    pub fn new(attachments: AttachmentTable) -> Self {
        Self {
            attachments,
            subpasses: Vec::new(),
            external_inputs: HashSet::new(),
            present_slot: None,
        }
    }

    pub fn attachments(&self) -> &AttachmentTable {
        &self.attachments
    }

    pub fn subpasses(&self) -> &[Subpass] {
        &self.subpasses
    }

    /// The present target, set by `finalize`.
    pub fn present_slot(&self) -> Option<SlotId> {
        self.present_slot
    }

    pub fn is_finalized(&self) -> bool {
        self.present_slot.is_some()
    }

    /// Flag a slot as externally pre-populated, allowing subpasses to read it
    /// without a prior writer in this graph.
    pub fn mark_external(&mut self, slot: SlotId) -> Result<(), GraphError> {
        if self.is_finalized() {
            return Err(GraphError::GraphFinalized);
        }
        if !self.attachments.contains(slot) {
            return Err(GraphError::UnknownSlot(slot));
        }
        self.external_inputs.insert(slot);
        Ok(())
    }

    /// Append a subpass; its `order_index` is the current graph length.
    ///
    /// A read slot is resolved if a strictly earlier subpass writes it, if it
    /// is the depth slot (populated by the depth-test/clear step itself), or
    /// if it was marked external.
    pub fn add_subpass(&mut self, desc: SubpassDesc) -> Result<usize, GraphError> {
        if self.is_finalized() {
            return Err(GraphError::GraphFinalized);
        }
        for &slot in desc.write_slots.iter().chain(desc.read_slots.iter()) {
            if !self.attachments.contains(slot) {
                return Err(GraphError::UnknownSlot(slot));
            }
        }
        for &slot in &desc.read_slots {
            if desc.write_slots.contains(&slot) {
                return Err(GraphError::InvalidFeedback(slot));
            }
        }
        let depth_slot = self.attachments.depth_slot();
        for &slot in &desc.read_slots {
            let resolved = self.written_by_earlier_subpass(slot)
                || depth_slot == Some(slot)
                || self.external_inputs.contains(&slot);
            if !resolved {
                return Err(GraphError::UnresolvedRead(slot));
            }
        }

        let order_index = self.subpasses.len();
        log::debug!(
            "subpass {} ({:?}): {} writes, {} reads",
            order_index,
            desc.tag,
            desc.write_slots.len(),
            desc.read_slots.len()
        );
        self.subpasses.push(Subpass { order_index, desc });
        Ok(order_index)
    }

    /// Freeze the graph with `present_slot` as the final present target.
    ///
    /// The present target must be written by at least one subpass and must be
    /// persistent. After success, all mutation fails with `GraphFinalized`.
    pub fn finalize(&mut self, present_slot: SlotId) -> Result<(), GraphError> {
        if self.is_finalized() {
            return Err(GraphError::GraphFinalized);
        }
        let desc = self.attachments.get(present_slot)?;
        if desc.storage == StoragePolicy::Transient {
            return Err(GraphError::PresentTargetTransient(present_slot));
        }
        if !self.subpasses.iter().any(|s| s.writes_slot(present_slot)) {
            return Err(GraphError::PresentTargetNotWritten(present_slot));
        }
        self.present_slot = Some(present_slot);
        Ok(())
    }

    fn written_by_earlier_subpass(&self, slot: SlotId) -> bool {
        self.subpasses.iter().any(|s| s.writes_slot(slot))
    }
}
