//! Logical attachment slots and their registry.

use crate::render_graph::GraphError;

/// Identifier for a logical render-target slot.
///
/// `SlotId` is `Copy` and caller-chosen; it is only meaningful within the
/// `AttachmentTable` it was registered in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SlotId(pub u32);

/// Pixel format of an attachment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AttachmentFormat {
    Rgba8Unorm,
    Bgra8Unorm,
    Rgb10a2Unorm,
    Rgba16Unorm,
    Rgba16Float,
    Rgba32Float,
    Depth24PlusStencil8,
    Depth32Float,
}

impl AttachmentFormat {
    pub fn is_depth(&self) -> bool {
        matches!(
            self,
            AttachmentFormat::Depth24PlusStencil8 | AttachmentFormat::Depth32Float
        )
    }

    pub fn bytes_per_pixel(&self) -> u32 {
        match self {
            AttachmentFormat::Rgba8Unorm
            | AttachmentFormat::Bgra8Unorm
            | AttachmentFormat::Rgb10a2Unorm
            | AttachmentFormat::Depth24PlusStencil8
            | AttachmentFormat::Depth32Float => 4,
            AttachmentFormat::Rgba16Unorm | AttachmentFormat::Rgba16Float => 8,
            AttachmentFormat::Rgba32Float => 16,
        }
    }
}

/// Clear value applied before an attachment's first write in a frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ClearValue {
    Color([f32; 4]),
    DepthStencil { depth: f32, stencil: u32 },
}

impl ClearValue {
    pub const TRANSPARENT_BLACK: Self = ClearValue::Color([0.0, 0.0, 0.0, 0.0]);
    pub const FAR_DEPTH: Self = ClearValue::DepthStencil {
        depth: 1.0,
        stencil: 0,
    };
}

/// Whether an attachment's contents survive outside the pass graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StoragePolicy {
    /// Backed by real memory for the pipeline's lifetime.
    Persistent,
    /// Contents are only needed within the graph; the planner may let the
    /// executor keep the attachment tile-local with no backing allocation.
    Transient,
}

/// Description of one attachment slot.
#[derive(Debug, Clone, PartialEq)]
pub struct AttachmentDesc {
    pub name: String,
    pub format: AttachmentFormat,
    pub clear: Option<ClearValue>,
    pub storage: StoragePolicy,
    /// Contents are observed outside the graph (e.g. read back by a later
    /// frame), so the attachment can never be elided.
    pub externally_visible: bool,
}

impl AttachmentDesc {
    pub fn new(name: &str, format: AttachmentFormat, storage: StoragePolicy) -> Self {
        Self {
            name: name.to_string(),
            format,
            clear: None,
            storage,
            externally_visible: false,
        }
    }

    pub fn with_clear(mut self, clear: ClearValue) -> Self {
        self.clear = Some(clear);
        self
    }

    pub fn externally_visible(mut self) -> Self {
        self.externally_visible = true;
        self
    }
}

/// Registry of attachment slots.
///
/// Registration order is preserved and drives the deterministic ordering of
/// planner output. The table is pure data; no GPU resource is allocated
/// here; the executor allocates backing storage using this table as a
/// specification.
#[derive(Debug, Clone, Default)]
pub struct AttachmentTable {
    entries: Vec<(SlotId, AttachmentDesc)>,
}

impl AttachmentTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an attachment under `slot`.
    ///
    /// At most one attachment per slot id, and at most one depth-format
    /// attachment per table.
    pub fn register(&mut self, slot: SlotId, desc: AttachmentDesc) -> Result<(), GraphError> {
        if self.contains(slot) {
            return Err(GraphError::DuplicateSlot(slot));
        }
        if desc.format.is_depth() {
            if let Some(existing) = self.depth_slot() {
                return Err(GraphError::DuplicateDepth { existing });
            }
        }
        self.entries.push((slot, desc));
        Ok(())
    }

    /// Look up the attachment registered under `slot`.
    pub fn get(&self, slot: SlotId) -> Result<&AttachmentDesc, GraphError> {
        self.entries
            .iter()
            .find(|(s, _)| *s == slot)
            .map(|(_, desc)| desc)
            .ok_or(GraphError::UnknownSlot(slot))
    }

    pub fn contains(&self, slot: SlotId) -> bool {
        self.entries.iter().any(|(s, _)| *s == slot)
    }

    /// The slot holding the depth attachment, if one is registered.
    pub fn depth_slot(&self) -> Option<SlotId> {
        self.entries
            .iter()
            .find(|(_, desc)| desc.format.is_depth())
            .map(|(slot, _)| *slot)
    }

    /// Iterate slots in registration order.
    pub fn iter(&self) -> impl Iterator<Item = (SlotId, &AttachmentDesc)> {
        self.entries.iter().map(|(slot, desc)| (*slot, desc))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_register_get_roundtrip() {
        let mut table = AttachmentTable::new();
        let desc = AttachmentDesc::new("albedo", AttachmentFormat::Rgba8Unorm, StoragePolicy::Persistent)
            .with_clear(ClearValue::TRANSPARENT_BLACK);
        table.register(SlotId(3), desc.clone()).unwrap();

        let fetched = table.get(SlotId(3)).unwrap();
        assert_eq!(*fetched, desc);
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn test_duplicate_slot_rejected() {
        let mut table = AttachmentTable::new();
        table
            .register(
                SlotId(0),
                AttachmentDesc::new("a", AttachmentFormat::Rgba8Unorm, StoragePolicy::Transient),
            )
            .unwrap();
        let err = table
            .register(
                SlotId(0),
                AttachmentDesc::new("b", AttachmentFormat::Rgba16Float, StoragePolicy::Transient),
            )
            .unwrap_err();
        assert_eq!(err, GraphError::DuplicateSlot(SlotId(0)));
    }

    #[test]
    fn test_unknown_slot() {
        let table = AttachmentTable::new();
        assert_eq!(
            table.get(SlotId(7)).unwrap_err(),
            GraphError::UnknownSlot(SlotId(7))
        );
    }

    #[test]
    fn test_depth_slot_is_unique() {
        let mut table = AttachmentTable::new();
        table
            .register(
                SlotId(0),
                AttachmentDesc::new(
                    "depth",
                    AttachmentFormat::Depth24PlusStencil8,
                    StoragePolicy::Persistent,
                ),
            )
            .unwrap();
        let err = table
            .register(
                SlotId(1),
                AttachmentDesc::new(
                    "shadow_depth",
                    AttachmentFormat::Depth32Float,
                    StoragePolicy::Persistent,
                ),
            )
            .unwrap_err();
        assert_eq!(err, GraphError::DuplicateDepth { existing: SlotId(0) });
        assert_eq!(table.depth_slot(), Some(SlotId(0)));
    }

    #[test]
    fn test_format_classification() {
        assert!(AttachmentFormat::Depth32Float.is_depth());
        assert!(!AttachmentFormat::Rgb10a2Unorm.is_depth());
        assert_eq!(AttachmentFormat::Rgba16Float.bytes_per_pixel(), 8);
        assert_eq!(AttachmentFormat::Rgba32Float.bytes_per_pixel(), 16);
    }
}
