//! Boundary contracts consumed from the host engine.
//!
//! The planner computes; the host executes. These traits are the seam: an
//! engine integration implements them and drives a pipeline through
//! [`crate::RenderPipeline::render_frame`].

use std::collections::HashMap;

use crate::frame::{FrameError, FrameGlobals, TextureHandle};
use crate::render_graph::{ExecutionPlan, PlannedSubpass};
use crate::scene::Camera;

/// Opaque identifier of a renderable owned by the host scene.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RenderableId(pub u64);

/// Per-renderable property override applied without creating a new material
/// instance.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct PropertyBlock {
    /// Overrides the material base color for this renderable only.
    pub base_color: Option<[f32; 4]>,
}

impl PropertyBlock {
    pub fn with_base_color(color: [f32; 4]) -> Self {
        Self {
            base_color: Some(color),
        }
    }
}

/// Result of culling one camera, reused across all of that camera's
/// subpasses.
#[derive(Debug, Clone, Default)]
pub struct VisibleSet {
    pub renderables: Vec<RenderableId>,
    /// Renderables without an entry use their material values unchanged.
    /// Executors must not assume uniform per-material color across instances.
    pub overrides: HashMap<RenderableId, PropertyBlock>,
}

/// Supplies the visible-renderable set for a camera's frustum.
///
/// Called once per camera per frame; the result is shared by every subpass
/// referencing that camera.
pub trait CullingProvider {
    fn cull(&self, camera: &Camera) -> VisibleSet;
}

/// Supplies engine-owned resources by logical name.
pub trait AssetProvider {
    /// Look up a texture handle; fails with
    /// [`FrameError::MissingResource`] when the name resolves to nothing.
    fn texture(&self, name: &str) -> Result<TextureHandle, FrameError>;
}

/// Issues the actual GPU work for a planned frame.
///
/// Implementations must:
/// - allocate backing storage only for attachments the plan does not mark
///   elidable,
/// - clear each attachment to its binding's clear value before its first
///   write,
/// - restrict draws in each step to geometry matching the step's tag,
/// - not write depth in a step marked `depth_read_only`,
/// - release any transient resource handle on every exit path, including
///   early return on failure.
pub trait PassExecutor {
    fn begin_frame(&mut self, globals: &FrameGlobals, plan: &ExecutionPlan);
    fn execute_subpass(&mut self, step: &PlannedSubpass, visible: &VisibleSet);
    fn end_frame(&mut self);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_property_block_override() {
        let block = PropertyBlock::with_base_color([1.0, 0.5, 0.25, 1.0]);
        assert_eq!(block.base_color, Some([1.0, 0.5, 0.25, 1.0]));
        assert_eq!(PropertyBlock::default().base_color, None);
    }

    struct MapAssets(HashMap<String, TextureHandle>);

    impl AssetProvider for MapAssets {
        fn texture(&self, name: &str) -> Result<TextureHandle, FrameError> {
            self.0
                .get(name)
                .copied()
                .ok_or_else(|| FrameError::MissingResource(name.to_string()))
        }
    }

    #[test]
    fn test_asset_lookup_by_logical_name() {
        let mut assets = HashMap::new();
        assets.insert("brdf_lut".to_string(), TextureHandle::from_raw(42));
        let provider = MapAssets(assets);

        assert_eq!(
            provider.texture("brdf_lut").unwrap(),
            TextureHandle::from_raw(42)
        );
        assert_eq!(
            provider.texture("missing_map").unwrap_err(),
            FrameError::MissingResource("missing_map".to_string())
        );
    }

    #[test]
    fn test_visible_set_overrides_are_sparse() {
        let mut visible = VisibleSet::default();
        visible.renderables = vec![RenderableId(1), RenderableId(2)];
        visible
            .overrides
            .insert(RenderableId(2), PropertyBlock::with_base_color([0.0; 4]));

        assert!(visible.overrides.get(&RenderableId(1)).is_none());
        assert!(visible.overrides.get(&RenderableId(2)).is_some());
    }
}
