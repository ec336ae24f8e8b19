//! Deferred render pass graph planner.
//!
//! A pure planning core for deferred shading, independent of any native
//! graphics API:
//!
//! - **Attachment table**: registry of logical render-target slots with
//!   pixel format, clear policy, and persistent/transient storage policy
//! - **Pass graph**: ordered subpass declarations with validated
//!   read-after-write dependencies, frozen by `finalize`
//! - **Planner**: computes execution order, which attachments must be
//!   materialized in memory versus kept tile-local, lifetimes, and
//!   first-write clears
//! - **Frame resource binder**: per-camera view-projection matrices with
//!   previous-frame carry-over for motion vectors, plus IBL bindings
//!
//! No GPU calls are made anywhere in this crate. An external executor
//! implements the traits in [`executor`] and consumes the computed
//! [`ExecutionPlan`]; graph construction errors all surface at build time so
//! a malformed pipeline fails at startup, never mid-frame.

pub mod executor;
pub mod frame;
pub mod pipeline;
pub mod render_graph;
pub mod scene;

pub use executor::{
    AssetProvider, CullingProvider, PassExecutor, PropertyBlock, RenderableId, VisibleSet,
};
pub use frame::{
    FrameError, FrameGlobals, FrameGlobalsData, FrameResourceBinder, IblMaps, TextureHandle,
};
pub use pipeline::{build_deferred_graph, DeferredPipeline, DeferredSlots, PipelineConfig};
pub use render_graph::{
    AttachmentDesc, AttachmentFormat, AttachmentPlan, AttachmentTable, ClearValue, ExecutionPlan,
    GraphError, PassGraph, PassTag, PlannedBinding, PlannedSubpass, SlotId, SlotLifetime,
    StoragePolicy, Subpass, SubpassDesc,
};
pub use scene::{Camera, Projection};

/// Capability interface implemented by pipeline types and driven by the host
/// integration.
///
/// The host never subclasses anything here; it constructs a pipeline, feeds
/// it configuration, and hands it cameras plus its executor each frame.
pub trait RenderPipeline {
    /// Apply a new configuration. Takes effect from the next frame.
    fn configure(&mut self, config: PipelineConfig);

    /// Render one frame for an ordered sequence of cameras.
    ///
    /// Cameras are processed strictly in sequence; per-camera globals are
    /// passed to the executor by reference, never through process-wide
    /// mutable state.
    fn render_frame(
        &mut self,
        cameras: &[Camera],
        culling: &dyn CullingProvider,
        executor: &mut dyn PassExecutor,
    );
}
