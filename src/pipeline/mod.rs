//! Deferred pipeline assembly.
//!
//! Ships the canonical deferred layout as one configurable pass graph:
//! 1. G-buffer subpass: geometry into albedo, spec/rough, normal, emission
//! 2. Lighting subpass: writes emission, reads the G-buffer with depth
//!    bound read-only
//! 3. Tonemap subpass: resolves emission into the present target
//!
//! The intermediate G-buffer targets are transient, so a tiled executor can
//! keep them on-chip and never allocate backing memory for them.

use log::warn;

use crate::executor::{CullingProvider, PassExecutor};
use crate::frame::{FrameResourceBinder, IblMaps, TextureHandle};
use crate::render_graph::{
    AttachmentDesc, AttachmentFormat, AttachmentTable, ClearValue, ExecutionPlan, GraphError,
    PassGraph, PassTag, SlotId, StoragePolicy, SubpassDesc,
};
use crate::scene::Camera;
use crate::RenderPipeline;

/// Slots of the canonical deferred graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeferredSlots {
    pub depth: SlotId,
    pub albedo: SlotId,
    pub spec_rough: SlotId,
    pub normal: SlotId,
    pub emission: SlotId,
}

impl DeferredSlots {
    const fn standard() -> Self {
        Self {
            depth: SlotId(0),
            albedo: SlotId(1),
            spec_rough: SlotId(2),
            normal: SlotId(3),
            emission: SlotId(4),
        }
    }
}

/// Build and finalize the canonical deferred pass graph.
///
/// Albedo doubles as the present target; depth is persistent so later frames
/// or passes outside the graph can sample it. Everything else is transient.
pub fn build_deferred_graph() -> Result<(PassGraph, DeferredSlots), GraphError> {
    let slots = DeferredSlots::standard();

    let mut table = AttachmentTable::new();
    table.register(
        slots.depth,
        AttachmentDesc::new(
            "gdepth",
            AttachmentFormat::Depth24PlusStencil8,
            StoragePolicy::Persistent,
        )
        .with_clear(ClearValue::FAR_DEPTH),
    )?;
    table.register(
        slots.albedo,
        AttachmentDesc::new("albedo", AttachmentFormat::Rgba8Unorm, StoragePolicy::Persistent),
    )?;
    table.register(
        slots.spec_rough,
        AttachmentDesc::new("spec_rough", AttachmentFormat::Rgba8Unorm, StoragePolicy::Transient),
    )?;
    table.register(
        slots.normal,
        AttachmentDesc::new("normal", AttachmentFormat::Rgb10a2Unorm, StoragePolicy::Transient),
    )?;
    table.register(
        slots.emission,
        AttachmentDesc::new("emission", AttachmentFormat::Rgba16Float, StoragePolicy::Transient)
            .with_clear(ClearValue::TRANSPARENT_BLACK),
    )?;

    let mut graph = PassGraph::new(table);
    graph.add_subpass(SubpassDesc::new(PassTag::GBuffer).writes(&[
        slots.albedo,
        slots.spec_rough,
        slots.normal,
        slots.emission,
    ]))?;
    graph.add_subpass(
        SubpassDesc::new(PassTag::Lighting)
            .writes(&[slots.emission])
            .reads(&[slots.albedo, slots.spec_rough, slots.normal, slots.depth])
            .depth_read_only(),
    )?;
    graph.add_subpass(
        SubpassDesc::new(PassTag::Tonemap)
            .writes(&[slots.albedo])
            .reads(&[slots.emission]),
    )?;
    graph.finalize(slots.albedo)?;

    Ok((graph, slots))
}

/// Host-facing configuration accepted at pipeline construction.
///
/// All fields are optional; an absent IBL pair disables image-based lighting
/// contributions rather than failing. Frame pacing fields are forwarded to
/// the host, which owns presentation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PipelineConfig {
    pub diffuse_ibl: Option<TextureHandle>,
    pub specular_ibl: Option<TextureHandle>,
    pub brdf_lut: Option<TextureHandle>,
    /// `None` leaves the host's frame pacing untouched.
    pub target_frame_rate: Option<u32>,
    pub vsync: bool,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            diffuse_ibl: None,
            specular_ibl: None,
            brdf_lut: None,
            target_frame_rate: Some(60),
            vsync: false,
        }
    }
}

impl PipelineConfig {
    pub fn ibl(&self) -> IblMaps {
        IblMaps {
            diffuse: self.diffuse_ibl,
            specular: self.specular_ibl,
            brdf_lut: self.brdf_lut,
        }
    }
}

/// The deferred pipeline: canonical graph, cached execution plan, and one
/// frame binder per camera.
///
/// Construction fails closed: a malformed graph prevents startup entirely
/// rather than surfacing mid-frame.
#[derive(Debug)]
pub struct DeferredPipeline {
    graph: PassGraph,
    plan: ExecutionPlan,
    slots: DeferredSlots,
    config: PipelineConfig,
    binders: Vec<FrameResourceBinder>,
}

impl DeferredPipeline {
    pub fn new(config: PipelineConfig) -> Result<Self, GraphError> {
        let (graph, slots) = build_deferred_graph()?;
        let plan = graph.plan()?;
        Ok(Self {
            graph,
            plan,
            slots,
            config,
            binders: Vec::new(),
        })
    }

    pub fn graph(&self) -> &PassGraph {
        &self.graph
    }

    pub fn plan(&self) -> &ExecutionPlan {
        &self.plan
    }

    pub fn slots(&self) -> DeferredSlots {
        self.slots
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    fn binder_for(&mut self, camera_index: usize) -> &mut FrameResourceBinder {
        while self.binders.len() <= camera_index {
            let mut binder = FrameResourceBinder::new();
            binder.configure_ibl(self.config.ibl());
            self.binders.push(binder);
        }
        &mut self.binders[camera_index]
    }
}

impl RenderPipeline for DeferredPipeline {
    fn configure(&mut self, config: PipelineConfig) {
        self.config = config;
        let ibl = config.ibl();
        for binder in &mut self.binders {
            binder.configure_ibl(ibl);
        }
    }

    /// Render one frame for an ordered sequence of cameras.
    ///
    /// Cameras are processed strictly in sequence; each gets its own frame
    /// globals and one cull, reused across its subpasses. A camera with a
    /// singular view-projection degrades to the previous frame's matrices
    /// without aborting the remaining cameras.
    fn render_frame(
        &mut self,
        cameras: &[Camera],
        culling: &dyn CullingProvider,
        executor: &mut dyn PassExecutor,
    ) {
        for (camera_index, camera) in cameras.iter().enumerate() {
            let binder = self.binder_for(camera_index);
            let globals = match binder.begin(camera.view_matrix(), camera.projection_matrix()) {
                Ok(globals) => globals,
                Err(err) => {
                    warn!("camera {camera_index}: {err}, reusing previous frame's matrices");
                    binder.repeat_previous()
                }
            };

            let visible = culling.cull(camera);
            executor.begin_frame(&globals, &self.plan);
            for step in &self.plan.steps {
                executor.execute_subpass(step, &visible);
            }
            executor.end_frame();
        }
    }
}
