//! Per-frame camera globals and image-based-lighting bindings.
//!
//! The binder resolves everything camera-dependent that subpasses consume:
//! the view-projection matrix and its inverse, the previous frame's matrices
//! for motion vectors, and the configured IBL maps. It owns no GPU state;
//! the resulting [`FrameGlobals`] value is handed to the executor by
//! reference for exactly one frame.

use bytemuck::{Pod, Zeroable};
use glam::Mat4;
use thiserror::Error;

/// Determinants below this are treated as singular.
const DET_EPSILON: f32 = 1e-12;

/// Opaque handle to an engine-owned texture resource.
///
/// Handles are issued by the host's asset provider; this crate never
/// dereferences them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TextureHandle(u64);

impl TextureHandle {
    pub fn from_raw(raw: u64) -> Self {
        Self(raw)
    }

    pub fn raw(self) -> u64 {
        self.0
    }
}

/// Errors raised in the per-frame path.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FrameError {
    /// The view-projection matrix cannot be inverted.
    #[error("view-projection matrix is singular")]
    SingularMatrix,
    /// A required engine resource was not supplied.
    #[error("missing resource: {0}")]
    MissingResource(String),
}

/// Image-based lighting inputs.
///
/// All maps are optional: an absent diffuse/specular pair disables the IBL
/// contribution rather than failing. Executors that require a complete set
/// call [`IblMaps::require`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct IblMaps {
    pub diffuse: Option<TextureHandle>,
    pub specular: Option<TextureHandle>,
    pub brdf_lut: Option<TextureHandle>,
}

impl IblMaps {
    /// Whether the IBL contribution is active.
    pub fn enabled(&self) -> bool {
        self.diffuse.is_some() && self.specular.is_some()
    }

    pub fn is_complete(&self) -> bool {
        self.enabled() && self.brdf_lut.is_some()
    }

    /// All three maps, or `MissingResource` naming the first absent one.
    pub fn require(&self) -> Result<(TextureHandle, TextureHandle, TextureHandle), FrameError> {
        let diffuse = self
            .diffuse
            .ok_or_else(|| FrameError::MissingResource("diffuse IBL cubemap".to_string()))?;
        let specular = self
            .specular
            .ok_or_else(|| FrameError::MissingResource("specular IBL cubemap".to_string()))?;
        let brdf_lut = self
            .brdf_lut
            .ok_or_else(|| FrameError::MissingResource("BRDF lookup table".to_string()))?;
        Ok((diffuse, specular, brdf_lut))
    }
}

/// Camera-dependent globals for one frame.
///
/// Recomputed per render call and discarded after submission; the Prev
/// matrices are carried into the next frame by the binder.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameGlobals {
    pub view_projection: Mat4,
    pub view_projection_inv: Mat4,
    pub view_projection_prev: Mat4,
    pub view_projection_inv_prev: Mat4,
    pub ibl: IblMaps,
}

impl FrameGlobals {
    /// Shader-visible matrix block for upload.
    pub fn to_gpu(&self) -> FrameGlobalsData {
        FrameGlobalsData {
            view_projection: self.view_projection,
            view_projection_inv: self.view_projection_inv,
            view_projection_prev: self.view_projection_prev,
            view_projection_inv_prev: self.view_projection_inv_prev,
        }
    }
}

/// GPU-layout matrix block consumed by subpass shaders.
#[repr(C)]
#[derive(Debug, Clone, Copy, Pod, Zeroable)]
pub struct FrameGlobalsData {
    pub view_projection: Mat4,
    pub view_projection_inv: Mat4,
    pub view_projection_prev: Mat4,
    pub view_projection_inv_prev: Mat4,
}

/// Resolves per-frame camera globals, carrying the previous frame's matrices
/// forward for motion vectors.
///
/// One binder serves one camera's frame sequence; cameras rendered in the
/// same frame each get their own binder so their Prev chains stay coherent.
#[derive(Debug, Clone)]
pub struct FrameResourceBinder {
    prev_view_projection: Mat4,
    prev_view_projection_inv: Mat4,
    ibl: IblMaps,
}

impl Default for FrameResourceBinder {
    fn default() -> Self {
        Self::new()
    }
}

impl FrameResourceBinder {
    /// Prev matrices are seeded to identity, so frame 0 motion vectors
    /// degenerate to zero instead of reading undefined data.
    pub fn new() -> Self {
        Self {
            prev_view_projection: Mat4::IDENTITY,
            prev_view_projection_inv: Mat4::IDENTITY,
            ibl: IblMaps::default(),
        }
    }

    /// Set the IBL maps; they persist until reconfigured.
    pub fn configure_ibl(&mut self, ibl: IblMaps) {
        self.ibl = ibl;
    }

    pub fn ibl(&self) -> IblMaps {
        self.ibl
    }

    /// Begin a frame for this binder's camera.
    ///
    /// Computes `view_projection = proj * view` (projection applied after
    /// view) and its inverse, shifting the previous frame's values into the
    /// Prev fields. On `SingularMatrix` the stored previous-frame state is
    /// left untouched so the caller can fall back to [`Self::repeat_previous`].
    pub fn begin(&mut self, view: Mat4, proj: Mat4) -> Result<FrameGlobals, FrameError> {
        let view_projection = proj * view;
        let det = view_projection.determinant();
        if !det.is_finite() || det.abs() < DET_EPSILON {
            return Err(FrameError::SingularMatrix);
        }
        let view_projection_inv = view_projection.inverse();

        let globals = FrameGlobals {
            view_projection,
            view_projection_inv,
            view_projection_prev: self.prev_view_projection,
            view_projection_inv_prev: self.prev_view_projection_inv,
            ibl: self.ibl,
        };
        self.prev_view_projection = view_projection;
        self.prev_view_projection_inv = view_projection_inv;
        Ok(globals)
    }

    /// Fallback for a degenerate camera: reuse the previous frame's matrices
    /// as this frame's current ones.
    pub fn repeat_previous(&self) -> FrameGlobals {
        FrameGlobals {
            view_projection: self.prev_view_projection,
            view_projection_inv: self.prev_view_projection_inv,
            view_projection_prev: self.prev_view_projection,
            view_projection_inv_prev: self.prev_view_projection_inv,
            ibl: self.ibl,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec3;

    const TOLERANCE: f32 = 1e-5;

    #[test]
    fn test_identity_composition() {
        let mut binder = FrameResourceBinder::new();
        let globals = binder.begin(Mat4::IDENTITY, Mat4::IDENTITY).unwrap();
        assert!(globals.view_projection.abs_diff_eq(Mat4::IDENTITY, TOLERANCE));
        assert!(globals.view_projection_inv.abs_diff_eq(Mat4::IDENTITY, TOLERANCE));
    }

    #[test]
    fn test_inverse_round_trips_to_identity() {
        let view = Mat4::look_at_rh(Vec3::new(3.0, 2.0, 5.0), Vec3::ZERO, Vec3::Y);
        let proj = Mat4::perspective_rh(std::f32::consts::FRAC_PI_4, 16.0 / 9.0, 0.1, 100.0);

        let mut binder = FrameResourceBinder::new();
        let globals = binder.begin(view, proj).unwrap();

        // A wide near/far range leaves the componentwise inverse product
        // inverse(V) * inverse(P) off by more than f32 can hold to a tight
        // absolute bound, so assert the round trip instead.
        let round_trip = globals.view_projection * globals.view_projection_inv;
        assert!(round_trip.abs_diff_eq(Mat4::IDENTITY, TOLERANCE));
    }

    #[test]
    fn test_prev_fields_carry_over() {
        let view_a = Mat4::look_at_rh(Vec3::new(0.0, 1.0, 4.0), Vec3::ZERO, Vec3::Y);
        let view_b = Mat4::look_at_rh(Vec3::new(1.0, 1.0, 4.0), Vec3::ZERO, Vec3::Y);
        let proj = Mat4::perspective_rh(std::f32::consts::FRAC_PI_4, 1.0, 0.1, 50.0);

        let mut binder = FrameResourceBinder::new();
        let first = binder.begin(view_a, proj).unwrap();
        assert!(first.view_projection_prev.abs_diff_eq(Mat4::IDENTITY, TOLERANCE));

        let second = binder.begin(view_b, proj).unwrap();
        assert_eq!(second.view_projection_prev, first.view_projection);
        assert_eq!(second.view_projection_inv_prev, first.view_projection_inv);
    }

    #[test]
    fn test_singular_matrix_leaves_prev_untouched() {
        let view = Mat4::look_at_rh(Vec3::new(0.0, 1.0, 4.0), Vec3::ZERO, Vec3::Y);
        let proj = Mat4::perspective_rh(std::f32::consts::FRAC_PI_4, 1.0, 0.1, 50.0);

        let mut binder = FrameResourceBinder::new();
        let good = binder.begin(view, proj).unwrap();

        let err = binder.begin(view, Mat4::ZERO).unwrap_err();
        assert_eq!(err, FrameError::SingularMatrix);

        let fallback = binder.repeat_previous();
        assert_eq!(fallback.view_projection, good.view_projection);
        assert_eq!(fallback.view_projection_inv, good.view_projection_inv);
    }

    #[test]
    fn test_ibl_require() {
        let mut ibl = IblMaps::default();
        assert!(!ibl.enabled());
        assert!(matches!(
            ibl.require(),
            Err(FrameError::MissingResource(name)) if name.contains("diffuse")
        ));

        ibl.diffuse = Some(TextureHandle::from_raw(1));
        ibl.specular = Some(TextureHandle::from_raw(2));
        assert!(ibl.enabled());
        assert!(!ibl.is_complete());

        ibl.brdf_lut = Some(TextureHandle::from_raw(3));
        assert!(ibl.is_complete());
        let (diffuse, specular, brdf_lut) = ibl.require().unwrap();
        assert_eq!(diffuse.raw(), 1);
        assert_eq!(specular.raw(), 2);
        assert_eq!(brdf_lut.raw(), 3);
    }

    #[test]
    fn test_ibl_carried_into_globals() {
        let mut binder = FrameResourceBinder::new();
        binder.configure_ibl(IblMaps {
            diffuse: Some(TextureHandle::from_raw(10)),
            specular: Some(TextureHandle::from_raw(11)),
            brdf_lut: None,
        });
        let globals = binder.begin(Mat4::IDENTITY, Mat4::IDENTITY).unwrap();
        assert!(globals.ibl.enabled());
        assert_eq!(globals.ibl.diffuse, Some(TextureHandle::from_raw(10)));
    }
}
