//! Interface to the head-mounted-display SDK.
//!
//! Lens distortion, device calibration storage and the final warp to the
//! panel all live outside this crate. The renderer only talks to them through
//! this trait.

use crate::gpu::{EyeTextureDescription, Viewport};
use crate::stimulus::Eye;

pub trait DistortionService {
    /// Lens model built from a calibration blob for a given screen.
    type LensModel;
    type DistortionMesh;
    /// Warps the side-by-side image onto the display.
    type Compositor;

    /// Saved viewer calibration, `None` when the viewer was never calibrated.
    fn saved_calibration(&mut self) -> Option<Vec<u8>>;

    fn create_lens_model(
        &mut self,
        calibration: &[u8],
        screen_width: u32,
        screen_height: u32,
    ) -> Self::LensModel;

    fn distortion_mesh(&self, lens: &Self::LensModel, eye: Eye) -> Self::DistortionMesh;

    fn eye_from_head_matrix(&self, lens: &Self::LensModel, eye: Eye) -> [f32; 16];

    fn projection_matrix(
        &self,
        lens: &Self::LensModel,
        eye: Eye,
        z_near: f32,
        z_far: f32,
    ) -> [f32; 16];

    /// Half-angles in radians.
    fn field_of_view(&self, lens: &Self::LensModel, eye: Eye) -> [f32; 4];

    fn create_compositor(&mut self) -> Self::Compositor;

    fn set_mesh(&mut self, compositor: &mut Self::Compositor, mesh: &Self::DistortionMesh, eye: Eye);

    fn render_to_display(
        &mut self,
        compositor: &mut Self::Compositor,
        target: u32,
        viewport: Viewport,
        left: &EyeTextureDescription,
        right: &EyeTextureDescription,
    );

    /// Presents the platform UI for scanning a new viewer profile.
    fn trigger_calibration_flow(&mut self);
}
