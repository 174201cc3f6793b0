//! The graphics capability the stimulus pipeline draws through.
//!
//! A backend owns every GPU object. Texture and geometry handles are RAII:
//! dropping one releases the underlying resource, so a [`crate::shape::Shape`]
//! frees its texture when it goes away.

use crate::mesh::{Mesh, Topology};
use crate::stimulus::Eye;

/// Vertex attribute locations resolved from the stimulus program.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct AttributeSlots {
    pub position: u32,
    pub uv: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Viewport {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl Viewport {
    pub fn full(width: u32, height: u32) -> Self {
        Self {
            x: 0,
            y: 0,
            width,
            height,
        }
    }

    /// Half of a side-by-side target: left eye at x = 0, right at width / 2.
    pub fn for_eye(eye: Eye, width: u32, height: u32) -> Self {
        let half = width / 2;
        let x = match eye {
            Eye::Left => 0,
            Eye::Right => half,
        };
        Self {
            x,
            y: 0,
            width: half,
            height,
        }
    }
}

/// Opaque id of the off-screen colour texture, as handed to the compositor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct TextureId(pub u64);

/// Region of the shared colour texture holding one eye's image.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct EyeTextureDescription {
    pub texture: TextureId,
    pub left_u: f32,
    pub right_u: f32,
    pub top_v: f32,
    pub bottom_v: f32,
}

impl EyeTextureDescription {
    pub fn for_eye(texture: TextureId, eye: Eye) -> Self {
        let (left_u, right_u) = match eye {
            Eye::Left => (0.0, 0.5),
            Eye::Right => (0.5, 1.0),
        };
        Self {
            texture,
            left_u,
            right_u,
            top_v: 1.0,
            bottom_v: 0.0,
        }
    }
}

pub trait GraphicsBackend {
    /// 1x1 colour texture, released on drop.
    type Texture;
    /// Uploaded vertex/uv/index buffers, released on drop.
    type Geometry;

    fn attribute_slots(&self) -> AttributeSlots;

    /// Allocates a 1x1 texture with clamp-to-edge wrapping and linear filtering.
    fn create_texture(&mut self) -> Self::Texture;

    /// Replaces the single texel of `texture`. Draws issued afterwards see the
    /// new value; draws issued before do not.
    fn write_texel(&mut self, texture: &Self::Texture, rgb: [u8; 3]);

    fn upload_mesh(&mut self, mesh: &Mesh, slots: AttributeSlots) -> Self::Geometry;

    /// Tears down the current colour + depth target (if any) and allocates a
    /// new one of the given size.
    fn allocate_target(&mut self, width: u32, height: u32) -> TextureId;

    /// Binds the render target and clears colour and depth.
    fn begin_frame(&mut self, clear_color: [f64; 4]);

    fn set_viewport(&mut self, viewport: Viewport);

    /// Column-major model-view-projection for the next draw.
    fn set_mvp(&mut self, mvp: &[f32; 16]);

    /// Draws every index uploaded with `geometry`.
    fn draw_indexed(&mut self, geometry: &Self::Geometry, texture: &Self::Texture, topology: Topology);

    /// Returns and clears the first error raised since the last call.
    fn take_error(&mut self) -> Option<String>;
}

/// Aborts the process if the backend has recorded an error.
///
/// A failed GPU call mid-frame leaves state that cannot be retried safely.
pub fn check_error<B: GraphicsBackend + ?Sized>(backend: &mut B, label: &str) {
    if let Some(error) = backend.take_error() {
        log::error!("GPU error @ {}: {}", label, error);
        std::process::abort();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn eye_viewports_split_the_target() {
        let left = Viewport::for_eye(Eye::Left, 1000, 800);
        let right = Viewport::for_eye(Eye::Right, 1000, 800);
        assert_eq!(left, Viewport { x: 0, y: 0, width: 500, height: 800 });
        assert_eq!(right, Viewport { x: 500, y: 0, width: 500, height: 800 });
    }

    #[test]
    fn eye_texture_halves() {
        let left = EyeTextureDescription::for_eye(TextureId(3), Eye::Left);
        let right = EyeTextureDescription::for_eye(TextureId(3), Eye::Right);
        assert_eq!((left.left_u, left.right_u), (0.0, 0.5));
        assert_eq!((right.left_u, right.right_u), (0.5, 1.0));
        assert_eq!((right.top_v, right.bottom_v), (1.0, 0.0));
    }
}
