//! A drawable primitive: generated mesh plus a one-texel colour texture.
//!
//! Luminance and colour reach the fragment stage through that texel, so every
//! [`Shape::ready`] is a texture upload.

use crate::gpu::{AttributeSlots, GraphicsBackend};
use crate::mesh::{Mesh, ShapeKind, Topology};

pub struct Shape<B: GraphicsBackend> {
    kind: ShapeKind,
    mesh: Mesh,
    slots: AttributeSlots,
    geometry: Option<B::Geometry>,
    texture: Option<B::Texture>,
}

impl<B: GraphicsBackend> Shape<B> {
    /// An empty shape that owns no GPU resources.
    pub fn new() -> Self {
        Self {
            kind: ShapeKind::None,
            mesh: Mesh::default(),
            slots: AttributeSlots::default(),
            geometry: None,
            texture: None,
        }
    }

    /// Generates the mesh for `kind` and allocates its texture.
    ///
    /// Must run on the render thread with a live backend.
    pub fn initialize(backend: &mut B, slots: AttributeSlots, kind: ShapeKind) -> Self {
        let mesh = Mesh::generate(kind);
        let texture = backend.create_texture();
        let geometry = backend.upload_mesh(&mesh, slots);
        Self {
            kind,
            mesh,
            slots,
            geometry: Some(geometry),
            texture: Some(texture),
        }
    }

    pub fn kind(&self) -> ShapeKind {
        self.kind
    }

    pub fn mesh(&self) -> &Mesh {
        &self.mesh
    }

    pub fn topology(&self) -> Topology {
        self.mesh.topology
    }

    pub fn slots(&self) -> AttributeSlots {
        self.slots
    }

    pub fn is_initialized(&self) -> bool {
        self.texture.is_some()
    }

    /// Writes `luminance * color` into the shape's texel.
    pub fn ready(&self, backend: &mut B, luminance: f32, color: [f32; 3]) {
        if let Some(texture) = &self.texture {
            backend.write_texel(texture, encode_texel(luminance, color));
        }
    }

    pub fn draw(&self, backend: &mut B) {
        if let (Some(geometry), Some(texture)) = (&self.geometry, &self.texture) {
            backend.draw_indexed(geometry, texture, self.mesh.topology);
        }
    }
}

impl<B: GraphicsBackend> Default for Shape<B> {
    fn default() -> Self {
        Self::new()
    }
}

/// `round(255 * luminance * color[c])` stored as an unsigned byte.
///
/// Out-of-range products wrap like an unchecked byte store; callers clamp
/// luminance and colour to [0, 1] beforehand.
pub fn encode_texel(luminance: f32, color: [f32; 3]) -> [u8; 3] {
    color.map(|c| (255.0 * luminance * c).round() as i32 as u8)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn half_red() {
        let [r, g, b] = encode_texel(0.5, [1.0, 0.0, 0.0]);
        assert!((127..=128).contains(&r));
        assert_eq!((g, b), (0, 0));
    }

    #[test]
    fn full_white() {
        assert_eq!(encode_texel(1.0, [1.0; 3]), [255; 3]);
    }

    #[test]
    fn overflow_wraps() {
        assert_eq!(encode_texel(2.0, [1.0, 0.0, 0.0])[0], (510 % 256) as u8);
    }
}
