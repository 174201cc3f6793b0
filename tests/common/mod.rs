// Recording doubles for the GPU and the headset SDK.
// Every call is logged so tests can assert on what a frame actually did.

#![allow(dead_code)]

use std::cell::RefCell;
use std::rc::Rc;

use stereo_perimetry::gpu::{
    AttributeSlots, EyeTextureDescription, GraphicsBackend, TextureId, Viewport,
};
use stereo_perimetry::mesh::{Mesh, Topology};
use stereo_perimetry::stimulus::Eye;
use stereo_perimetry::DistortionService;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DrawCall {
    pub texture: usize,
    pub texel: [u8; 3],
    pub topology: Topology,
    pub index_count: u32,
    pub viewport: Viewport,
    pub mvp: [f32; 16],
}

#[derive(Debug, Default)]
pub struct BackendLog {
    pub textures_created: usize,
    pub textures_released: usize,
    pub meshes_uploaded: usize,
    pub targets: Vec<(u32, u32)>,
    pub clears: usize,
    pub texels: Vec<[u8; 3]>,
    pub draws: Vec<DrawCall>,
}

pub struct MockTexture {
    id: usize,
    log: Rc<RefCell<BackendLog>>,
}

impl Drop for MockTexture {
    fn drop(&mut self) {
        self.log.borrow_mut().textures_released += 1;
    }
}

pub struct MockGeometry {
    pub index_count: u32,
}

pub struct MockBackend {
    pub log: Rc<RefCell<BackendLog>>,
    texels: Vec<[u8; 3]>,
    viewport: Viewport,
    mvp: [f32; 16],
    next_target: u64,
    pub pending_error: Option<String>,
}

impl MockBackend {
    pub fn new() -> Self {
        Self {
            log: Rc::new(RefCell::new(BackendLog::default())),
            texels: Vec::new(),
            viewport: Viewport::default(),
            mvp: [0.0; 16],
            next_target: 1,
            pending_error: None,
        }
    }
}

impl GraphicsBackend for MockBackend {
    type Texture = MockTexture;
    type Geometry = MockGeometry;

    fn attribute_slots(&self) -> AttributeSlots {
        AttributeSlots { position: 0, uv: 1 }
    }

    fn create_texture(&mut self) -> MockTexture {
        let id = self.texels.len();
        self.texels.push([0; 3]);
        self.log.borrow_mut().textures_created += 1;
        MockTexture {
            id,
            log: Rc::clone(&self.log),
        }
    }

    fn write_texel(&mut self, texture: &MockTexture, rgb: [u8; 3]) {
        self.texels[texture.id] = rgb;
        self.log.borrow_mut().texels.push(rgb);
    }

    fn upload_mesh(&mut self, mesh: &Mesh, _slots: AttributeSlots) -> MockGeometry {
        self.log.borrow_mut().meshes_uploaded += 1;
        MockGeometry {
            index_count: mesh.index_count(),
        }
    }

    fn allocate_target(&mut self, width: u32, height: u32) -> TextureId {
        self.log.borrow_mut().targets.push((width, height));
        let id = TextureId(self.next_target);
        self.next_target += 1;
        id
    }

    fn begin_frame(&mut self, _clear_color: [f64; 4]) {
        self.log.borrow_mut().clears += 1;
    }

    fn set_viewport(&mut self, viewport: Viewport) {
        self.viewport = viewport;
    }

    fn set_mvp(&mut self, mvp: &[f32; 16]) {
        self.mvp = *mvp;
    }

    fn draw_indexed(&mut self, geometry: &MockGeometry, texture: &MockTexture, topology: Topology) {
        let call = DrawCall {
            texture: texture.id,
            texel: self.texels[texture.id],
            topology,
            index_count: geometry.index_count,
            viewport: self.viewport,
            mvp: self.mvp,
        };
        self.log.borrow_mut().draws.push(call);
    }

    fn take_error(&mut self) -> Option<String> {
        self.pending_error.take()
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Presentation {
    pub target: u32,
    pub viewport: Viewport,
    pub left: EyeTextureDescription,
    pub right: EyeTextureDescription,
}

#[derive(Debug, Default)]
pub struct MockCompositor {
    pub meshes: Vec<Eye>,
}

pub struct MockService {
    pub calibration: Option<Vec<u8>>,
    pub projection: [[f32; 16]; 2],
    pub fov: [f32; 4],
    pub lens_models: Vec<(u32, u32)>,
    pub compositors: usize,
    pub presentations: Vec<Presentation>,
    pub calibration_flows: usize,
}

impl MockService {
    pub fn calibrated() -> Self {
        Self {
            calibration: Some(vec![0x08, 0x01, 0x12]),
            ..Self::uncalibrated()
        }
    }

    pub fn uncalibrated() -> Self {
        Self {
            calibration: None,
            projection: [perspective(1.0, 50.0); 2],
            fov: [0.7; 4],
            lens_models: Vec::new(),
            compositors: 0,
            presentations: Vec::new(),
            calibration_flows: 0,
        }
    }
}

impl DistortionService for MockService {
    type LensModel = (u32, u32);
    type DistortionMesh = Eye;
    type Compositor = MockCompositor;

    fn saved_calibration(&mut self) -> Option<Vec<u8>> {
        self.calibration.clone()
    }

    fn create_lens_model(&mut self, _calibration: &[u8], width: u32, height: u32) -> (u32, u32) {
        self.lens_models.push((width, height));
        (width, height)
    }

    fn distortion_mesh(&self, _lens: &(u32, u32), eye: Eye) -> Eye {
        eye
    }

    fn eye_from_head_matrix(&self, _lens: &(u32, u32), eye: Eye) -> [f32; 16] {
        let mut m = identity();
        m[12] = match eye {
            Eye::Left => 0.032,
            Eye::Right => -0.032,
        };
        m
    }

    fn projection_matrix(&self, _lens: &(u32, u32), eye: Eye, _z_near: f32, _z_far: f32) -> [f32; 16] {
        self.projection[eye.index()]
    }

    fn field_of_view(&self, _lens: &(u32, u32), _eye: Eye) -> [f32; 4] {
        self.fov
    }

    fn create_compositor(&mut self) -> MockCompositor {
        self.compositors += 1;
        MockCompositor::default()
    }

    fn set_mesh(&mut self, compositor: &mut MockCompositor, mesh: &Eye, _eye: Eye) {
        compositor.meshes.push(*mesh);
    }

    fn render_to_display(
        &mut self,
        compositor: &mut MockCompositor,
        target: u32,
        viewport: Viewport,
        left: &EyeTextureDescription,
        right: &EyeTextureDescription,
    ) {
        assert_eq!(compositor.meshes, vec![Eye::Left, Eye::Right]);
        self.presentations.push(Presentation {
            target,
            viewport,
            left: *left,
            right: *right,
        });
    }

    fn trigger_calibration_flow(&mut self) {
        self.calibration_flows += 1;
    }
}

pub fn identity() -> [f32; 16] {
    glam::Mat4::IDENTITY.to_cols_array()
}

/// GL-style perspective projection, 90 degree vertical field.
pub fn perspective(z_near: f32, z_far: f32) -> [f32; 16] {
    glam::Mat4::perspective_rh_gl(std::f32::consts::FRAC_PI_2, 1.0, z_near, z_far).to_cols_array()
}
