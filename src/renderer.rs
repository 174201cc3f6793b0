//! Stereo frame renderer
//!
//! Draws background, fixation target and stimulus into the left and right
//! halves of an off-screen target, then hands the result to the lens
//! distortion compositor.

use log::{debug, info};

use crate::config::RenderConfig;
use crate::device::{DeviceState, DeviceStatus, ParamsNotifier};
use crate::distortion::DistortionService;
use crate::gpu::{self, GraphicsBackend, Viewport};
use crate::matrix::{deg_of_view_to_length, degrees_to_radians, Matrix4x4};
use crate::mesh::ShapeKind;
use crate::shape::Shape;
use crate::stimulus::{Eye, FrameSpec, Slot, StimulusSpec};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameOutcome {
    /// Both eyes drawn and handed to the compositor.
    Presented,
    /// Nothing drawn: graphics not set up, or device parameters unavailable.
    Skipped,
}

/// One shape per [`ShapeKind`], built once when the surface is created.
pub struct ShapeLibrary<B: GraphicsBackend> {
    shapes: Vec<Shape<B>>,
}

impl<B: GraphicsBackend> ShapeLibrary<B> {
    pub fn build(backend: &mut B) -> Self {
        let slots = backend.attribute_slots();
        let mut shapes = Vec::with_capacity(ShapeKind::ALL.len());
        for kind in ShapeKind::ALL {
            shapes.push(Shape::initialize(backend, slots, kind));
        }
        Self { shapes }
    }

    pub fn get(&self, kind: ShapeKind) -> &Shape<B> {
        let index = ShapeKind::ALL
            .iter()
            .position(|&k| k == kind)
            .unwrap_or(0);
        &self.shapes[index]
    }
}

/// Shape currently bound to each slot. Several slots may share one shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Selection {
    pub background: ShapeKind,
    pub fixation: ShapeKind,
    pub stimulus: ShapeKind,
}

impl Default for Selection {
    fn default() -> Self {
        Self {
            background: ShapeKind::Square,
            fixation: ShapeKind::None,
            stimulus: ShapeKind::None,
        }
    }
}

impl Selection {
    pub fn kind(&self, slot: Slot) -> ShapeKind {
        match slot {
            Slot::Background => self.background,
            Slot::Fixation => self.fixation,
            Slot::Stimulus => self.stimulus,
        }
    }
}

pub fn slot_distance(slot: Slot, config: &RenderConfig) -> f32 {
    match slot {
        Slot::Background => config.background_distance,
        Slot::Fixation => config.fixation_distance,
        Slot::Stimulus => config.stimulus_distance,
    }
}

/// Model matrix for one slot.
///
/// Angles in `spec` are degrees of visual angle, converted to scene units at
/// the slot's viewing distance. The background ignores `spec` geometry and is
/// sized from the larger of the first two field-of-view half-angles
/// (`fov`, radians, unreported limits already at the sentinel).
pub fn model_matrix(slot: Slot, spec: &StimulusSpec, fov: [f32; 4], config: &RenderConfig) -> Matrix4x4 {
    let distance = slot_distance(slot, config);
    match slot {
        Slot::Background => {
            let extent = deg_of_view_to_length(distance, fov[0].max(fov[1]));
            Matrix4x4::affine(extent, extent, 0.0, [0.0, 0.0, distance])
        }
        Slot::Fixation | Slot::Stimulus => {
            let to_length = |deg: f32| deg_of_view_to_length(distance, degrees_to_radians(deg));
            Matrix4x4::affine(
                to_length(spec.size[0]),
                to_length(spec.size[1]),
                degrees_to_radians(spec.rotation),
                [to_length(spec.center[0]), to_length(spec.center[1]), distance],
            )
        }
    }
}

/// Render context owned by the render thread.
pub struct StereoRenderer<B: GraphicsBackend, D: DistortionService> {
    backend: B,
    service: D,
    device: DeviceState<D>,
    config: RenderConfig,
    shapes: Option<ShapeLibrary<B>>,
    selection: Selection,
    frames_presented: u64,
}

impl<B: GraphicsBackend, D: DistortionService> StereoRenderer<B, D> {
    pub fn new(backend: B, service: D) -> Self {
        Self::with_config(backend, service, RenderConfig::default())
    }

    pub fn with_config(backend: B, service: D, config: RenderConfig) -> Self {
        Self {
            backend,
            service,
            device: DeviceState::new(),
            config,
            shapes: None,
            selection: Selection::default(),
            frames_presented: 0,
        }
    }

    /// Handle for lifecycle threads (screen size, resume, calibration done).
    pub fn notifier(&self) -> ParamsNotifier {
        self.device.notifier()
    }

    /// Builds every shape. Call once the graphics context exists.
    pub fn on_surface_created(&mut self) {
        self.shapes = Some(ShapeLibrary::build(&mut self.backend));
        self.selection = Selection::default();
        gpu::check_error(&mut self.backend, "surface created");
        info!("Stimulus shapes initialized");
    }

    pub fn set_screen_params(&mut self, width: u32, height: u32) {
        info!("Screen params {}x{}", width, height);
        self.device.notifier().notify_screen_size(width, height);
    }

    /// Viewer parameters may have changed while paused. Starts the
    /// calibration flow when none is saved.
    pub fn on_resume(&mut self) {
        self.device.notifier().notify_resumed();
        let calibrated = self
            .service
            .saved_calibration()
            .is_some_and(|c| !c.is_empty());
        if !calibrated {
            info!("No viewer calibration saved; starting calibration flow");
            self.service.trigger_calibration_flow();
        }
    }

    pub fn on_pause(&mut self) {
        debug!("Paused");
    }

    pub fn switch_viewer(&mut self) {
        self.service.trigger_calibration_flow();
    }

    pub fn draw_frame(&mut self, frame: &FrameSpec) -> FrameOutcome {
        let Some(shapes) = self.shapes.as_ref() else {
            debug!("Surface not created; skipping frame");
            return FrameOutcome::Skipped;
        };
        if !self
            .device
            .ensure_ready(&mut self.service, &mut self.backend, &self.config)
        {
            return FrameOutcome::Skipped;
        }

        self.selection.fixation = frame.fixation.kind;
        self.selection.stimulus = frame.stimulus.kind;

        self.backend.begin_frame(self.config.clear_color);
        let (width, height) = self.device.screen_size();
        let fov = self.device.field_of_view();

        for eye in Eye::BOTH {
            self.backend.set_viewport(Viewport::for_eye(eye, width, height));
            let projection = self.device.projection(eye);
            for slot in Slot::PAINT_ORDER {
                let spec = frame.slot(slot);
                if !spec.eye.includes(eye) {
                    continue;
                }
                let model = model_matrix(slot, spec, fov, &self.config);
                let mvp = projection * model;
                self.backend.set_mvp(&mvp.to_gl_array());
                let shape = shapes.get(self.selection.kind(slot));
                shape.ready(&mut self.backend, spec.luminance, spec.color);
                shape.draw(&mut self.backend);
                gpu::check_error(&mut self.backend, slot.label());
            }
        }

        self.device.present(&mut self.service);
        self.frames_presented += 1;
        FrameOutcome::Presented
    }

    /// Half-angles in degrees, `-1` where the viewer reports no limit.
    pub fn field_of_view_degrees(&self) -> [f32; 4] {
        self.device.field_of_view_degrees()
    }

    pub fn device_status(&self) -> DeviceStatus {
        self.device.status()
    }

    pub fn device(&self) -> &DeviceState<D> {
        &self.device
    }

    pub fn selection(&self) -> Selection {
        self.selection
    }

    pub fn config(&self) -> &RenderConfig {
        &self.config
    }

    pub fn frames_presented(&self) -> u64 {
        self.frames_presented
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn backend_mut(&mut self) -> &mut B {
        &mut self.backend
    }

    pub fn service(&self) -> &D {
        &self.service
    }

    pub fn service_mut(&mut self) -> &mut D {
        &mut self.service
    }
}
