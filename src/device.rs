//! Device and screen parameters, rebuilt lazily on the render thread.
//!
//! Lifecycle threads only flip flags through a [`ParamsNotifier`]. The render
//! thread calls [`DeviceState::ensure_ready`] once per frame, which rebuilds
//! the lens model, render target, compositor meshes, per-eye matrices and
//! field of view when any flag is set.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

use log::{debug, info, warn};

use crate::config::{RenderConfig, FOV_SENTINEL, UNREPORTED_FOV_DEGREES};
use crate::distortion::DistortionService;
use crate::gpu::{self, EyeTextureDescription, GraphicsBackend, TextureId, Viewport};
use crate::matrix::{degrees_to_radians, radians_to_degrees, Matrix4x4};
use crate::stimulus::Eye;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeviceStatus {
    /// Nothing built yet and nothing requested.
    Uninitialized,
    /// Render target, compositor and matrices match the current parameters.
    Ready,
    /// Screen size or viewer calibration changed since the last rebuild.
    Stale,
}

#[derive(Debug, Default)]
struct SharedParams {
    screen_changed: AtomicBool,
    device_changed: AtomicBool,
    screen_size: AtomicU64,
}

impl SharedParams {
    fn screen_size(&self) -> (u32, u32) {
        let packed = self.screen_size.load(Ordering::Acquire);
        ((packed >> 32) as u32, packed as u32)
    }

    fn is_dirty(&self) -> bool {
        self.screen_changed.load(Ordering::Acquire) || self.device_changed.load(Ordering::Acquire)
    }
}

/// Cheap, cloneable handle for other threads to report parameter changes.
#[derive(Debug, Clone)]
pub struct ParamsNotifier {
    shared: Arc<SharedParams>,
}

impl ParamsNotifier {
    pub fn notify_screen_size(&self, width: u32, height: u32) {
        let packed = (u64::from(width) << 32) | u64::from(height);
        self.shared.screen_size.store(packed, Ordering::Release);
        self.shared.screen_changed.store(true, Ordering::Release);
    }

    pub fn notify_resumed(&self) {
        self.shared.device_changed.store(true, Ordering::Release);
    }

    /// Called when the viewer calibration flow saved new parameters.
    pub fn notify_calibrated(&self) {
        self.shared.device_changed.store(true, Ordering::Release);
    }
}

/// Replaces every half-angle reported as exactly 45 degrees with the sentinel.
pub fn mark_unreported_fov(raw: [f32; 4]) -> [f32; 4] {
    let unreported = degrees_to_radians(UNREPORTED_FOV_DEGREES);
    raw.map(|angle| if angle == unreported { FOV_SENTINEL } else { angle })
}

pub struct DeviceState<D: DistortionService> {
    shared: Arc<SharedParams>,
    lens: Option<D::LensModel>,
    compositor: Option<D::Compositor>,
    target: Option<TextureId>,
    screen: (u32, u32),
    projection: [Matrix4x4; 2],
    eye_from_head: [Matrix4x4; 2],
    /// Right-eye half-angles in radians as reported.
    raw_fov: [f32; 4],
    /// Same, with unreported limits replaced by the sentinel.
    fov: [f32; 4],
    rebuilds: u64,
}

impl<D: DistortionService> DeviceState<D> {
    pub fn new() -> Self {
        let unreported = degrees_to_radians(UNREPORTED_FOV_DEGREES);
        Self {
            shared: Arc::new(SharedParams::default()),
            lens: None,
            compositor: None,
            target: None,
            screen: (0, 0),
            projection: [Matrix4x4::IDENTITY; 2],
            eye_from_head: [Matrix4x4::IDENTITY; 2],
            raw_fov: [unreported; 4],
            fov: mark_unreported_fov([unreported; 4]),
            rebuilds: 0,
        }
    }

    pub fn notifier(&self) -> ParamsNotifier {
        ParamsNotifier {
            shared: Arc::clone(&self.shared),
        }
    }

    pub fn status(&self) -> DeviceStatus {
        if self.shared.is_dirty() {
            DeviceStatus::Stale
        } else if self.lens.is_none() {
            DeviceStatus::Uninitialized
        } else {
            DeviceStatus::Ready
        }
    }

    /// Brings device-dependent resources up to date.
    ///
    /// Returns `false` when the frame must be skipped: no saved calibration
    /// yet, or no screen size reported. Flags are left set in that case so
    /// the next frame tries again.
    ///
    /// Uninitialized is handled like Stale: nothing is drawn until a rebuild
    /// has succeeded, so a frame never renders with unset matrices or
    /// without a render target.
    pub fn ensure_ready<B: GraphicsBackend>(
        &mut self,
        service: &mut D,
        backend: &mut B,
        config: &RenderConfig,
    ) -> bool {
        if self.status() == DeviceStatus::Ready {
            return true;
        }

        let Some(calibration) = service.saved_calibration().filter(|c| !c.is_empty()) else {
            warn!("No saved viewer calibration; skipping frame");
            return false;
        };
        if self.shared.screen_size().0 == 0 || self.shared.screen_size().1 == 0 {
            debug!("Screen size not reported yet; skipping frame");
            return false;
        }

        // Cleared before reading the size so a notification racing this
        // rebuild schedules another one.
        self.shared.screen_changed.swap(false, Ordering::AcqRel);
        self.shared.device_changed.swap(false, Ordering::AcqRel);
        let (width, height) = self.shared.screen_size();

        self.lens = None;
        let lens = service.create_lens_model(&calibration, width, height);

        self.target = Some(backend.allocate_target(width, height));

        self.compositor = None;
        let mut compositor = service.create_compositor();
        for eye in Eye::BOTH {
            let mesh = service.distortion_mesh(&lens, eye);
            service.set_mesh(&mut compositor, &mesh, eye);
        }

        for eye in Eye::BOTH {
            let i = eye.index();
            self.eye_from_head[i] = Matrix4x4::from_gl_array(&service.eye_from_head_matrix(&lens, eye));
            self.projection[i] = Matrix4x4::from_gl_array(&service.projection_matrix(
                &lens,
                eye,
                config.z_near,
                config.z_far,
            ));
        }

        gpu::check_error(backend, "device params");

        // The left eye mirrors the right one.
        self.raw_fov = service.field_of_view(&lens, Eye::Right);
        self.fov = mark_unreported_fov(self.raw_fov);

        self.lens = Some(lens);
        self.compositor = Some(compositor);
        self.screen = (width, height);
        self.rebuilds += 1;
        info!(
            "Device params rebuilt for {}x{} (rebuild #{})",
            width, height, self.rebuilds
        );
        true
    }

    /// Hands the finished side-by-side image to the compositor.
    pub fn present(&mut self, service: &mut D) {
        let (Some(compositor), Some(texture)) = (self.compositor.as_mut(), self.target) else {
            return;
        };
        let (width, height) = self.screen;
        service.render_to_display(
            compositor,
            0,
            Viewport::full(width, height),
            &EyeTextureDescription::for_eye(texture, Eye::Left),
            &EyeTextureDescription::for_eye(texture, Eye::Right),
        );
    }

    pub fn screen_size(&self) -> (u32, u32) {
        self.screen
    }

    pub fn projection(&self, eye: Eye) -> Matrix4x4 {
        self.projection[eye.index()]
    }

    pub fn eye_from_head(&self, eye: Eye) -> Matrix4x4 {
        self.eye_from_head[eye.index()]
    }

    pub fn render_target(&self) -> Option<TextureId> {
        self.target
    }

    /// Half-angles in radians, sentinel applied.
    pub fn field_of_view(&self) -> [f32; 4] {
        self.fov
    }

    /// Half-angles in radians as the device reported them.
    pub fn raw_field_of_view(&self) -> [f32; 4] {
        self.raw_fov
    }

    /// Half-angles in degrees; unreported limits stay at the sentinel.
    pub fn field_of_view_degrees(&self) -> [f32; 4] {
        self.fov.map(|angle| {
            if angle == FOV_SENTINEL {
                FOV_SENTINEL
            } else {
                radians_to_degrees(angle)
            }
        })
    }

    pub fn rebuild_count(&self) -> u64 {
        self.rebuilds
    }
}

impl<D: DistortionService> Default for DeviceState<D> {
    fn default() -> Self {
        Self::new()
    }
}
