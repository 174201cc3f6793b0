//! Stereo Perimetry - stimulus rendering for a phone-in-headset perimeter
//!
//! Draws a background, a fixation target and a single test stimulus for each
//! eye into one side-by-side off-screen target, then hands it to the viewer's
//! lens distortion compositor. Positions and sizes are given in degrees of
//! visual angle; luminance and colour are unit-range gains.
//!
//! The GPU sits behind [`gpu::GraphicsBackend`] ([`wgpu_backend::WgpuBackend`]
//! is the shipped implementation) and the headset SDK behind
//! [`distortion::DistortionService`].

pub mod config;
pub mod device;
pub mod distortion;
pub mod error;
pub mod gpu;
pub mod matrix;
pub mod mesh;
pub mod renderer;
pub mod sequence;
pub mod shape;
pub mod stimulus;
pub mod wgpu_backend;

pub use config::RenderConfig;
pub use device::{DeviceStatus, ParamsNotifier};
pub use distortion::DistortionService;
pub use error::{BackendError, SpecError};
pub use gpu::GraphicsBackend;
pub use matrix::Matrix4x4;
pub use mesh::{Mesh, ShapeKind, Topology};
pub use renderer::{FrameOutcome, StereoRenderer};
pub use sequence::{StimulusSequence, StimulusStep};
pub use stimulus::{Eye, EyeTarget, FrameSpec, Slot, StimulusSpec};
pub use wgpu_backend::WgpuBackend;

/// Routes `log` output to logcat on Android and to stderr elsewhere.
///
/// Safe to call more than once.
#[cfg(target_os = "android")]
pub fn init_logging() {
    android_logger::init_once(
        android_logger::Config::default()
            .with_max_level(log::LevelFilter::Info)
            .with_tag("StereoPerimetry"),
    );
    log::info!("=== Stereo Perimetry Starting ===");
}

/// Routes `log` output to logcat on Android and to stderr elsewhere.
///
/// Safe to call more than once. `RUST_LOG` overrides the default level.
#[cfg(not(target_os = "android"))]
pub fn init_logging() {
    let initialized = env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or("info"),
    )
    .try_init()
    .is_ok();
    if initialized {
        log::info!("=== Stereo Perimetry Starting ===");
    }
}
