//! Recoverable error types.
//!
//! Graphics-API failures during a frame are not represented here: those abort
//! the process via [`crate::gpu::check_error`].

use thiserror::Error;

/// Failure to bring up a GPU backend.
#[derive(Debug, Error)]
pub enum BackendError {
    #[error("no compatible GPU adapter found")]
    NoAdapter,
    #[error("failed to create GPU device: {0}")]
    RequestDevice(#[from] wgpu::RequestDeviceError),
}

/// A stimulus parameter outside its accepted range.
#[derive(Debug, Error, PartialEq)]
pub enum SpecError {
    #[error("{slot}: luminance {value} outside [0, 1]")]
    Luminance { slot: &'static str, value: f32 },
    #[error("{slot}: colour channel {channel} = {value} outside [0, 1]")]
    Color {
        slot: &'static str,
        channel: usize,
        value: f32,
    },
    #[error("{slot}: rotation {value} outside [0, 360)")]
    Rotation { slot: &'static str, value: f32 },
    #[error("{slot}: {field} is not finite")]
    NotFinite {
        slot: &'static str,
        field: &'static str,
    },
    #[error("unknown eye code {0}")]
    EyeCode(i32),
    #[error("stimulus sequence has no steps")]
    EmptySequence,
    #[error("stimulus duration must be positive")]
    ZeroDuration,
    #[error("response window {window_ms} ms must exceed stimulus duration {duration_ms} ms")]
    ResponseWindow { window_ms: u128, duration_ms: u128 },
    #[error("step {step} has zero duration")]
    ZeroStepDuration { step: usize },
}
