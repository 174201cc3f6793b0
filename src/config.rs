//! Scene constants and the tunable render configuration.

/// Background sits farthest away.
pub const BACKGROUND_DISTANCE: f32 = 50.0;
/// Fixation target is nearest so it is never occluded by the stimulus.
pub const FIXATION_DISTANCE: f32 = 40.0;
/// Stimulus sits just behind the fixation target.
pub const STIMULUS_DISTANCE: f32 = 45.0;

pub const Z_NEAR: f32 = 1.0;
pub const Z_FAR: f32 = 50.0;

/// Half-angle (degrees) the distortion service reports when the viewer
/// profile carries no real limit.
pub const UNREPORTED_FOV_DEGREES: f32 = 45.0;
/// Value stored in place of an unreported half-angle.
pub const FOV_SENTINEL: f32 = -1.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RenderConfig {
    pub background_distance: f32,
    pub fixation_distance: f32,
    pub stimulus_distance: f32,
    pub z_near: f32,
    pub z_far: f32,
    /// RGBA clear colour of the off-screen target.
    pub clear_color: [f64; 4],
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            background_distance: BACKGROUND_DISTANCE,
            fixation_distance: FIXATION_DISTANCE,
            stimulus_distance: STIMULUS_DISTANCE,
            z_near: Z_NEAR,
            z_far: Z_FAR,
            clear_color: [0.0, 0.0, 0.0, 1.0],
        }
    }
}
