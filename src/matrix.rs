//! 4x4 matrix algebra for stimulus placement.
//!
//! `m[c][r]` holds column `c`, row `r`, so a flat copy of `m` is the
//! column-major array GL-style APIs (and WGSL `mat4x4<f32>`) expect.
//! Products are written in that index form and must stay that way: the
//! projection matrices handed over by the distortion service are in the same
//! layout.

use std::ops::Mul;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Matrix4x4 {
    pub m: [[f32; 4]; 4],
}

impl Matrix4x4 {
    pub const IDENTITY: Self = Self {
        m: [
            [1.0, 0.0, 0.0, 0.0],
            [0.0, 1.0, 0.0, 0.0],
            [0.0, 0.0, 1.0, 0.0],
            [0.0, 0.0, 0.0, 1.0],
        ],
    };

    pub const ZERO: Self = Self { m: [[0.0; 4]; 4] };

    pub fn identity() -> Self {
        Self::IDENTITY
    }

    /// Reads a flat 16-float array as produced by the distortion service.
    pub fn from_gl_array(values: &[f32; 16]) -> Self {
        let mut m = [[0.0; 4]; 4];
        for (i, column) in m.iter_mut().enumerate() {
            column.copy_from_slice(&values[i * 4..i * 4 + 4]);
        }
        Self { m }
    }

    /// Flattens the matrix for uniform upload.
    pub fn to_gl_array(&self) -> [f32; 16] {
        let mut out = [0.0; 16];
        for (i, column) in self.m.iter().enumerate() {
            out[i * 4..i * 4 + 4].copy_from_slice(column);
        }
        out
    }

    /// `C[i][j] = Σ_k self[k][j] * right[i][k]`
    pub fn multiply(&self, right: &Self) -> Self {
        let mut result = Self::ZERO;
        for i in 0..4 {
            for j in 0..4 {
                let mut acc = 0.0;
                for k in 0..4 {
                    acc += self.m[k][j] * right.m[i][k];
                }
                result.m[i][j] = acc;
            }
        }
        result
    }

    /// `out[i] = Σ_k self[k][i] * v[k]`
    pub fn apply(&self, v: [f32; 4]) -> [f32; 4] {
        let mut out = [0.0; 4];
        for (i, slot) in out.iter_mut().enumerate() {
            let mut acc = 0.0;
            for k in 0..4 {
                acc += self.m[k][i] * v[k];
            }
            *slot = acc;
        }
        out
    }

    /// Scale and rotate in the X/Y plane, then translate.
    ///
    /// `theta` is in radians. The Z component of `translation` is negated:
    /// callers pass a positive viewing distance and the object lands in front
    /// of the camera along -Z.
    pub fn affine(sx: f32, sy: f32, theta: f32, translation: [f32; 3]) -> Self {
        let (sin, cos) = theta.sin_cos();
        Self {
            m: [
                [sx * cos, -sx * sin, 0.0, 0.0],
                [sy * sin, sy * cos, 0.0, 0.0],
                [0.0, 0.0, 1.0, 0.0],
                [translation[0], translation[1], -translation[2], 1.0],
            ],
        }
    }
}

impl Default for Matrix4x4 {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Mul for Matrix4x4 {
    type Output = Matrix4x4;

    fn mul(self, right: Matrix4x4) -> Matrix4x4 {
        self.multiply(&right)
    }
}

impl Mul<[f32; 4]> for Matrix4x4 {
    type Output = [f32; 4];

    fn mul(self, v: [f32; 4]) -> [f32; 4] {
        self.apply(v)
    }
}

pub fn degrees_to_radians(angle: f32) -> f32 {
    std::f32::consts::PI / 180.0 * angle
}

pub fn radians_to_degrees(angle: f32) -> f32 {
    180.0 / std::f32::consts::PI * angle
}

/// Linear extent subtended by `angle` (radians) at `distance` scene units.
pub fn deg_of_view_to_length(distance: f32, angle: f32) -> f32 {
    distance * angle.tan()
}
