// Matrix algebra against glam as a reference implementation.

use glam::{Mat4, Vec3, Vec4};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use stereo_perimetry::matrix::{deg_of_view_to_length, degrees_to_radians, radians_to_degrees, Matrix4x4};

const EPS: f32 = 1e-3;

fn random_matrix(rng: &mut StdRng) -> Matrix4x4 {
    let mut values = [0.0f32; 16];
    for v in values.iter_mut() {
        *v = rng.gen_range(-10.0..10.0);
    }
    Matrix4x4::from_gl_array(&values)
}

fn to_glam(m: &Matrix4x4) -> Mat4 {
    Mat4::from_cols_array(&m.to_gl_array())
}

fn assert_close(a: &[f32], b: &[f32]) {
    for (x, y) in a.iter().zip(b) {
        assert!((x - y).abs() < EPS, "{:?} != {:?}", a, b);
    }
}

#[test]
fn identity_is_neutral_on_both_sides() {
    let mut rng = StdRng::seed_from_u64(0x5eed);
    for _ in 0..16 {
        let m = random_matrix(&mut rng);
        assert_eq!(m.multiply(&Matrix4x4::IDENTITY), m);
        assert_eq!(Matrix4x4::IDENTITY.multiply(&m), m);
    }
}

#[test]
fn multiply_matches_glam() {
    let mut rng = StdRng::seed_from_u64(42);
    for _ in 0..16 {
        let a = random_matrix(&mut rng);
        let b = random_matrix(&mut rng);
        let ours = (a * b).to_gl_array();
        let reference = (to_glam(&a) * to_glam(&b)).to_cols_array();
        assert_close(&ours, &reference);
    }
}

#[test]
fn apply_matches_glam() {
    let mut rng = StdRng::seed_from_u64(7);
    for _ in 0..16 {
        let m = random_matrix(&mut rng);
        let v = [
            rng.gen_range(-5.0..5.0),
            rng.gen_range(-5.0..5.0),
            rng.gen_range(-5.0..5.0),
            1.0,
        ];
        let reference = to_glam(&m) * Vec4::from_array(v);
        assert_close(&(m * v), &reference.to_array());
    }
}

#[test]
fn gl_array_round_trip_keeps_layout() {
    let values: [f32; 16] = std::array::from_fn(|i| i as f32);
    let m = Matrix4x4::from_gl_array(&values);
    assert_eq!(m.m[3], [12.0, 13.0, 14.0, 15.0]);
    assert_eq!(m.to_gl_array(), values);
}

#[test]
fn affine_is_translate_rotate_scale() {
    let theta = degrees_to_radians(30.0);
    let ours = Matrix4x4::affine(2.0, 3.0, theta, [1.0, -2.0, 45.0]);
    let reference = Mat4::from_translation(Vec3::new(1.0, -2.0, -45.0))
        * Mat4::from_rotation_z(-theta)
        * Mat4::from_scale(Vec3::new(2.0, 3.0, 1.0));
    assert_close(&ours.to_gl_array(), &reference.to_cols_array());
}

#[test]
fn affine_without_rotation_scales_then_moves() {
    let m = Matrix4x4::affine(2.0, 4.0, 0.0, [1.0, 1.0, 10.0]);
    assert_close(&m.apply([1.0, 1.0, 0.0, 1.0]), &[3.0, 5.0, -10.0, 1.0]);
}

#[test]
fn visual_angle_length_grows_with_angle() {
    let mut previous = deg_of_view_to_length(45.0, 0.0);
    for tenth in 1..900 {
        let length = deg_of_view_to_length(45.0, degrees_to_radians(tenth as f32 / 10.0));
        assert!(length > previous, "not increasing at {} degrees", tenth as f32 / 10.0);
        previous = length;
    }
}

#[test]
fn angle_conversions() {
    assert!((degrees_to_radians(180.0) - std::f32::consts::PI).abs() < 1e-6);
    assert!((radians_to_degrees(degrees_to_radians(37.5)) - 37.5).abs() < 1e-4);
    assert!((deg_of_view_to_length(45.0, degrees_to_radians(45.0)) - 45.0).abs() < 1e-3);
    assert_eq!(deg_of_view_to_length(45.0, 0.0), 0.0);
}
