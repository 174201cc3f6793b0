//! Procedural meshes for the stimulus primitives.
//!
//! Every generator works in the normalized ±1 square and appends to the
//! buffers it is given. The affine model matrix scales the result to its
//! angular size at draw time.

use std::f32::consts::PI;

/// Perimeter segments for the circle and annulus.
pub const ROUND_SEGMENTS: u16 = 500;

/// Inner radius of the annulus relative to its outer radius.
pub const ANNULUS_INNER_RADIUS: f32 = 0.6;

/// Shape primitive selectable per stimulus slot.
///
/// Integer codes match the wire values used by perimetry clients: `-1` for
/// nothing, `0..=4` for the drawable primitives. Anything unrecognized maps to
/// [`ShapeKind::None`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ShapeKind {
    #[default]
    None,
    Circle,
    Square,
    Cross,
    Maltese,
    Annulus,
}

impl ShapeKind {
    pub const ALL: [ShapeKind; 6] = [
        ShapeKind::None,
        ShapeKind::Circle,
        ShapeKind::Square,
        ShapeKind::Cross,
        ShapeKind::Maltese,
        ShapeKind::Annulus,
    ];

    pub fn from_code(code: i32) -> Self {
        match code {
            0 => ShapeKind::Circle,
            1 => ShapeKind::Square,
            2 => ShapeKind::Cross,
            3 => ShapeKind::Maltese,
            4 => ShapeKind::Annulus,
            _ => ShapeKind::None,
        }
    }

    pub fn code(self) -> i32 {
        match self {
            ShapeKind::None => -1,
            ShapeKind::Circle => 0,
            ShapeKind::Square => 1,
            ShapeKind::Cross => 2,
            ShapeKind::Maltese => 3,
            ShapeKind::Annulus => 4,
        }
    }

    /// Lenient name lookup; unknown names give `None`, never an error.
    pub fn from_name(name: &str) -> Self {
        match name.trim().to_ascii_lowercase().as_str() {
            "circle" => ShapeKind::Circle,
            "square" => ShapeKind::Square,
            "cross" => ShapeKind::Cross,
            "maltese" => ShapeKind::Maltese,
            "annulus" => ShapeKind::Annulus,
            _ => ShapeKind::None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            ShapeKind::None => "none",
            ShapeKind::Circle => "circle",
            ShapeKind::Square => "square",
            ShapeKind::Cross => "cross",
            ShapeKind::Maltese => "maltese",
            ShapeKind::Annulus => "annulus",
        }
    }

    pub fn topology(self) -> Topology {
        match self {
            ShapeKind::Circle | ShapeKind::Square => Topology::Fan,
            ShapeKind::Annulus => Topology::Strip,
            ShapeKind::None | ShapeKind::Cross | ShapeKind::Maltese => Topology::Triangles,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Topology {
    Fan,
    Strip,
    #[default]
    Triangles,
}

/// Generated geometry for one primitive.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Mesh {
    /// xyz triples
    pub vertices: Vec<f32>,
    /// uv pairs, one per vertex
    pub uv: Vec<f32>,
    pub indices: Vec<u16>,
    pub topology: Topology,
}

impl Mesh {
    pub fn generate(kind: ShapeKind) -> Self {
        let mut mesh = Mesh {
            topology: kind.topology(),
            ..Default::default()
        };
        let (v, vt, ind) = (&mut mesh.vertices, &mut mesh.uv, &mut mesh.indices);
        match kind {
            ShapeKind::None => none(v, vt, ind),
            ShapeKind::Circle => circle(v, vt, ind),
            ShapeKind::Square => square(v, vt, ind),
            ShapeKind::Cross => cross(v, vt, ind),
            ShapeKind::Maltese => maltese_cross(v, vt, ind),
            ShapeKind::Annulus => annulus(v, vt, ind),
        }
        mesh
    }

    pub fn vertex_count(&self) -> usize {
        self.vertices.len() / 3
    }

    pub fn index_count(&self) -> u32 {
        self.indices.len() as u32
    }

    /// Index buffer suitable for an API without triangle fans.
    ///
    /// Fans are expanded to a discrete list around the first index; strips
    /// and lists are returned as is.
    pub fn list_indices(&self) -> Vec<u16> {
        match self.topology {
            Topology::Fan => {
                if self.indices.len() < 3 {
                    return Vec::new();
                }
                let hub = self.indices[0];
                self.indices[1..]
                    .windows(2)
                    .flat_map(|pair| [hub, pair[0], pair[1]])
                    .collect()
            }
            Topology::Strip | Topology::Triangles => self.indices.clone(),
        }
    }
}

/// Index of the next vertex appended to `v`.
///
/// Generators are meant for fresh buffers; appending `added` vertices must
/// keep every index inside the `u16` range.
fn base_index(v: &[f32], added: usize) -> u16 {
    let base = v.len() / 3;
    debug_assert!(
        base + added <= usize::from(u16::MAX) + 1,
        "mesh exceeds u16 index range ({} + {} vertices)",
        base,
        added
    );
    u16::try_from(base).unwrap_or(u16::MAX)
}

fn add_vertex(x: f32, y: f32, z: f32, v: &mut Vec<f32>) {
    v.extend_from_slice(&[x, y, z]);
}

fn add_uv(u: f32, w: f32, vt: &mut Vec<f32>) {
    vt.extend_from_slice(&[u, w]);
}

// UV is not sampled yet; keep one filler pair per vertex so the attribute
// stream always covers the vertex stream.
fn fill_uv(v: &[f32], vt: &mut Vec<f32>) {
    let missing = (v.len() / 3).saturating_sub(vt.len() / 2);
    for _ in 0..missing {
        add_uv(0.0, 0.0, vt);
    }
}

/// Zero-area placeholder drawn when a slot shows nothing.
pub fn none(v: &mut Vec<f32>, vt: &mut Vec<f32>, ind: &mut Vec<u16>) {
    let base = base_index(v, 3);
    for _ in 0..3 {
        add_vertex(0.0, 0.0, 0.0, v);
    }
    ind.extend_from_slice(&[base, base + 1, base + 2]);
    fill_uv(v, vt);
}

pub fn circle(v: &mut Vec<f32>, vt: &mut Vec<f32>, ind: &mut Vec<u16>) {
    let base = base_index(v, usize::from(ROUND_SEGMENTS) + 2);
    let n = ROUND_SEGMENTS;
    add_vertex(0.0, 0.0, 0.0, v);
    ind.push(base);
    for i in 0..=n {
        let theta = 2.0 * PI * f32::from(i) / f32::from(n);
        add_vertex(theta.cos(), theta.sin(), 0.0, v);
        ind.push(base + i + 1);
    }
    fill_uv(v, vt);
}

pub fn square(v: &mut Vec<f32>, vt: &mut Vec<f32>, ind: &mut Vec<u16>) {
    let base = base_index(v, 4);
    add_vertex(1.0, 1.0, 0.0, v);
    add_vertex(-1.0, 1.0, 0.0, v);
    add_vertex(-1.0, -1.0, 0.0, v);
    add_vertex(1.0, -1.0, 0.0, v);
    ind.extend([0, 1, 2, 2, 3].map(|i| base + i));
    fill_uv(v, vt);
}

pub fn cross(v: &mut Vec<f32>, vt: &mut Vec<f32>, ind: &mut Vec<u16>) {
    let base = base_index(v, 8);
    // horizontal bar
    add_vertex(1.00, 0.10, 0.0, v);
    add_vertex(-1.00, 0.10, 0.0, v);
    add_vertex(-1.00, -0.10, 0.0, v);
    add_vertex(1.00, -0.10, 0.0, v);
    // vertical bar
    add_vertex(-0.10, -1.00, 0.0, v);
    add_vertex(0.10, -1.00, 0.0, v);
    add_vertex(0.10, 1.00, 0.0, v);
    add_vertex(-0.10, 1.00, 0.0, v);
    push_quads(base, 2, ind);
    fill_uv(v, vt);
}

pub fn maltese_cross(v: &mut Vec<f32>, vt: &mut Vec<f32>, ind: &mut Vec<u16>) {
    let base = base_index(v, 16);
    // right arm
    add_vertex(1.00, 0.20, 0.0, v);
    add_vertex(0.00, 0.02, 0.0, v);
    add_vertex(0.00, -0.02, 0.0, v);
    add_vertex(1.00, -0.20, 0.0, v);
    // top arm
    add_vertex(-0.02, 0.00, 0.0, v);
    add_vertex(0.02, 0.00, 0.0, v);
    add_vertex(0.20, 1.00, 0.0, v);
    add_vertex(-0.20, 1.00, 0.0, v);
    // bottom arm
    add_vertex(0.20, -1.00, 0.0, v);
    add_vertex(0.02, 0.00, 0.0, v);
    add_vertex(-0.02, 0.00, 0.0, v);
    add_vertex(-0.20, -1.00, 0.0, v);
    // left arm
    add_vertex(-1.00, 0.20, 0.0, v);
    add_vertex(-1.00, -0.20, 0.0, v);
    add_vertex(0.00, -0.02, 0.0, v);
    add_vertex(0.00, 0.02, 0.0, v);
    push_quads(base, 4, ind);
    fill_uv(v, vt);
}

pub fn annulus(v: &mut Vec<f32>, vt: &mut Vec<f32>, ind: &mut Vec<u16>) {
    let base = base_index(v, 2 * (usize::from(ROUND_SEGMENTS) + 1));
    let n = f32::from(ROUND_SEGMENTS);
    let r = ANNULUS_INNER_RADIUS;
    for i in 0..=ROUND_SEGMENTS {
        let inner = 2.0 * PI * f32::from(i) / n;
        let outer = 2.0 * PI * (f32::from(i) + 0.5) / n;
        add_vertex(r * inner.cos(), r * inner.sin(), 0.0, v);
        add_vertex(outer.cos(), outer.sin(), 0.0, v);
        ind.push(base + 2 * i);
        ind.push(base + 2 * i + 1);
    }
    fill_uv(v, vt);
}

// Two triangles per quad of four consecutive vertices.
fn push_quads(base: u16, quads: u16, ind: &mut Vec<u16>) {
    for q in 0..quads {
        let o = base + 4 * q;
        ind.extend_from_slice(&[o, o + 1, o + 2, o, o + 2, o + 3]);
    }
}
