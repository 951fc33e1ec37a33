// src/projector/visibility.rs
// Frustum-vs-camera visibility tests and reduced clip-plane derivation
// RELEVANT FILES: src/projector/frustum.rs, src/shadows/scheduler/collect.rs

use glam::Vec3;
use log::debug;

/// Upper bound on the plane count handed to the host's culling query.
pub const MAX_CULLING_PLANES: usize = 10;

/// A world-space plane in `dot(normal, p) + d = 0` form.
///
/// Points with `dot(normal, p) + d < 0` are outside; a distance of exactly
/// zero counts as inside.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Plane {
    pub normal: Vec3,
    pub d: f32,
}

impl Plane {
    pub fn new(normal: Vec3, d: f32) -> Self {
        Self { normal, d }
    }

    /// Plane through three points, normal along `cross(b - a, c - a)`.
    pub fn from_points(a: Vec3, b: Vec3, c: Vec3) -> Self {
        let normal = (b - a).cross(c - a).normalize_or_zero();
        Self {
            normal,
            d: -normal.dot(a),
        }
    }

    pub fn distance(&self, p: Vec3) -> f32 {
        self.normal.dot(p) + self.d
    }

    pub fn is_outside(&self, p: Vec3) -> bool {
        self.distance(p) < 0.0
    }

    fn flipped(self) -> Self {
        Self {
            normal: -self.normal,
            d: -self.d,
        }
    }
}

/// Vertex indices of the six frustum faces.
///
/// Corner layout: 0..4 near plane, 4..8 far plane, both wound
/// (-x,-y), (+x,-y), (+x,+y), (-x,+y) looking down the projection axis.
const FRUSTUM_FACES: [[usize; 4]; 6] = [
    [0, 1, 2, 3], // near
    [4, 5, 6, 7], // far
    [0, 3, 7, 4], // -x
    [1, 5, 6, 2], // +x
    [0, 4, 5, 1], // -y
    [3, 2, 6, 7], // +y
];

/// Per-vertex outside bitmask: bit i is set when the vertex lies outside
/// plane i.
pub fn vertex_outside_masks(vertices: &[Vec3; 8], planes: &[Plane]) -> [u32; 8] {
    debug_assert!(planes.len() <= 32, "plane count exceeds mask width");
    let mut masks = [0u32; 8];
    for (v, mask) in vertices.iter().zip(masks.iter_mut()) {
        for (i, plane) in planes.iter().enumerate() {
            if plane.is_outside(*v) {
                *mask |= 1 << i;
            }
        }
    }
    masks
}

/// A frustum is visible iff no single camera plane excludes all 8 vertices.
pub fn frustum_visible(vertices: &[Vec3; 8], planes: &[Plane]) -> bool {
    let masks = vertex_outside_masks(vertices, planes);
    masks.iter().fold(u32::MAX, |acc, m| acc & m) == 0
}

/// Derive the reduced clip-plane set for a visible projector frustum.
///
/// For each of the six local faces: when all four face vertices are inside
/// every camera plane the face contributes a single substituted plane
/// (inward-facing, so geometry beyond the face is culled); otherwise the
/// camera planes that exclude any face vertex are kept. The result is capped
/// at [`MAX_CULLING_PLANES`], substituted planes first.
pub fn reduced_culling_planes(vertices: &[Vec3; 8], planes: &[Plane]) -> Vec<Plane> {
    let masks = vertex_outside_masks(vertices, planes);
    let centroid = vertices.iter().copied().sum::<Vec3>() / 8.0;

    let mut substituted = Vec::new();
    let mut kept_mask = 0u32;

    for face in &FRUSTUM_FACES {
        let face_mask = face.iter().fold(0u32, |acc, &i| acc | masks[i]);
        if face_mask == 0 {
            let mut plane =
                Plane::from_points(vertices[face[0]], vertices[face[1]], vertices[face[2]]);
            if plane.distance(centroid) < 0.0 {
                plane = plane.flipped();
            }
            substituted.push(plane);
        } else {
            kept_mask |= face_mask;
        }
    }

    let mut result = substituted;
    for (i, plane) in planes.iter().enumerate() {
        if kept_mask & (1 << i) != 0 {
            result.push(*plane);
        }
    }

    if result.len() > MAX_CULLING_PLANES {
        debug!(
            "reduced culling planes truncated: {} -> {}",
            result.len(),
            MAX_CULLING_PLANES
        );
        result.truncate(MAX_CULLING_PLANES);
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unit_box() -> [Vec3; 8] {
        [
            Vec3::new(-1.0, -1.0, 0.0),
            Vec3::new(1.0, -1.0, 0.0),
            Vec3::new(1.0, 1.0, 0.0),
            Vec3::new(-1.0, 1.0, 0.0),
            Vec3::new(-1.0, -1.0, 2.0),
            Vec3::new(1.0, -1.0, 2.0),
            Vec3::new(1.0, 1.0, 2.0),
            Vec3::new(-1.0, 1.0, 2.0),
        ]
    }

    #[test]
    fn fully_inside_is_visible() {
        // Single plane far below the box; everything is inside.
        let planes = [Plane::new(Vec3::Y, 100.0)];
        assert!(frustum_visible(&unit_box(), &planes));
    }

    #[test]
    fn single_plane_excluding_all_vertices_hides() {
        // Plane y - 10 >= 0 inside; the whole box sits below y = 10.
        let planes = [Plane::new(Vec3::Y, -10.0)];
        assert!(!frustum_visible(&unit_box(), &planes));
    }

    #[test]
    fn straddling_planes_stay_visible() {
        // Each plane cuts the box but none excludes all 8 vertices.
        let planes = [Plane::new(Vec3::X, 0.0), Plane::new(Vec3::Y, 0.0)];
        assert!(frustum_visible(&unit_box(), &planes));
    }

    #[test]
    fn boundary_vertex_counts_as_inside() {
        // Plane touching the box's max-y face exactly: distance == 0 there.
        let verts = unit_box();
        let plane = Plane::new(-Vec3::Y, 1.0);
        assert!(!plane.is_outside(Vec3::new(0.0, 1.0, 0.0)));
        assert!(frustum_visible(&verts, &[plane]));
    }

    #[test]
    fn clean_faces_substitute_planes() {
        // Box fully inside one generous plane: all 6 faces substitute.
        let planes = [Plane::new(Vec3::Y, 100.0)];
        let reduced = reduced_culling_planes(&unit_box(), &planes);
        assert_eq!(reduced.len(), 6);
        // Substituted planes face inward: the centroid is inside each.
        let centroid = Vec3::new(0.0, 0.0, 1.0);
        for p in &reduced {
            assert!(p.distance(centroid) > 0.0);
        }
    }

    #[test]
    fn dirty_faces_keep_excluding_camera_planes() {
        // Plane x >= 0 cuts the box: faces touching x = -1 are dirty, the
        // camera plane must survive into the reduced set.
        let camera = Plane::new(Vec3::X, 0.0);
        let reduced = reduced_culling_planes(&unit_box(), &[camera]);
        assert!(reduced.iter().any(|p| *p == camera));
    }

    #[test]
    fn reduced_set_respects_cap() {
        // Many straddling planes: every one excludes some vertex.
        let mut planes = Vec::new();
        for i in 0..16 {
            let offset = (i as f32) * 0.01;
            planes.push(Plane::new(Vec3::X, offset));
        }
        let reduced = reduced_culling_planes(&unit_box(), &planes);
        assert!(reduced.len() <= MAX_CULLING_PLANES);
    }
}
