// src/projector/frustum.rs
// Projector frustum corner and projection-matrix derivation
// RELEVANT FILES: src/projector/visibility.rs, src/shadows/caster.rs

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

use glam::{Mat4, Vec3};
use serde::{Deserialize, Serialize};

const MIN_NEAR_PLANE: f32 = 1.0e-3;
const MIN_DISTANCE_EPS: f32 = 1.0e-3;

/// Projection shape of a projector volume.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum ProjectionKind {
    /// Half-height of the volume in world units.
    Orthographic { size: f32 },
    /// Vertical field of view in degrees.
    Perspective { fov_deg: f32 },
}

/// Scalar parameters of a projector frustum, in the projector's local space
/// looking down +Z.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ProjectorParams {
    pub kind: ProjectionKind,
    pub aspect: f32,
    pub near: f32,
    pub far: f32,
}

impl Default for ProjectorParams {
    fn default() -> Self {
        Self {
            kind: ProjectionKind::Orthographic { size: 1.0 },
            aspect: 1.0,
            near: 0.1,
            far: 10.0,
        }
    }
}

impl ProjectorParams {
    pub fn validate(&self) -> Result<(), String> {
        if self.near < MIN_NEAR_PLANE {
            return Err(format!("near must be at least {}", MIN_NEAR_PLANE));
        }
        if self.far <= self.near + MIN_DISTANCE_EPS {
            return Err("far must be greater than near".to_string());
        }
        if self.aspect <= 0.0 {
            return Err("aspect must be positive".to_string());
        }
        match self.kind {
            ProjectionKind::Orthographic { size } => {
                if size <= 0.0 {
                    return Err("orthographic size must be positive".to_string());
                }
            }
            ProjectionKind::Perspective { fov_deg } => {
                if fov_deg <= 0.0 || fov_deg >= 180.0 {
                    return Err("fov must be in (0, 180) degrees".to_string());
                }
            }
        }
        Ok(())
    }

    /// Cheap content hash over the scalar parameters.
    ///
    /// Used to skip corner/matrix recomputation when nothing changed; hashes
    /// the raw bit patterns so -0.0 vs 0.0 is the only aliased pair.
    pub fn params_hash(&self) -> u64 {
        let mut hasher = DefaultHasher::new();
        match self.kind {
            ProjectionKind::Orthographic { size } => {
                0u8.hash(&mut hasher);
                size.to_bits().hash(&mut hasher);
            }
            ProjectionKind::Perspective { fov_deg } => {
                1u8.hash(&mut hasher);
                fov_deg.to_bits().hash(&mut hasher);
            }
        }
        self.aspect.to_bits().hash(&mut hasher);
        self.near.to_bits().hash(&mut hasher);
        self.far.to_bits().hash(&mut hasher);
        hasher.finish()
    }

    fn half_extents(&self, depth: f32) -> (f32, f32) {
        match self.kind {
            ProjectionKind::Orthographic { size } => (size * self.aspect, size),
            ProjectionKind::Perspective { fov_deg } => {
                let h = depth * (fov_deg.to_radians() * 0.5).tan();
                (h * self.aspect, h)
            }
        }
    }
}

/// Local-space frustum corners: 4 near then 4 far, wound
/// (-x,-y), (+x,-y), (+x,+y), (-x,+y).
pub fn frustum_local_vertices(params: &ProjectorParams) -> [Vec3; 8] {
    let (wn, hn) = params.half_extents(params.near);
    let (wf, hf) = params.half_extents(params.far);
    [
        Vec3::new(-wn, -hn, params.near),
        Vec3::new(wn, -hn, params.near),
        Vec3::new(wn, hn, params.near),
        Vec3::new(-wn, hn, params.near),
        Vec3::new(-wf, -hf, params.far),
        Vec3::new(wf, -hf, params.far),
        Vec3::new(wf, hf, params.far),
        Vec3::new(-wf, hf, params.far),
    ]
}

/// Transform local frustum corners into world space.
pub fn world_vertices(local: &[Vec3; 8], local_to_world: &Mat4) -> [Vec3; 8] {
    let mut out = [Vec3::ZERO; 8];
    for (dst, src) in out.iter_mut().zip(local.iter()) {
        *dst = local_to_world.transform_point3(*src);
    }
    out
}

/// Clip-space projection matrix for the projector volume (depth in [0, 1]).
pub fn projection_matrix(params: &ProjectorParams) -> Mat4 {
    match params.kind {
        ProjectionKind::Orthographic { size } => {
            let w = size * params.aspect;
            Mat4::orthographic_lh(-w, w, -size, size, params.near, params.far)
        }
        ProjectionKind::Perspective { fov_deg } => Mat4::perspective_lh(
            fov_deg.to_radians(),
            params.aspect,
            params.near,
            params.far,
        ),
    }
}

/// Projection matrix remapped to texture space: XY land in [0, 1] with a Y
/// flip matching top-left texture origins, depth lands in [0, 1] over
/// [near, far] (linear for orthographic, projective for perspective).
pub fn projection_to_uv_matrix(params: &ProjectorParams) -> Mat4 {
    let bias = Mat4::from_translation(Vec3::new(0.5, 0.5, 0.0))
        * Mat4::from_scale(Vec3::new(0.5, -0.5, 1.0));
    bias * projection_matrix(params)
}

/// Cached frustum data recomputed only when the parameter hash changes.
#[derive(Debug, Clone)]
pub struct CachedFrustum {
    hash: u64,
    pub local_vertices: [Vec3; 8],
    pub uv_matrix: Mat4,
}

impl CachedFrustum {
    pub fn new(params: &ProjectorParams) -> Self {
        Self {
            hash: params.params_hash(),
            local_vertices: frustum_local_vertices(params),
            uv_matrix: projection_to_uv_matrix(params),
        }
    }

    /// Refresh from `params`; returns true when a recompute happened.
    pub fn update(&mut self, params: &ProjectorParams) -> bool {
        let hash = params.params_hash();
        if hash == self.hash {
            return false;
        }
        self.hash = hash;
        self.local_vertices = frustum_local_vertices(params);
        self.uv_matrix = projection_to_uv_matrix(params);
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ortho_corners_are_axis_aligned() {
        let params = ProjectorParams {
            kind: ProjectionKind::Orthographic { size: 2.0 },
            aspect: 0.5,
            near: 1.0,
            far: 5.0,
        };
        let v = frustum_local_vertices(&params);
        assert_eq!(v[0], Vec3::new(-1.0, -2.0, 1.0));
        assert_eq!(v[6], Vec3::new(1.0, 2.0, 5.0));
        // Ortho extents do not grow with depth.
        assert_eq!(v[0].x, v[4].x);
    }

    #[test]
    fn perspective_far_corners_expand() {
        let params = ProjectorParams {
            kind: ProjectionKind::Perspective { fov_deg: 90.0 },
            aspect: 1.0,
            near: 1.0,
            far: 4.0,
        };
        let v = frustum_local_vertices(&params);
        assert!((v[0].y + 1.0).abs() < 1.0e-4);
        assert!((v[4].y + 4.0).abs() < 1.0e-4);
    }

    #[test]
    fn uv_matrix_maps_center_to_half() {
        let params = ProjectorParams::default();
        let m = projection_to_uv_matrix(&params);
        // A point on the projection axis lands in the middle of UV space.
        let mid = (params.near + params.far) * 0.5;
        let p = m.project_point3(Vec3::new(0.0, 0.0, mid));
        assert!((p.x - 0.5).abs() < 1.0e-5);
        assert!((p.y - 0.5).abs() < 1.0e-5);
    }

    #[test]
    fn ortho_uv_depth_is_linear() {
        let params = ProjectorParams {
            kind: ProjectionKind::Orthographic { size: 1.0 },
            aspect: 1.0,
            near: 2.0,
            far: 6.0,
        };
        let m = projection_to_uv_matrix(&params);
        let quarter = m.project_point3(Vec3::new(0.0, 0.0, 3.0)).z;
        assert!((quarter - 0.25).abs() < 1.0e-5);
    }

    #[test]
    fn hash_tracks_parameter_changes() {
        let mut params = ProjectorParams::default();
        let mut cached = CachedFrustum::new(&params);
        assert!(!cached.update(&params));
        params.far = 20.0;
        assert!(cached.update(&params));
        assert!(!cached.update(&params));
    }

    #[test]
    fn validate_rejects_bad_ranges() {
        let mut p = ProjectorParams::default();
        assert!(p.validate().is_ok());
        p.near = 0.0;
        assert!(p.validate().is_err());
        p = ProjectorParams {
            kind: ProjectionKind::Perspective { fov_deg: 180.0 },
            ..ProjectorParams::default()
        };
        assert!(p.validate().is_err());
    }
}
