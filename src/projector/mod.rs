// src/projector/mod.rs
// Projector frustum math and camera visibility culling

pub mod frustum;
pub mod visibility;

pub use frustum::{
    frustum_local_vertices, projection_matrix, projection_to_uv_matrix, world_vertices,
    CachedFrustum, ProjectionKind, ProjectorParams,
};
pub use visibility::{
    frustum_visible, reduced_culling_planes, vertex_outside_masks, Plane, MAX_CULLING_PLANES,
};
