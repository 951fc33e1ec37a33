//! Projector-based dynamic shadow and decal rendering for scriptable render
//! pipelines.
//!
//! The crate packs per-caster monochrome shadow masks into the RGBA channels
//! of a minimal number of pooled render targets, orders the collection draws
//! so stencil bits and channels are retained and released correctly, and
//! feeds the packed results to the forward-lit pass through an explicit,
//! frame-scoped [`lighting::LitShaderState`].
//!
//! The host pipeline stays behind the narrow contracts in [`host`]: pass
//! enqueueing, culling queries, temporary render targets, and the material
//! system. Cameras must be rendered strictly sequentially; every
//! [`shadows::ShadowCollectionScheduler::collect`] is paired with a
//! `finish_camera` after the consuming draws.

pub mod error;
pub mod host;
pub mod lighting;
pub mod passes;
pub mod projector;
pub mod shadows;

pub use error::{ProjectorError, ProjectorResult};
pub use host::{CameraInfo, CullingResults, VisibleLight, VisibleLightSet};
pub use lighting::LitShaderState;
pub use passes::ProjectorRenderPass;
pub use projector::{CachedFrustum, Plane, ProjectionKind, ProjectorParams};
pub use shadows::{
    ApplyMethod, CollectionPlan, ShadowBufferConfig, ShadowCasterDesc, ShadowCollectionScheduler,
    ShadowColorMode,
};
