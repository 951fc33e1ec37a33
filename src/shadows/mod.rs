// src/shadows/mod.rs
// Shadow-buffer collection: casters, channel packing, pooled textures, and
// the per-camera scheduler

pub mod caster;
pub mod scheduler;
pub mod stencil;
pub mod texture_ring;

pub use caster::{ApplyMethod, CasterClass, ShadowCasterDesc, ShadowColorMode};
pub use scheduler::{
    AssignmentRole, ChannelAssignment, CollectionPlan, CollectionStats, ResolutionScale,
    ShadowBufferConfig, ShadowBufferFormat, ShadowCollectionScheduler, TexturePlan,
};
pub use stencil::StencilBitPool;
pub use texture_ring::{ChannelMask, ShadowTextureRing, SlotId};
