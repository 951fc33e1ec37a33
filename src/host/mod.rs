// src/host/mod.rs
// Contracts with the host render pipeline; implementations live host-side

pub mod handles;
pub mod traits;

pub use handles::{
    CameraId, CasterId, LayerMask, LightHandle, MaterialHandle, RenderPassEvent, TextureHandle,
    ALL_LAYERS,
};
pub use traits::{
    CameraInfo, CullingResults, MaterialSink, PassCommand, PassQueue, SceneCuller,
    ShadowBufferBinding, TemporaryTargetAllocator, VisibleLight, VisibleLightSet,
};
