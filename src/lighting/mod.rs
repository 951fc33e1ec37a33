// src/lighting/mod.rs
// Forward-lit shadow state and the shader keyword/property contract

pub mod keywords;
pub mod lit_state;
pub mod types;

pub use keywords::{PropertyId, PropertyValue};
pub use lit_state::{LitShaderState, MainLightShadow};
pub use types::{channel_mask_vec4, AdditionalShadowChannelsGpu, MAX_ADDITIONAL_LIGHTS};
