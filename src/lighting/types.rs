// src/lighting/types.rs
// GPU-aligned layouts for the forward-lit shadow sampling parameters
// All types are repr(C) and bytemuck-compatible for host upload

use bytemuck::{Pod, Zeroable};

/// Maximum number of additional (non-main) lights the forward-lit pass packs
/// shadow channels for.
pub const MAX_ADDITIONAL_LIGHTS: usize = 16;

/// Component-select mask for a single channel index (0 = R .. 3 = A).
pub fn channel_mask_vec4(channel: u8) -> [f32; 4] {
    let mut mask = [0.0; 4];
    if (channel as usize) < 4 {
        mask[channel as usize] = 1.0;
    }
    mask
}

/// Main-light shadow sampling parameters, mirrored by the lit shader.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct MainShadowParamsGpu {
    pub channel_mask: [f32; 4],
}

/// Per-additional-light channel-select masks, mirrored by the lit shader.
///
/// An all-zero row means the light has no shadow channel bound this frame.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct AdditionalShadowChannelsGpu {
    pub channel_masks: [[f32; 4]; MAX_ADDITIONAL_LIGHTS],
}

impl Default for AdditionalShadowChannelsGpu {
    fn default() -> Self {
        Self::zeroed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn channel_mask_selects_single_component() {
        assert_eq!(channel_mask_vec4(0), [1.0, 0.0, 0.0, 0.0]);
        assert_eq!(channel_mask_vec4(3), [0.0, 0.0, 0.0, 1.0]);
        assert_eq!(channel_mask_vec4(7), [0.0, 0.0, 0.0, 0.0]);
    }

    #[test]
    fn gpu_structs_have_expected_size() {
        assert_eq!(std::mem::size_of::<MainShadowParamsGpu>(), 16);
        assert_eq!(
            std::mem::size_of::<AdditionalShadowChannelsGpu>(),
            16 * MAX_ADDITIONAL_LIGHTS
        );
    }
}
