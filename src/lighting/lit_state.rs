// src/lighting/lit_state.rs
// Frame-scoped shadow-sampling state consumed by the forward-lit pass
// Exists to make the per-camera Begin/Setup/Clear lifecycle an explicit,
// testable object instead of process-wide shader state
// RELEVANT FILES: src/lighting/keywords.rs, src/shadows/scheduler/collect.rs

use crate::host::handles::{LayerMask, TextureHandle};
use crate::host::traits::MaterialSink;
use crate::lighting::keywords::{
    PropertyId, PropertyValue, KW_ADDITIONAL_LIGHT_SHADOWS, KW_MAIN_LIGHT_SHADOW,
};
use crate::lighting::types::{
    channel_mask_vec4, AdditionalShadowChannelsGpu, MainShadowParamsGpu, MAX_ADDITIONAL_LIGHTS,
};

/// Main-light shadow binding for one camera's frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MainLightShadow {
    pub texture: TextureHandle,
    pub channel: u8,
    pub layers: LayerMask,
}

/// Accumulates which shadow-buffer texture and channel feed the main light
/// and each additional light, then materializes the bindings as global
/// shader keywords/properties exactly once before the forward-lit pass.
///
/// Lifecycle per camera: `begin_frame` -> `set_*` during collection ->
/// `setup_states` right before the lit pass -> `clear` at camera end.
#[derive(Debug)]
pub struct LitShaderState {
    main: Option<MainLightShadow>,
    additional_texture: Option<TextureHandle>,
    additional_channels: [i8; MAX_ADDITIONAL_LIGHTS],
    additional_layers: LayerMask,
    collection_layers: LayerMask,
    dirty: bool,
    emitted: bool,
}

impl Default for LitShaderState {
    fn default() -> Self {
        Self::new()
    }
}

impl LitShaderState {
    pub fn new() -> Self {
        Self {
            main: None,
            additional_texture: None,
            additional_channels: [-1; MAX_ADDITIONAL_LIGHTS],
            additional_layers: 0,
            collection_layers: 0,
            dirty: false,
            emitted: false,
        }
    }

    /// Reset accumulation at camera-rendering start. Emits nothing.
    pub fn begin_frame(&mut self) {
        self.reset_accumulation();
    }

    /// Bind the main-light shadow to `texture`, sampled from `channel`.
    pub fn set_main_light_shadow(&mut self, texture: TextureHandle, channel: u8, layers: LayerMask) {
        self.main = Some(MainLightShadow {
            texture,
            channel,
            layers,
        });
        self.dirty = true;
    }

    /// Bind an additional light's shadow channel.
    ///
    /// All additional lights share one texture per camera per frame; returns
    /// false when a second, different texture is proposed (or the light index
    /// is out of range) so the caller can fall back to stand-alone
    /// application for that caster.
    pub fn set_additional_light_shadow(
        &mut self,
        light_index: u32,
        texture: TextureHandle,
        channel: u8,
        layers: LayerMask,
    ) -> bool {
        if light_index as usize >= MAX_ADDITIONAL_LIGHTS {
            return false;
        }
        match self.additional_texture {
            Some(bound) if bound != texture => return false,
            Some(_) => {}
            None => self.additional_texture = Some(texture),
        }
        self.additional_channels[light_index as usize] = channel as i8;
        self.additional_layers |= layers;
        self.dirty = true;
        true
    }

    /// Accumulate layers whose renderables feed the realtime-shadow
    /// collection sub-pass this frame.
    pub fn add_collection_layers(&mut self, layers: LayerMask) {
        self.collection_layers |= layers;
    }

    /// Materialize accumulated bindings into the material system.
    ///
    /// Dirty-flag gated: a second call without an intervening `set_*` emits
    /// nothing.
    pub fn setup_states(&mut self, sink: &mut dyn MaterialSink) {
        if !self.dirty {
            return;
        }

        match self.main {
            Some(main) => {
                sink.set_keyword(KW_MAIN_LIGHT_SHADOW, true);
                sink.set_global(
                    PropertyId::MainShadowTexture,
                    PropertyValue::Texture(main.texture),
                );
                sink.set_global(
                    PropertyId::MainShadowChannelMask,
                    PropertyValue::Vec4(channel_mask_vec4(main.channel)),
                );
            }
            None => sink.set_keyword(KW_MAIN_LIGHT_SHADOW, false),
        }

        match self.additional_texture {
            Some(texture) => {
                sink.set_keyword(KW_ADDITIONAL_LIGHT_SHADOWS, true);
                sink.set_global(
                    PropertyId::AdditionalShadowTexture,
                    PropertyValue::Texture(texture),
                );
                let gpu = self.additional_channels_gpu();
                sink.set_global(
                    PropertyId::AdditionalShadowChannelMasks,
                    PropertyValue::Vec4Array(gpu.channel_masks.to_vec()),
                );
            }
            None => sink.set_keyword(KW_ADDITIONAL_LIGHT_SHADOWS, false),
        }

        self.emitted = self.main.is_some() || self.additional_texture.is_some();
        self.dirty = false;
    }

    /// Reset to the same state as a fresh `begin_frame`, disabling any
    /// keywords previously emitted. Skips emission entirely when no caster
    /// touched the state this frame.
    pub fn clear(&mut self, sink: &mut dyn MaterialSink) {
        if self.emitted {
            sink.set_keyword(KW_MAIN_LIGHT_SHADOW, false);
            sink.set_keyword(KW_ADDITIONAL_LIGHT_SHADOWS, false);
            self.emitted = false;
        }
        self.reset_accumulation();
    }

    pub fn main_binding(&self) -> Option<MainLightShadow> {
        self.main
    }

    pub fn additional_texture(&self) -> Option<TextureHandle> {
        self.additional_texture
    }

    pub fn additional_channel(&self, light_index: u32) -> Option<u8> {
        let channel = *self.additional_channels.get(light_index as usize)?;
        (channel >= 0).then_some(channel as u8)
    }

    pub fn additional_layers(&self) -> LayerMask {
        self.additional_layers
    }

    pub fn collection_layers(&self) -> LayerMask {
        self.collection_layers
    }

    /// GPU-aligned main-light parameters for host upload.
    pub fn main_params_gpu(&self) -> Option<MainShadowParamsGpu> {
        self.main.map(|m| MainShadowParamsGpu {
            channel_mask: channel_mask_vec4(m.channel),
        })
    }

    /// GPU-aligned per-light channel-select table for host upload.
    pub fn additional_channels_gpu(&self) -> AdditionalShadowChannelsGpu {
        let mut gpu = AdditionalShadowChannelsGpu::default();
        for (row, channel) in gpu.channel_masks.iter_mut().zip(self.additional_channels) {
            if channel >= 0 {
                *row = channel_mask_vec4(channel as u8);
            }
        }
        gpu
    }

    fn reset_accumulation(&mut self) {
        self.main = None;
        self.additional_texture = None;
        self.additional_channels = [-1; MAX_ADDITIONAL_LIGHTS];
        self.additional_layers = 0;
        self.collection_layers = 0;
        self.dirty = false;
    }
}
