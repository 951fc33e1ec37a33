// src/shadows/scheduler/types.rs
// Configuration, constants, and per-frame plan types for shadow collection
// RELEVANT FILES: src/shadows/scheduler/collect.rs, src/shadows/texture_ring.rs

use glam::Mat4;
use serde::{Deserialize, Serialize};

use crate::host::handles::{CameraId, CasterId, LayerMask, MaterialHandle, TextureHandle};
use crate::host::traits::CullingResults;
use crate::shadows::caster::ApplyMethod;
use crate::shadows::texture_ring::{ChannelMask, SlotId};

/// Channels packed into one shadow-buffer texture.
pub const CHANNELS_PER_TEXTURE: usize = 4;

/// Hard cap on casters feeding the forward-lit pass per camera per frame.
pub const MAX_LIT_SHADER_CASTERS: usize = 8;

pub const DEFAULT_MEMORY_BUDGET_BYTES: u64 = 256 * 1024 * 1024;

/// Shadow-buffer resolution relative to the camera target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ResolutionScale {
    Full,
    Half,
    Quarter,
}

impl ResolutionScale {
    pub fn divisor(self) -> u32 {
        match self {
            ResolutionScale::Full => 1,
            ResolutionScale::Half => 2,
            ResolutionScale::Quarter => 4,
        }
    }
}

/// Texture format of the shadow buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ShadowBufferFormat {
    Rgba8Unorm,
    Rgba16Float,
}

impl ShadowBufferFormat {
    pub fn to_wgpu(self) -> wgpu::TextureFormat {
        match self {
            ShadowBufferFormat::Rgba8Unorm => wgpu::TextureFormat::Rgba8Unorm,
            ShadowBufferFormat::Rgba16Float => wgpu::TextureFormat::Rgba16Float,
        }
    }

    pub fn bytes_per_pixel(self) -> u32 {
        match self {
            ShadowBufferFormat::Rgba8Unorm => 4,
            ShadowBufferFormat::Rgba16Float => 8,
        }
    }
}

/// High-level configuration for the collection scheduler.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShadowBufferConfig {
    pub resolution_scale: ResolutionScale,
    pub format: ShadowBufferFormat,
    pub max_memory_bytes: u64,
    /// Stencil bits the host leaves to projector volumes.
    pub stencil_mask: u8,
}

impl Default for ShadowBufferConfig {
    fn default() -> Self {
        Self {
            resolution_scale: ResolutionScale::Full,
            format: ShadowBufferFormat::Rgba8Unorm,
            max_memory_bytes: DEFAULT_MEMORY_BUDGET_BYTES,
            stencil_mask: 0xFF,
        }
    }
}

impl ShadowBufferConfig {
    pub fn validate(&self) -> Result<(), String> {
        if self.max_memory_bytes == 0 {
            return Err("max_memory_bytes must be positive".to_string());
        }
        Ok(())
    }
}

/// Planned texture count for one camera's collection pass.
///
/// Lit-shader casters pack 4 per texture. The colored class shares one
/// texture's RGB group, donated into the last lit texture when that texture
/// holds exactly one channel (lit count mod 4 == 1); stand-alone monochrome
/// casters pack 4 per texture after that. Returns (count, donated).
pub fn planned_texture_count(lit: usize, colored: usize, standalone: usize) -> (u32, bool) {
    let lit_textures = (lit + CHANNELS_PER_TEXTURE - 1) / CHANNELS_PER_TEXTURE;
    let donate = lit % CHANNELS_PER_TEXTURE == 1 && colored > 0;
    let colored_textures = usize::from(colored > 0 && !donate);
    let standalone_textures = (standalone + CHANNELS_PER_TEXTURE - 1) / CHANNELS_PER_TEXTURE;
    ((lit_textures + colored_textures + standalone_textures) as u32, donate)
}

/// Why a caster occupies its channel, and how the mask reaches the screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssignmentRole {
    /// Feeds the forward-lit pass through the main-light binding (alpha).
    MainLight,
    /// Feeds the forward-lit pass through an additional-light slot.
    AdditionalLight(u32),
    /// Part of the shared colored RGB group.
    Colored,
    /// Applied by drawing projector geometry.
    Standalone,
}

/// One caster's channel assignment within a texture.
#[derive(Debug, Clone)]
pub struct ChannelAssignment {
    pub caster: CasterId,
    pub material: MaterialHandle,
    pub channels: ChannelMask,
    pub role: AssignmentRole,
    pub apply_method: ApplyMethod,
    /// Culling token from this projector's reduced plane set.
    pub cull: CullingResults,
    pub caster_layers: LayerMask,
    pub receiver_layers: LayerMask,
    pub collects_realtime: bool,
    pub uv_matrix: Mat4,
}

/// One shadow-buffer texture's worth of collection work.
#[derive(Debug, Clone)]
pub struct TexturePlan {
    pub slot: SlotId,
    pub texture: TextureHandle,
    pub needs_depth_prepass: bool,
    pub assignments: Vec<ChannelAssignment>,
    /// Exact retain calls made for this texture; released verbatim at
    /// camera end.
    pub retains: Vec<(SlotId, ChannelMask)>,
    /// Channels written by the realtime-shadow collection sub-draw.
    pub collect_write_mask: ChannelMask,
    pub collect_layers: LayerMask,
}

impl TexturePlan {
    pub(crate) fn new(slot: SlotId, texture: TextureHandle, needs_depth_prepass: bool) -> Self {
        Self {
            slot,
            texture,
            needs_depth_prepass,
            assignments: Vec::new(),
            retains: Vec::new(),
            collect_write_mask: ChannelMask::NONE,
            collect_layers: 0,
        }
    }
}

/// Everything the render pass needs to draw one camera's shadow buffers.
#[derive(Debug, Clone)]
pub struct CollectionPlan {
    pub camera: CameraId,
    pub camera_cull: CullingResults,
    pub camera_layers: LayerMask,
    pub width: u32,
    pub height: u32,
    pub textures: Vec<TexturePlan>,
    pub stats: CollectionStats,
}

impl CollectionPlan {
    pub fn is_empty(&self) -> bool {
        self.textures.is_empty()
    }
}

/// Per-camera collection counters for diagnostics.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CollectionStats {
    pub registered: usize,
    pub visible: usize,
    pub lit_shader: usize,
    pub colored: usize,
    pub standalone: usize,
    /// Casters pushed out of the lit-shader class (cap, duplicate main
    /// light, or additional-texture conflict).
    pub demoted: usize,
    pub textures: usize,
}
