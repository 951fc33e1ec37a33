// src/host/traits.rs
// Narrow contracts with the host render pipeline (culling, pass scheduling,
// draw submission, temporary targets, material system)
// RELEVANT FILES: src/host/handles.rs, src/passes/projector_pass.rs

use wgpu::TextureFormat;

use super::handles::{
    CameraId, CasterId, LayerMask, LightHandle, MaterialHandle, RenderPassEvent, TextureHandle,
};
use crate::lighting::keywords::{PropertyId, PropertyValue};
use crate::passes::render_state::RenderStateBlock;
use crate::projector::visibility::Plane;

/// Opaque token for a completed scene-culling query, passed back to the
/// host's draw submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CullingResults(pub u64);

/// One light visible to the current camera.
#[derive(Debug, Clone, Copy)]
pub struct VisibleLight {
    pub handle: LightHandle,
    pub is_main: bool,
}

/// The camera's visible lights plus the host's remap from visible-light
/// index to forward-lit additional-light slot (-1 when a light occupies no
/// additional slot, e.g. the main light).
#[derive(Debug, Clone, Default)]
pub struct VisibleLightSet {
    pub lights: Vec<VisibleLight>,
    pub additional_slots: Vec<i32>,
}

impl VisibleLightSet {
    pub fn find(&self, handle: LightHandle) -> Option<usize> {
        self.lights.iter().position(|l| l.handle == handle)
    }

    pub fn main_light_index(&self) -> Option<usize> {
        self.lights.iter().position(|l| l.is_main)
    }

    /// Additional-light slot for a visible-light index, if it has one.
    pub fn additional_slot(&self, visible_index: usize) -> Option<u32> {
        let slot = *self.additional_slots.get(visible_index)?;
        (slot >= 0).then_some(slot as u32)
    }
}

/// Per-camera inputs sampled from the host at collection time.
#[derive(Debug, Clone)]
pub struct CameraInfo {
    pub id: CameraId,
    pub target_width: u32,
    pub target_height: u32,
    pub culling_planes: Vec<Plane>,
    /// The host's scene-wide culling token for this camera.
    pub culling_results: CullingResults,
    /// True when the pipeline already produces a usable depth texture for
    /// this camera this frame, making the depth pre-pass redundant.
    pub depth_texture_available: bool,
    pub cull_layers: LayerMask,
}

/// Host pool of temporary render targets.
pub trait TemporaryTargetAllocator {
    fn allocate(&mut self, width: u32, height: u32, format: TextureFormat) -> TextureHandle;
    fn release(&mut self, handle: TextureHandle);
}

/// Host culling queries against an explicit plane set.
///
/// Returns None when the query produces no results (the projector is treated
/// as not visible this frame).
pub trait SceneCuller {
    fn cull(&mut self, planes: &[Plane]) -> Option<CullingResults>;
}

/// Host material/shader system: global keywords and properties.
pub trait MaterialSink {
    fn set_keyword(&mut self, name: &'static str, enabled: bool);
    fn set_global(&mut self, id: PropertyId, value: PropertyValue);
}

/// Binding of an already-collected shadow-buffer texture for an apply draw.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ShadowBufferBinding {
    pub texture: TextureHandle,
    pub channel_mask: [f32; 4],
}

/// One unit of rendering work handed to the host's pass scheduler.
#[derive(Debug, Clone)]
pub enum PassCommand {
    /// Bind a shadow-buffer texture as the active color target.
    SetRenderTarget {
        color: TextureHandle,
        clear_color: Option<[f32; 4]>,
        use_camera_depth: bool,
    },
    /// Depth-only pre-pass over the camera's opaque geometry.
    DepthPrepass {
        cull: CullingResults,
        layers: LayerMask,
        state: RenderStateBlock,
    },
    /// Filtered renderer draw with an optional material override and a
    /// render-state override. No override means renderers draw with their
    /// own material's matching pass.
    DrawRenderers {
        caster: CasterId,
        cull: CullingResults,
        pass_name: &'static str,
        material: Option<MaterialHandle>,
        layers: LayerMask,
        buffer: Option<ShadowBufferBinding>,
        state: RenderStateBlock,
    },
    /// Full-screen draw clearing the given stencil bits.
    StencilClear { write_mask: u32 },
}

/// Host pass scheduler: enqueue a command under an ordering key; the host
/// executes commands of one camera in ascending event order, preserving
/// enqueue order within an event.
pub trait PassQueue {
    fn enqueue(&mut self, event: RenderPassEvent, command: PassCommand);
}
