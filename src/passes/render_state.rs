// src/passes/render_state.rs
// wgpu render-state blocks for shadow-buffer collection and apply draws
// RELEVANT FILES: src/passes/projector_pass.rs, src/shadows/texture_ring.rs

use wgpu::{
    BlendComponent, BlendFactor, BlendOperation, BlendState, ColorWrites, CompareFunction,
    StencilFaceState, StencilOperation, StencilState,
};

use crate::shadows::texture_ring::ChannelMask;

/// Depth usage of a draw against the camera's depth buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DepthMode {
    Disabled,
    TestOnly,
    TestAndWrite,
}

/// Render-state override handed to the host's draw submission.
#[derive(Debug, Clone)]
pub struct RenderStateBlock {
    pub color_writes: ColorWrites,
    pub blend: Option<BlendState>,
    pub depth: DepthMode,
    pub depth_compare: CompareFunction,
    pub stencil: Option<StencilState>,
    pub stencil_ref: u32,
}

/// Color-write mask restricting a draw to the caster's channels.
pub fn channel_color_writes(mask: ChannelMask) -> ColorWrites {
    let mut writes = ColorWrites::empty();
    if mask.contains(ChannelMask::R) {
        writes |= ColorWrites::RED;
    }
    if mask.contains(ChannelMask::G) {
        writes |= ColorWrites::GREEN;
    }
    if mask.contains(ChannelMask::B) {
        writes |= ColorWrites::BLUE;
    }
    if mask.contains(ChannelMask::A) {
        writes |= ColorWrites::ALPHA;
    }
    writes
}

/// Shadow masks modulate whatever is already in the buffer.
pub fn multiply_blend() -> BlendState {
    let component = BlendComponent {
        src_factor: BlendFactor::Dst,
        dst_factor: BlendFactor::Zero,
        operation: BlendOperation::Add,
    };
    BlendState {
        color: component,
        alpha: component,
    }
}

/// State for rendering one caster's mask into its assigned channels.
pub fn mask_draw_state(channels: ChannelMask) -> RenderStateBlock {
    RenderStateBlock {
        color_writes: channel_color_writes(channels),
        blend: Some(multiply_blend()),
        depth: DepthMode::TestOnly,
        depth_compare: CompareFunction::LessEqual,
        stencil: None,
        stencil_ref: 0,
    }
}

/// State for the depth-only pre-pass shared by a texture's channels.
pub fn depth_prepass_state() -> RenderStateBlock {
    RenderStateBlock {
        color_writes: ColorWrites::empty(),
        blend: None,
        depth: DepthMode::TestAndWrite,
        depth_compare: CompareFunction::LessEqual,
        stencil: None,
        stencil_ref: 0,
    }
}

/// State for the realtime-shadow collection sub-draw over receiver
/// geometry, restricted to the collecting casters' channels.
pub fn collect_draw_state(write_mask: ChannelMask) -> RenderStateBlock {
    RenderStateBlock {
        color_writes: channel_color_writes(write_mask),
        blend: Some(multiply_blend()),
        depth: DepthMode::TestOnly,
        depth_compare: CompareFunction::LessEqual,
        stencil: None,
        stencil_ref: 0,
    }
}

/// Stencil state marking a projector volume's bit so overlapping volumes do
/// not double-shade: pixels already holding the bit are rejected, passing
/// pixels latch it.
pub fn projector_stencil_state(bit: u8) -> StencilState {
    let face = StencilFaceState {
        compare: CompareFunction::NotEqual,
        fail_op: StencilOperation::Keep,
        depth_fail_op: StencilOperation::Keep,
        pass_op: StencilOperation::Replace,
    };
    StencilState {
        front: face,
        back: face,
        read_mask: bit as u32,
        write_mask: bit as u32,
    }
}

/// State for applying a buffered mask by drawing projector geometry over
/// receivers. `stencil_bit` of 0 skips the overlap optimization.
pub fn apply_draw_state(stencil_bit: u8) -> RenderStateBlock {
    let stencil = (stencil_bit != 0).then(|| projector_stencil_state(stencil_bit));
    RenderStateBlock {
        color_writes: ColorWrites::ALL,
        blend: Some(multiply_blend()),
        depth: DepthMode::TestOnly,
        depth_compare: CompareFunction::LessEqual,
        stencil,
        stencil_ref: stencil_bit as u32,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn color_writes_follow_channel_mask() {
        assert_eq!(channel_color_writes(ChannelMask::A), ColorWrites::ALPHA);
        assert_eq!(
            channel_color_writes(ChannelMask::RGB),
            ColorWrites::RED | ColorWrites::GREEN | ColorWrites::BLUE
        );
        assert_eq!(channel_color_writes(ChannelMask::NONE), ColorWrites::empty());
    }

    #[test]
    fn mask_draw_never_writes_depth() {
        let state = mask_draw_state(ChannelMask::G);
        assert_eq!(state.depth, DepthMode::TestOnly);
        assert_eq!(state.color_writes, ColorWrites::GREEN);
    }

    #[test]
    fn apply_state_carries_stencil_bit() {
        let state = apply_draw_state(0b0100);
        let stencil = state.stencil.expect("stencil expected");
        assert_eq!(stencil.write_mask, 0b0100);
        assert_eq!(state.stencil_ref, 0b0100);

        let none = apply_draw_state(0);
        assert!(none.stencil.is_none());
    }
}
