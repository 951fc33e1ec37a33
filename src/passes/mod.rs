// src/passes/mod.rs
// Host-facing render pass adapter and render-state builders

pub mod projector_pass;
pub mod render_state;

pub use projector_pass::ProjectorRenderPass;
pub use render_state::{
    apply_draw_state, channel_color_writes, collect_draw_state, depth_prepass_state,
    mask_draw_state, multiply_blend, projector_stencil_state, DepthMode, RenderStateBlock,
};
