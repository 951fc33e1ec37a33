// src/passes/projector_pass.rs
// Adapts a camera's collection plan into the host's pass-enqueue protocol
// RELEVANT FILES: src/shadows/scheduler/collect.rs, src/host/traits.rs

use log::warn;

use crate::host::handles::RenderPassEvent;
use crate::host::traits::{PassCommand, PassQueue, ShadowBufferBinding};
use crate::lighting::keywords::{PASS_COLLECT_SHADOWS, PASS_PROJECTOR_APPLY, PASS_SHADOW_MASK};
use crate::shadows::caster::ApplyMethod;
use crate::shadows::scheduler::{AssignmentRole, CollectionPlan};
use crate::shadows::stencil::StencilBitPool;

use super::render_state::{
    apply_draw_state, collect_draw_state, depth_prepass_state, mask_draw_state,
};

/// Shadow buffers clear to "fully lit" before masks multiply in.
const CLEAR_COLOR: [f32; 4] = [1.0, 1.0, 1.0, 1.0];

/// Enqueues one camera's shadow-buffer collection and apply draws at the
/// host's pass-injection points.
#[derive(Debug, Clone)]
pub struct ProjectorRenderPass {
    pub collection_event: RenderPassEvent,
    pub apply_event: RenderPassEvent,
}

impl Default for ProjectorRenderPass {
    fn default() -> Self {
        Self {
            collection_event: RenderPassEvent::AfterRenderingShadows,
            apply_event: RenderPassEvent::AfterRenderingOpaques,
        }
    }
}

impl ProjectorRenderPass {
    pub fn new(collection_event: RenderPassEvent, apply_event: RenderPassEvent) -> Self {
        Self {
            collection_event,
            apply_event,
        }
    }

    /// Enqueue the collection draws: per texture a target bind + clear, the
    /// depth pre-pass when the camera lacks one, each caster's mask draw in
    /// plan order, and the realtime collection sub-draw when requested.
    pub fn queue_collection(&self, plan: &CollectionPlan, queue: &mut dyn PassQueue) {
        for tex_plan in &plan.textures {
            queue.enqueue(
                self.collection_event,
                PassCommand::SetRenderTarget {
                    color: tex_plan.texture,
                    clear_color: Some(CLEAR_COLOR),
                    use_camera_depth: true,
                },
            );

            if tex_plan.needs_depth_prepass {
                queue.enqueue(
                    self.collection_event,
                    PassCommand::DepthPrepass {
                        cull: plan.camera_cull,
                        layers: plan.camera_layers,
                        state: depth_prepass_state(),
                    },
                );
            }

            for assignment in &tex_plan.assignments {
                queue.enqueue(
                    self.collection_event,
                    PassCommand::DrawRenderers {
                        caster: assignment.caster,
                        cull: assignment.cull,
                        pass_name: PASS_SHADOW_MASK,
                        material: Some(assignment.material),
                        layers: assignment.caster_layers,
                        buffer: None,
                        state: mask_draw_state(assignment.channels),
                    },
                );
            }

            if !tex_plan.collect_write_mask.is_empty() {
                if let Some(first) = tex_plan.assignments.first() {
                    // Receiver geometry renders its own collect pass; no
                    // material override.
                    queue.enqueue(
                        self.collection_event,
                        PassCommand::DrawRenderers {
                            caster: first.caster,
                            cull: plan.camera_cull,
                            pass_name: PASS_COLLECT_SHADOWS,
                            material: None,
                            layers: tex_plan.collect_layers,
                            buffer: None,
                            state: collect_draw_state(tex_plan.collect_write_mask),
                        },
                    );
                }
            }
        }
    }

    /// Enqueue the apply draws for casters whose mask is rendered by their
    /// own projector geometry. Each draw claims a stencil bit; a completed
    /// cycle inserts a full-screen stencil clear before allocation resumes.
    pub fn queue_apply(
        &self,
        plan: &CollectionPlan,
        stencil: &mut StencilBitPool,
        queue: &mut dyn PassQueue,
    ) {
        for tex_plan in &plan.textures {
            for assignment in &tex_plan.assignments {
                let standalone = matches!(
                    assignment.role,
                    AssignmentRole::Colored | AssignmentRole::Standalone
                );
                // Masks feeding light projectors are consumed host-side,
                // not drawn by their own volume.
                if !standalone || assignment.apply_method == ApplyMethod::ByLightProjectors {
                    continue;
                }

                let mut bit = stencil.allocate_single_bit();
                if bit == 0 && stencil.loop_pending() {
                    queue.enqueue(
                        self.apply_event,
                        PassCommand::StencilClear {
                            write_mask: stencil.available_mask() as u32,
                        },
                    );
                    stencil.acknowledge_loop();
                    bit = stencil.allocate_single_bit();
                }
                if bit == 0 {
                    warn!(
                        "no stencil bit for caster {:?}; overlap optimization skipped",
                        assignment.caster
                    );
                }

                queue.enqueue(
                    self.apply_event,
                    PassCommand::DrawRenderers {
                        caster: assignment.caster,
                        cull: assignment.cull,
                        pass_name: PASS_PROJECTOR_APPLY,
                        material: Some(assignment.material),
                        layers: assignment.receiver_layers,
                        buffer: Some(ShadowBufferBinding {
                            texture: tex_plan.texture,
                            channel_mask: assignment.channels.to_vec4(),
                        }),
                        state: apply_draw_state(bit),
                    },
                );
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::handles::{CameraId, CasterId, MaterialHandle, TextureHandle};
    use crate::host::traits::CullingResults;
    use crate::shadows::scheduler::{ChannelAssignment, CollectionStats, TexturePlan};
    use crate::shadows::texture_ring::{ChannelMask, SlotId};
    use glam::Mat4;

    #[derive(Default)]
    struct RecordingQueue {
        commands: Vec<(RenderPassEvent, PassCommand)>,
    }

    impl PassQueue for RecordingQueue {
        fn enqueue(&mut self, event: RenderPassEvent, command: PassCommand) {
            self.commands.push((event, command));
        }
    }

    fn assignment(role: AssignmentRole, channels: ChannelMask) -> ChannelAssignment {
        ChannelAssignment {
            caster: CasterId(1),
            material: MaterialHandle(1),
            channels,
            role,
            apply_method: ApplyMethod::ByShadowProjectors,
            cull: CullingResults(0),
            caster_layers: 1,
            receiver_layers: 1,
            collects_realtime: false,
            uv_matrix: Mat4::IDENTITY,
        }
    }

    fn plan_with(assignments: Vec<ChannelAssignment>, needs_prepass: bool) -> CollectionPlan {
        let mut tex = TexturePlan::new(SlotId(0), TextureHandle(9), needs_prepass);
        tex.assignments = assignments;
        CollectionPlan {
            camera: CameraId(0),
            camera_cull: CullingResults(0),
            camera_layers: 1,
            width: 256,
            height: 256,
            textures: vec![tex],
            stats: CollectionStats::default(),
        }
    }

    #[test]
    fn collection_binds_clears_then_draws() {
        let pass = ProjectorRenderPass::default();
        let plan = plan_with(vec![assignment(AssignmentRole::MainLight, ChannelMask::A)], true);
        let mut queue = RecordingQueue::default();
        pass.queue_collection(&plan, &mut queue);

        assert!(matches!(
            queue.commands[0].1,
            PassCommand::SetRenderTarget { .. }
        ));
        assert!(matches!(queue.commands[1].1, PassCommand::DepthPrepass { .. }));
        assert!(matches!(
            queue.commands[2].1,
            PassCommand::DrawRenderers { pass_name, .. } if pass_name == PASS_SHADOW_MASK
        ));
    }

    #[test]
    fn prepass_skipped_when_camera_depth_exists() {
        let pass = ProjectorRenderPass::default();
        let plan = plan_with(vec![assignment(AssignmentRole::MainLight, ChannelMask::A)], false);
        let mut queue = RecordingQueue::default();
        pass.queue_collection(&plan, &mut queue);
        assert!(!queue
            .commands
            .iter()
            .any(|(_, c)| matches!(c, PassCommand::DepthPrepass { .. })));
    }

    #[test]
    fn lit_assignments_get_no_apply_draw() {
        let pass = ProjectorRenderPass::default();
        let plan = plan_with(
            vec![
                assignment(AssignmentRole::MainLight, ChannelMask::A),
                assignment(AssignmentRole::Standalone, ChannelMask::R),
            ],
            false,
        );
        let mut stencil = StencilBitPool::new(0xFF);
        let mut queue = RecordingQueue::default();
        pass.queue_apply(&plan, &mut stencil, &mut queue);

        let draws: Vec<_> = queue
            .commands
            .iter()
            .filter(|(_, c)| matches!(c, PassCommand::DrawRenderers { .. }))
            .collect();
        assert_eq!(draws.len(), 1);
    }

    #[test]
    fn stencil_cycle_inserts_full_screen_clear() {
        let pass = ProjectorRenderPass::default();
        let assignments = (0..9)
            .map(|_| assignment(AssignmentRole::Standalone, ChannelMask::R))
            .collect();
        let plan = plan_with(assignments, false);
        let mut stencil = StencilBitPool::new(0xFF);
        let mut queue = RecordingQueue::default();
        pass.queue_apply(&plan, &mut stencil, &mut queue);

        let clears = queue
            .commands
            .iter()
            .filter(|(_, c)| matches!(c, PassCommand::StencilClear { .. }))
            .count();
        assert_eq!(clears, 1);
        let draws = queue
            .commands
            .iter()
            .filter(|(_, c)| matches!(c, PassCommand::DrawRenderers { .. }))
            .count();
        assert_eq!(draws, 9);
    }
}
