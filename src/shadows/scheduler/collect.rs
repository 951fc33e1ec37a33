// src/shadows/scheduler/collect.rs
// Per-camera shadow collection: visibility, classification, sorting, and
// channel packing into the minimal set of shadow-buffer textures
// RELEVANT FILES: src/shadows/caster.rs, src/shadows/texture_ring.rs,
// src/lighting/lit_state.rs

use log::debug;

use crate::error::{ProjectorError, ProjectorResult};
use crate::host::handles::{CameraId, CasterId};
use crate::host::traits::{
    CameraInfo, CullingResults, MaterialSink, SceneCuller, TemporaryTargetAllocator,
    VisibleLightSet,
};
use crate::lighting::lit_state::LitShaderState;
use crate::projector::visibility::{frustum_visible, reduced_culling_planes};
use crate::shadows::caster::{CasterClass, ShadowBufferEntry, ShadowCasterDesc};
use crate::shadows::stencil::StencilBitPool;
use crate::shadows::texture_ring::{ChannelMask, ShadowTextureRing, SlotId};

use super::budget;
use super::types::{
    planned_texture_count, AssignmentRole, ChannelAssignment, CollectionPlan, CollectionStats,
    ShadowBufferConfig, TexturePlan, CHANNELS_PER_TEXTURE, MAX_LIT_SHADER_CASTERS,
};

/// Orders one camera's shadow casters into shadow-buffer textures and
/// channels, and accumulates the forward-lit shadow bindings.
///
/// All per-frame resources are explicit members; correctness relies on the
/// host rendering cameras strictly sequentially (collect, draw, finish, then
/// the next camera).
pub struct ShadowCollectionScheduler {
    config: ShadowBufferConfig,
    ring: ShadowTextureRing,
    stencil: StencilBitPool,
    casters: Vec<ShadowBufferEntry>,
    active_camera: Option<CameraId>,
    last_stats: CollectionStats,
}

impl ShadowCollectionScheduler {
    pub fn new(config: ShadowBufferConfig) -> ProjectorResult<Self> {
        config.validate().map_err(ProjectorError::Config)?;
        let ring = ShadowTextureRing::new(config.format.to_wgpu());
        let stencil = StencilBitPool::new(config.stencil_mask);
        Ok(Self {
            config,
            ring,
            stencil,
            casters: Vec::new(),
            active_camera: None,
            last_stats: CollectionStats::default(),
        })
    }

    pub fn config(&self) -> &ShadowBufferConfig {
        &self.config
    }

    pub fn stencil_pool_mut(&mut self) -> &mut StencilBitPool {
        &mut self.stencil
    }

    /// Register a caster, or refresh its descriptor if already registered.
    pub fn register_caster(&mut self, desc: ShadowCasterDesc) {
        match self.casters.iter_mut().find(|e| e.desc.id == desc.id) {
            Some(entry) => entry.desc = desc,
            None => self.casters.push(ShadowBufferEntry::new(desc)),
        }
    }

    pub fn unregister_caster(&mut self, id: CasterId) {
        self.casters.retain(|e| e.desc.id != id);
    }

    pub fn caster_count(&self) -> usize {
        self.casters.len()
    }

    pub fn stats(&self) -> &CollectionStats {
        &self.last_stats
    }

    /// Run the collection pass for one camera.
    ///
    /// Light resolution completes for every caster before classification;
    /// classification and the lit-shader cap complete before the single
    /// sort; channels are assigned strictly in sorted order. Every `collect`
    /// must be paired with a `finish_camera` after the consuming draws.
    pub fn collect(
        &mut self,
        camera: &CameraInfo,
        lights: &VisibleLightSet,
        culler: &mut dyn SceneCuller,
        alloc: &mut dyn TemporaryTargetAllocator,
        lit: &mut LitShaderState,
    ) -> ProjectorResult<CollectionPlan> {
        if let Some(active) = self.active_camera {
            return Err(ProjectorError::collection(format!(
                "collect for camera {:?} while camera {:?} is still active",
                camera.id, active
            )));
        }
        self.active_camera = Some(camera.id);
        lit.begin_frame();

        let mut stats = CollectionStats {
            registered: self.casters.len(),
            ..CollectionStats::default()
        };

        // Visibility filter plus per-projector culling queries. A projector
        // whose culling query yields nothing is simply not visible.
        let mut visible: Vec<(usize, CullingResults)> = Vec::new();
        for (i, entry) in self.casters.iter_mut().enumerate() {
            entry.begin_frame();
            if !frustum_visible(&entry.desc.frustum_world, &camera.culling_planes) {
                continue;
            }
            let planes = reduced_culling_planes(&entry.desc.frustum_world, &camera.culling_planes);
            if let Some(cull) = culler.cull(&planes) {
                visible.push((i, cull));
            }
        }
        stats.visible = visible.len();

        let mut plan = CollectionPlan {
            camera: camera.id,
            camera_cull: camera.culling_results,
            camera_layers: camera.cull_layers,
            width: 0,
            height: 0,
            textures: Vec::new(),
            stats: CollectionStats::default(),
        };

        if visible.is_empty() {
            plan.stats = stats.clone();
            self.last_stats = stats;
            return Ok(plan);
        }

        // Light bindings resolve for every visible caster before anything
        // is classified or sorted.
        for &(i, _) in &visible {
            self.casters[i].setup_light_source(lights);
        }
        for &(i, _) in &visible {
            self.casters[i].classify();
        }
        self.apply_lit_shader_cap(&visible, &mut stats);

        // The one and only sort; channel assignment follows this order.
        visible.sort_by_key(|&(i, _)| self.casters[i].sort_key());

        let lit_group: Vec<(usize, CullingResults)> = visible
            .iter()
            .copied()
            .filter(|&(i, _)| {
                matches!(
                    self.casters[i].class,
                    CasterClass::LitCollect | CasterClass::LitStatic
                )
            })
            .collect();
        let colored_group: Vec<(usize, CullingResults)> = visible
            .iter()
            .copied()
            .filter(|&(i, _)| self.casters[i].class == CasterClass::Colored)
            .collect();
        let standalone_group: Vec<(usize, CullingResults)> = visible
            .iter()
            .copied()
            .filter(|&(i, _)| self.casters[i].class == CasterClass::Standalone)
            .collect();

        stats.lit_shader = lit_group.len();
        stats.colored = colored_group.len();
        stats.standalone = standalone_group.len();

        let (planned_textures, donate) =
            planned_texture_count(lit_group.len(), colored_group.len(), standalone_group.len());

        let div = self.config.resolution_scale.divisor();
        let mut width = (camera.target_width / div).max(1);
        let mut height = (camera.target_height / div).max(1);
        budget::clamp_to_budget(
            &mut width,
            &mut height,
            self.config.format.bytes_per_pixel(),
            planned_textures,
            self.config.max_memory_bytes,
        );
        plan.width = width;
        plan.height = height;

        let needs_prepass = !camera.depth_texture_available;
        let mut last_lit_slot: Option<SlotId> = None;

        // Lit-shader class: 4 channels per texture, main light on alpha.
        let chunks: Vec<&[(usize, CullingResults)]> =
            lit_group.chunks(CHANNELS_PER_TEXTURE).collect();
        let chunk_count = chunks.len();
        for (ci, chunk) in chunks.into_iter().enumerate() {
            let is_last = ci + 1 == chunk_count;
            let pin_to_alpha = is_last && chunk.len() == 1 && donate;

            let mut channels = Vec::with_capacity(chunk.len());
            let mut union = ChannelMask::NONE;
            let mut next = 0u8;
            for &(i, _) in chunk {
                let ch = if self.casters[i].is_main_light || pin_to_alpha {
                    ChannelMask::A
                } else {
                    let ch = ChannelMask::single(next);
                    next += 1;
                    ch
                };
                union = union.union(ch);
                channels.push(ch);
            }

            let slot = self.ring.acquire(alloc, width, height, union);
            let texture = self.ring.texture(slot);
            let mut tex_plan = TexturePlan::new(slot, texture, needs_prepass);

            for (&(i, cull), &ch) in chunk.iter().zip(&channels) {
                self.ring.retain(slot, ch);
                tex_plan.retains.push((slot, ch));
                let entry = &self.casters[i];
                let role = if entry.is_main_light {
                    AssignmentRole::MainLight
                } else {
                    AssignmentRole::AdditionalLight(entry.additional_light_index.unwrap_or(0))
                };
                tex_plan.assignments.push(assignment_for(entry, ch, role, cull));
            }

            finalize_lit_texture(&mut tex_plan, lit, &mut stats);

            if is_last && donate {
                last_lit_slot = Some(slot);
            } else {
                self.ring.close(slot);
            }
            plan.textures.push(tex_plan);
        }

        // Colored class: one shared RGB group, donated into the last lit
        // texture's free channels when possible.
        if !colored_group.is_empty() {
            let slot = self.ring.acquire(alloc, width, height, ChannelMask::RGB);
            let texture = self.ring.texture(slot);
            let donated = last_lit_slot == Some(slot);

            let tex_index = if donated {
                plan.textures.len() - 1
            } else {
                plan.textures
                    .push(TexturePlan::new(slot, texture, needs_prepass));
                plan.textures.len() - 1
            };

            self.ring.retain(slot, ChannelMask::RGB);
            let tex_plan = &mut plan.textures[tex_index];
            tex_plan.retains.push((slot, ChannelMask::RGB));
            for &(i, cull) in &colored_group {
                let entry = &self.casters[i];
                tex_plan.assignments.push(assignment_for(
                    entry,
                    ChannelMask::RGB,
                    AssignmentRole::Colored,
                    cull,
                ));
                if entry.desc.collect_realtime_shadows {
                    tex_plan.collect_write_mask =
                        tex_plan.collect_write_mask.union(ChannelMask::RGB);
                    tex_plan.collect_layers |= entry.desc.receiver_layers;
                    lit.add_collection_layers(entry.desc.receiver_layers);
                }
            }
            self.ring.close(slot);
        }

        // Remaining monochrome casters: 4 per texture in sort order.
        for chunk in standalone_group.chunks(CHANNELS_PER_TEXTURE) {
            let mut union = ChannelMask::NONE;
            for c in 0..chunk.len() {
                union = union.union(ChannelMask::single(c as u8));
            }
            let slot = self.ring.acquire(alloc, width, height, union);
            let texture = self.ring.texture(slot);
            let mut tex_plan = TexturePlan::new(slot, texture, needs_prepass);

            for (c, &(i, cull)) in chunk.iter().enumerate() {
                let ch = ChannelMask::single(c as u8);
                self.ring.retain(slot, ch);
                tex_plan.retains.push((slot, ch));
                let entry = &self.casters[i];
                tex_plan
                    .assignments
                    .push(assignment_for(entry, ch, AssignmentRole::Standalone, cull));
                if entry.desc.collect_realtime_shadows {
                    tex_plan.collect_write_mask = tex_plan.collect_write_mask.union(ch);
                    tex_plan.collect_layers |= entry.desc.receiver_layers;
                }
            }
            self.ring.close(slot);
            plan.textures.push(tex_plan);
        }

        debug_assert_eq!(plan.textures.len() as u32, planned_textures);
        stats.textures = plan.textures.len();
        plan.stats = stats.clone();
        self.last_stats = stats;
        Ok(plan)
    }

    /// Release every channel retained for this camera and reset the
    /// frame-scoped shared state. Must run after the last draw that reads a
    /// shadow-buffer texture.
    pub fn finish_camera(
        &mut self,
        plan: CollectionPlan,
        alloc: &mut dyn TemporaryTargetAllocator,
        lit: &mut LitShaderState,
        sink: &mut dyn MaterialSink,
    ) {
        debug_assert_eq!(
            self.active_camera,
            Some(plan.camera),
            "finish_camera for a camera that is not active"
        );
        for tex_plan in &plan.textures {
            for &(slot, mask) in &tex_plan.retains {
                self.ring.release(slot, mask, alloc);
            }
        }
        self.ring.end_camera();
        lit.clear(sink);
        self.active_camera = None;
    }

    /// Keep at most `MAX_LIT_SHADER_CASTERS` lit-shader entries (and a
    /// single main-light entry); the rest degrade to stand-alone
    /// application.
    fn apply_lit_shader_cap(
        &mut self,
        visible: &[(usize, CullingResults)],
        stats: &mut CollectionStats,
    ) {
        let mut lit_candidates: Vec<usize> = visible
            .iter()
            .map(|&(i, _)| i)
            .filter(|&i| {
                matches!(
                    self.casters[i].class,
                    CasterClass::LitCollect | CasterClass::LitStatic
                )
            })
            .collect();
        lit_candidates.sort_by_key(|&i| self.casters[i].sort_key());

        let mut kept = 0usize;
        let mut seen_main = false;
        for &i in &lit_candidates {
            let entry = &mut self.casters[i];
            let duplicate_main = entry.is_main_light && seen_main;
            if kept >= MAX_LIT_SHADER_CASTERS || duplicate_main {
                entry.class = CasterClass::Standalone;
                stats.demoted += 1;
                debug!(
                    "caster {:?} demoted from lit-shader class ({})",
                    entry.desc.id,
                    if duplicate_main {
                        "duplicate main light"
                    } else {
                        "class cap"
                    }
                );
            } else {
                if entry.is_main_light {
                    seen_main = true;
                }
                kept += 1;
            }
        }
    }

    pub fn debug_info(&self) -> String {
        format!(
            "Shadow Collection Scheduler:\n\
             - Resolution Scale: {:?}\n\
             - Format: {:?}\n\
             - Memory Budget: {:.1} MiB\n\
             - Stencil Mask: {:#04x}\n\
             - Registered Casters: {}\n\
             - Last Frame: {} visible, {} lit-shader, {} colored, {} standalone, {} demoted, {} textures",
            self.config.resolution_scale,
            self.config.format,
            self.config.max_memory_bytes as f64 / (1024.0 * 1024.0),
            self.config.stencil_mask,
            self.casters.len(),
            self.last_stats.visible,
            self.last_stats.lit_shader,
            self.last_stats.colored,
            self.last_stats.standalone,
            self.last_stats.demoted,
            self.last_stats.textures,
        )
    }
}

fn assignment_for(
    entry: &ShadowBufferEntry,
    channels: ChannelMask,
    role: AssignmentRole,
    cull: CullingResults,
) -> ChannelAssignment {
    ChannelAssignment {
        caster: entry.desc.id,
        material: entry.desc.material,
        channels,
        role,
        apply_method: entry.desc.apply_method,
        cull,
        caster_layers: entry.desc.caster_layers,
        receiver_layers: entry.desc.receiver_layers,
        collects_realtime: entry.desc.collect_realtime_shadows,
        uv_matrix: entry.desc.uv_matrix,
    }
}

/// Flush one lit texture's bindings into the lit-shader state.
///
/// An additional-light caster that cannot bind (second additional texture,
/// or an out-of-range slot) keeps its channel but falls back to stand-alone
/// application.
fn finalize_lit_texture(
    tex_plan: &mut TexturePlan,
    lit: &mut LitShaderState,
    stats: &mut CollectionStats,
) {
    for assignment in &mut tex_plan.assignments {
        match assignment.role {
            AssignmentRole::MainLight => {
                let channel = assignment.channels.channel_index().unwrap_or(3);
                lit.set_main_light_shadow(tex_plan.texture, channel, assignment.receiver_layers);
            }
            AssignmentRole::AdditionalLight(slot) => {
                let channel = assignment.channels.channel_index().unwrap_or(0);
                if !lit.set_additional_light_shadow(
                    slot,
                    tex_plan.texture,
                    channel,
                    assignment.receiver_layers,
                ) {
                    debug!(
                        "caster {:?} fell back to stand-alone application (additional shadow texture already bound)",
                        assignment.caster
                    );
                    assignment.role = AssignmentRole::Standalone;
                    stats.demoted += 1;
                }
            }
            AssignmentRole::Colored | AssignmentRole::Standalone => {}
        }
        if assignment.collects_realtime {
            tex_plan.collect_write_mask = tex_plan.collect_write_mask.union(assignment.channels);
            tex_plan.collect_layers |= assignment.receiver_layers;
            lit.add_collection_layers(assignment.receiver_layers);
        }
    }
}
