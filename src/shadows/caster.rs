// src/shadows/caster.rs
// Shadow caster descriptors and per-frame light-binding resolution
// RELEVANT FILES: src/shadows/scheduler/collect.rs, src/host/traits.rs

use glam::{Mat4, Vec3};

use crate::host::handles::{CasterId, LayerMask, LightHandle, MaterialHandle};
use crate::host::traits::VisibleLightSet;

/// Shadow color mode of a caster's mask.
#[repr(u32)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShadowColorMode {
    /// One buffer channel holds the mask.
    Monochrome = 0,
    /// The mask modulates the RGB channel group.
    Colored = 1,
}

impl ShadowColorMode {
    pub fn as_u32(self) -> u32 {
        self as u32
    }
}

/// How a caster's buffered mask reaches the screen.
#[repr(u32)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApplyMethod {
    /// The caster draws its own projector geometry over receivers.
    ByShadowProjectors = 0,
    /// The forward-lit pass samples the mask through global bindings.
    ByLitShaders = 1,
    /// The mask feeds other light projectors.
    ByLightProjectors = 2,
}

impl ApplyMethod {
    pub fn as_u32(self) -> u32 {
        self as u32
    }
}

/// Host-facing description of one shadow caster, refreshed by the owning
/// component whenever its projector moves or its light binding changes.
#[derive(Debug, Clone)]
pub struct ShadowCasterDesc {
    pub id: CasterId,
    pub material: MaterialHandle,
    /// Bound light; None means "use the main light".
    pub light: Option<LightHandle>,
    pub color_mode: ShadowColorMode,
    pub apply_method: ApplyMethod,
    pub collect_realtime_shadows: bool,
    /// Layers of objects whose geometry casts into the mask.
    pub caster_layers: LayerMask,
    /// Layers of objects the mask is applied to (and collected from).
    pub receiver_layers: LayerMask,
    /// World-space frustum corners, 4 near then 4 far.
    pub frustum_world: [Vec3; 8],
    /// View-projection matrix remapped to buffer UV space.
    pub uv_matrix: Mat4,
}

/// Scheduling class of a caster within one camera's collection pass.
/// Ordering is the sort tier: lit-shader feeders first, colored group,
/// then stand-alone monochrome casters.
#[repr(u32)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum CasterClass {
    LitCollect = 0,
    LitStatic = 1,
    Colored = 2,
    Standalone = 3,
}

/// Within-tier slot that orders a main-light caster after every
/// additional-light caster, so sequential channel packing leaves it the
/// alpha slot of its texture.
const MAIN_LIGHT_ORDER: u32 = 0x00FF_0000;

/// One registered caster plus its frame-scoped resolution state.
///
/// `visible_light_index`/`additional_light_index` are only valid within the
/// frame `setup_light_source` ran; querying them earlier is a scheduler bug.
#[derive(Debug, Clone)]
pub(crate) struct ShadowBufferEntry {
    pub desc: ShadowCasterDesc,
    pub visible_light_index: Option<usize>,
    pub additional_light_index: Option<u32>,
    pub is_main_light: bool,
    pub class: CasterClass,
    resolved: bool,
}

impl ShadowBufferEntry {
    pub fn new(desc: ShadowCasterDesc) -> Self {
        Self {
            desc,
            visible_light_index: None,
            additional_light_index: None,
            is_main_light: false,
            class: CasterClass::Standalone,
            resolved: false,
        }
    }

    /// Resolve this caster's light binding against the camera's visible
    /// lights. A caster whose light is missing from the set is simply not
    /// lit-visible this frame.
    pub fn setup_light_source(&mut self, lights: &VisibleLightSet) {
        self.visible_light_index = None;
        self.additional_light_index = None;
        self.is_main_light = false;

        match self.desc.light {
            None => {
                if let Some(index) = lights.main_light_index() {
                    self.visible_light_index = Some(index);
                    self.is_main_light = true;
                }
            }
            Some(handle) => {
                if let Some(index) = lights.find(handle) {
                    self.visible_light_index = Some(index);
                    self.is_main_light = lights.lights[index].is_main;
                    self.additional_light_index = lights.additional_slot(index);
                }
            }
        }
        self.resolved = true;
    }

    /// Reset frame-scoped state at the start of a camera's collection.
    pub fn begin_frame(&mut self) {
        self.resolved = false;
        self.class = CasterClass::Standalone;
    }

    /// True when this caster can feed the forward-lit pass: monochrome,
    /// applied by lit shaders, and bound to a resolvable light.
    pub fn is_lit_candidate(&self) -> bool {
        debug_assert!(self.resolved, "light resolution queried before setup");
        self.desc.apply_method == ApplyMethod::ByLitShaders
            && self.desc.color_mode == ShadowColorMode::Monochrome
            && (self.is_main_light || self.additional_light_index.is_some())
    }

    /// Tentative class before the scheduler applies the lit-shader cap.
    pub fn classify(&mut self) {
        self.class = if self.desc.color_mode == ShadowColorMode::Colored {
            CasterClass::Colored
        } else if self.is_lit_candidate() {
            if self.desc.collect_realtime_shadows {
                CasterClass::LitCollect
            } else {
                CasterClass::LitStatic
            }
        } else {
            CasterClass::Standalone
        };
    }

    /// Pure sort key: tier in the high byte, within-tier order below.
    /// Recomputed fresh during the sort call; never persisted.
    pub fn sort_key(&self) -> u32 {
        debug_assert!(self.resolved, "sort key queried before light resolution");
        let within = match self.class {
            CasterClass::LitCollect | CasterClass::LitStatic => {
                if self.is_main_light {
                    MAIN_LIGHT_ORDER
                } else {
                    self.additional_light_index.unwrap_or(0)
                }
            }
            CasterClass::Colored | CasterClass::Standalone => self.desc.id.0 & 0x00FF_FFFF,
        };
        ((self.class as u32) << 24) | within
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::traits::VisibleLight;

    fn desc(id: u32, light: Option<LightHandle>) -> ShadowCasterDesc {
        ShadowCasterDesc {
            id: CasterId(id),
            material: MaterialHandle(0),
            light,
            color_mode: ShadowColorMode::Monochrome,
            apply_method: ApplyMethod::ByLitShaders,
            collect_realtime_shadows: false,
            caster_layers: 1,
            receiver_layers: 1,
            frustum_world: [Vec3::ZERO; 8],
            uv_matrix: Mat4::IDENTITY,
        }
    }

    fn lights() -> VisibleLightSet {
        VisibleLightSet {
            lights: vec![
                VisibleLight {
                    handle: LightHandle(100),
                    is_main: true,
                },
                VisibleLight {
                    handle: LightHandle(101),
                    is_main: false,
                },
            ],
            additional_slots: vec![-1, 0],
        }
    }

    #[test]
    fn null_light_resolves_to_main() {
        let mut entry = ShadowBufferEntry::new(desc(1, None));
        entry.setup_light_source(&lights());
        assert!(entry.is_main_light);
        assert_eq!(entry.visible_light_index, Some(0));
        assert_eq!(entry.additional_light_index, None);
    }

    #[test]
    fn bound_light_resolves_additional_slot() {
        let mut entry = ShadowBufferEntry::new(desc(1, Some(LightHandle(101))));
        entry.setup_light_source(&lights());
        assert!(!entry.is_main_light);
        assert_eq!(entry.additional_light_index, Some(0));
        assert!(entry.is_lit_candidate());
    }

    #[test]
    fn missing_light_is_not_lit_visible() {
        let mut entry = ShadowBufferEntry::new(desc(1, Some(LightHandle(999))));
        entry.setup_light_source(&lights());
        assert!(!entry.is_lit_candidate());
        entry.classify();
        assert_eq!(entry.class, CasterClass::Standalone);
    }

    #[test]
    fn main_light_sorts_after_additional_within_tier() {
        let mut main = ShadowBufferEntry::new(desc(1, None));
        let mut add = ShadowBufferEntry::new(desc(2, Some(LightHandle(101))));
        let set = lights();
        main.setup_light_source(&set);
        add.setup_light_source(&set);
        main.classify();
        add.classify();
        assert!(main.sort_key() > add.sort_key());
        // Same tier regardless of the main-light ordering offset.
        assert_eq!(main.sort_key() >> 24, add.sort_key() >> 24);
    }

    #[test]
    fn colored_sorts_after_lit_tiers() {
        let mut lit = ShadowBufferEntry::new(desc(1, Some(LightHandle(101))));
        let mut colored = ShadowBufferEntry::new(desc(2, Some(LightHandle(101))));
        colored.desc.color_mode = ShadowColorMode::Colored;
        let set = lights();
        lit.setup_light_source(&set);
        colored.setup_light_source(&set);
        lit.classify();
        colored.classify();
        assert!(colored.sort_key() > lit.sort_key());
    }
}
