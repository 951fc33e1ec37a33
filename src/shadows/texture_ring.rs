// src/shadows/texture_ring.rs
// Reference-counted ring of pooled shadow-buffer textures, shared by up to
// four casters per texture (one per RGBA channel)
// RELEVANT FILES: src/host/traits.rs, src/shadows/scheduler/collect.rs

use log::debug;
use wgpu::TextureFormat;

use crate::host::handles::TextureHandle;
use crate::host::traits::TemporaryTargetAllocator;

/// Mask over the four color channels of a shadow-buffer texture.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ChannelMask(u8);

impl ChannelMask {
    pub const NONE: Self = Self(0);
    pub const R: Self = Self(0b0001);
    pub const G: Self = Self(0b0010);
    pub const B: Self = Self(0b0100);
    pub const A: Self = Self(0b1000);
    pub const RGB: Self = Self(0b0111);
    pub const RGBA: Self = Self(0b1111);

    /// Single-channel mask for channel index 0..=3.
    pub fn single(index: u8) -> Self {
        debug_assert!(index < 4, "channel index out of range");
        Self(1 << index)
    }

    pub fn bits(self) -> u8 {
        self.0
    }

    pub fn is_empty(self) -> bool {
        self.0 == 0
    }

    pub fn count(self) -> u32 {
        self.0.count_ones()
    }

    pub fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    pub fn overlaps(self, other: Self) -> bool {
        self.0 & other.0 != 0
    }

    pub fn union(self, other: Self) -> Self {
        Self(self.0 | other.0)
    }

    pub fn remove(self, other: Self) -> Self {
        Self(self.0 & !other.0)
    }

    /// Channel index when the mask selects exactly one channel.
    pub fn channel_index(self) -> Option<u8> {
        (self.0.count_ones() == 1).then(|| self.0.trailing_zeros() as u8)
    }

    /// Component-wise f32 mask for shader consumption.
    pub fn to_vec4(self) -> [f32; 4] {
        let mut v = [0.0; 4];
        for (i, slot) in v.iter_mut().enumerate() {
            if self.0 & (1 << i) != 0 {
                *slot = 1.0;
            }
        }
        v
    }
}

/// Index of a slot within one camera's ring. Valid only for the camera
/// frame it was acquired in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SlotId(pub usize);

#[derive(Debug)]
struct ChannelSlot {
    texture: TextureHandle,
    width: u32,
    height: u32,
    retained: ChannelMask,
    /// Open slots accept further channel packing; closed slots are finalized
    /// for this frame and only drain.
    open: bool,
    live: bool,
}

/// Per-camera pool of shadow-buffer textures with per-channel retain masks.
///
/// A slot's texture is returned to the host pool exactly when its retain
/// mask drops to zero; every slot must be drained by end of camera
/// rendering.
#[derive(Debug)]
pub struct ShadowTextureRing {
    slots: Vec<ChannelSlot>,
    format: TextureFormat,
}

impl ShadowTextureRing {
    pub fn new(format: TextureFormat) -> Self {
        Self {
            slots: Vec::new(),
            format,
        }
    }

    pub fn format(&self) -> TextureFormat {
        self.format
    }

    /// Acquire a slot with room for `needed` channels.
    ///
    /// Reuses an open slot whose dimensions match and whose retained
    /// channels do not overlap `needed` (for single-channel requests this is
    /// the "fewer than four retains" rule); otherwise allocates a fresh
    /// texture from the host pool.
    pub fn acquire(
        &mut self,
        alloc: &mut dyn TemporaryTargetAllocator,
        width: u32,
        height: u32,
        needed: ChannelMask,
    ) -> SlotId {
        debug_assert!(!needed.is_empty(), "acquire needs at least one channel");
        for (i, slot) in self.slots.iter().enumerate() {
            if slot.live
                && slot.open
                && slot.width == width
                && slot.height == height
                && !slot.retained.overlaps(needed)
            {
                return SlotId(i);
            }
        }
        let texture = alloc.allocate(width, height, self.format);
        self.slots.push(ChannelSlot {
            texture,
            width,
            height,
            retained: ChannelMask::NONE,
            open: true,
            live: true,
        });
        SlotId(self.slots.len() - 1)
    }

    /// Stop packing further channels into `slot` this frame.
    pub fn close(&mut self, slot: SlotId) {
        self.slots[slot.0].open = false;
    }

    pub fn texture(&self, slot: SlotId) -> TextureHandle {
        self.slots[slot.0].texture
    }

    pub fn retained(&self, slot: SlotId) -> ChannelMask {
        self.slots[slot.0].retained
    }

    /// Mark `channels` as in use on `slot`. Double-retaining a channel bit
    /// is a scheduler bug.
    pub fn retain(&mut self, slot: SlotId, channels: ChannelMask) {
        let entry = &mut self.slots[slot.0];
        debug_assert!(entry.live, "retain on a released slot");
        debug_assert!(
            !entry.retained.overlaps(channels),
            "channel bit retained twice on one texture"
        );
        entry.retained = entry.retained.union(channels);
    }

    /// Release `channels` on `slot`; when the retain mask reaches zero the
    /// texture is returned to the host pool immediately.
    pub fn release(
        &mut self,
        slot: SlotId,
        channels: ChannelMask,
        alloc: &mut dyn TemporaryTargetAllocator,
    ) {
        let entry = &mut self.slots[slot.0];
        debug_assert!(entry.live, "release on a released slot");
        debug_assert!(
            entry.retained.contains(channels),
            "release of channels that were never retained"
        );
        entry.retained = entry.retained.remove(channels);
        if entry.retained.is_empty() {
            entry.live = false;
            entry.open = false;
            alloc.release(entry.texture);
            debug!("shadow buffer texture {:?} returned to pool", entry.texture);
        }
    }

    pub fn live_count(&self) -> usize {
        self.slots.iter().filter(|s| s.live).count()
    }

    /// Drop all per-camera slot records. A slot still holding retained
    /// channels here is a leak.
    pub fn end_camera(&mut self) {
        debug_assert_eq!(
            self.live_count(),
            0,
            "shadow buffer slot retained past end of camera rendering"
        );
        self.slots.clear();
    }
}
