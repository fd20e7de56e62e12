//! External clip-sampling seam and the per-(rig, clip) instance cache
//! collaborator.
//!
//! Curve decoding lives outside the core; a decoder implements `ClipSampler`
//! and fills streams the core treats like any other input. The cache is
//! identity-keyed and cache-agnostic from the sampler's point of view;
//! eviction is the host's call (explicit `clear`/`remove_rig` only).

use std::sync::Arc;

use hashbrown::HashMap;

use crate::error::AccessError;
use crate::rig::RigDescriptor;
use crate::stream::AnimationStreamMut;

/// Opaque clip identity supplied by the host's asset system.
pub type ClipId = u64;

/// Implemented by the external decoder: fill `out` with the pose at `time`.
pub trait ClipSampler {
    fn duration(&self) -> f32;
    fn sample_into(&self, time: f32, out: &mut AnimationStreamMut<'_>) -> Result<(), AccessError>;
}

/// Identity-keyed map of per-(rig, clip) host data, e.g. decompression
/// state or binding scratch. Rig identity is the descriptor allocation, not
/// structural equality.
pub struct ClipInstanceCache<T> {
    map: HashMap<(usize, ClipId), T>,
}

impl<T> Default for ClipInstanceCache<T> {
    fn default() -> Self {
        Self {
            map: HashMap::new(),
        }
    }
}

impl<T> ClipInstanceCache<T> {
    pub fn new() -> Self {
        Self::default()
    }

    fn key(rig: &Arc<RigDescriptor>, clip: ClipId) -> (usize, ClipId) {
        (Arc::as_ptr(rig) as usize, clip)
    }

    pub fn get(&self, rig: &Arc<RigDescriptor>, clip: ClipId) -> Option<&T> {
        self.map.get(&Self::key(rig, clip))
    }

    pub fn get_or_insert_with(
        &mut self,
        rig: &Arc<RigDescriptor>,
        clip: ClipId,
        init: impl FnOnce() -> T,
    ) -> &mut T {
        self.map.entry(Self::key(rig, clip)).or_insert_with(init)
    }

    /// Drop every instance built against this rig (e.g. on rig unload).
    pub fn remove_rig(&mut self, rig: &Arc<RigDescriptor>) {
        let rig_key = Arc::as_ptr(rig) as usize;
        self.map.retain(|(r, _), _| *r != rig_key);
    }

    pub fn clear(&mut self) {
        self.map.clear();
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }
}
