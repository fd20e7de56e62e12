//! Per-channel masks for layered blending.
//!
//! One bit per channel, grouped by kind. Sized from a descriptor; a mask
//! built for one rig is meaningless against another (the mixer only consults
//! bit positions, so the caller keeps rig and mask paired).

use crate::rig::RigDescriptor;

#[derive(Clone, Debug, Default, PartialEq)]
struct BitWords {
    words: Vec<u64>,
    len: usize,
}

impl BitWords {
    fn new(len: usize, on: bool) -> Self {
        let word_count = len.div_ceil(64);
        let fill = if on { u64::MAX } else { 0 };
        let mut words = vec![fill; word_count];
        if on && len % 64 != 0 {
            // Clear bits past the channel count so equality stays meaningful.
            if let Some(last) = words.last_mut() {
                *last = (1u64 << (len % 64)) - 1;
            }
        }
        Self { words, len }
    }

    #[inline]
    fn get(&self, i: usize) -> bool {
        i < self.len && self.words[i / 64] & (1u64 << (i % 64)) != 0
    }

    #[inline]
    fn set(&mut self, i: usize, on: bool) {
        if i >= self.len {
            return;
        }
        let bit = 1u64 << (i % 64);
        if on {
            self.words[i / 64] |= bit;
        } else {
            self.words[i / 64] &= !bit;
        }
    }
}

/// Channel mask covering all five kinds of a rig.
#[derive(Clone, Debug, PartialEq)]
pub struct ChannelMask {
    translations: BitWords,
    rotations: BitWords,
    scales: BitWords,
    floats: BitWords,
    ints: BitWords,
}

impl ChannelMask {
    /// Every channel masked in.
    pub fn all(rig: &RigDescriptor) -> Self {
        Self::filled(rig, true)
    }

    /// Every channel masked out.
    pub fn none(rig: &RigDescriptor) -> Self {
        Self::filled(rig, false)
    }

    fn filled(rig: &RigDescriptor, on: bool) -> Self {
        Self {
            translations: BitWords::new(rig.joint_count(), on),
            rotations: BitWords::new(rig.joint_count(), on),
            scales: BitWords::new(rig.joint_count(), on),
            floats: BitWords::new(rig.float_count(), on),
            ints: BitWords::new(rig.int_count(), on),
        }
    }

    /// Set all three transform channels of one joint at once.
    pub fn set_joint(&mut self, joint: usize, on: bool) {
        self.translations.set(joint, on);
        self.rotations.set(joint, on);
        self.scales.set(joint, on);
    }

    /// Set a joint and its whole subtree (e.g. masking in an upper body).
    pub fn set_joint_recursive(&mut self, rig: &RigDescriptor, joint: usize, on: bool) {
        for i in joint..rig.joint_count() {
            if rig.is_ancestor_or_self(joint, i) {
                self.set_joint(i, on);
            }
        }
    }

    pub fn set_translation(&mut self, joint: usize, on: bool) {
        self.translations.set(joint, on);
    }

    pub fn set_rotation(&mut self, joint: usize, on: bool) {
        self.rotations.set(joint, on);
    }

    pub fn set_scale(&mut self, joint: usize, on: bool) {
        self.scales.set(joint, on);
    }

    pub fn set_float(&mut self, channel: usize, on: bool) {
        self.floats.set(channel, on);
    }

    pub fn set_int(&mut self, channel: usize, on: bool) {
        self.ints.set(channel, on);
    }

    #[inline]
    pub fn translation(&self, joint: usize) -> bool {
        self.translations.get(joint)
    }

    #[inline]
    pub fn rotation(&self, joint: usize) -> bool {
        self.rotations.get(joint)
    }

    #[inline]
    pub fn scale(&self, joint: usize) -> bool {
        self.scales.get(joint)
    }

    #[inline]
    pub fn float(&self, channel: usize) -> bool {
        self.floats.get(channel)
    }

    #[inline]
    pub fn int(&self, channel: usize) -> bool {
        self.ints.get(channel)
    }
}
