//! Animation streams: non-owning views over a caller buffer, interpreted
//! through a shared rig descriptor.
//!
//! Two view types: `AnimationStream` (read) and `AnimationStreamMut`
//! (read/write). Both borrow their buffer, so exclusive mutation is enforced
//! by the borrow checker rather than a runtime flag.
//!
//! Rotation slots are expected to hold unit quaternions. Individual writes do
//! NOT re-normalize; normalization is guaranteed only at the accumulation
//! points in `ops` (`normalize_rotations`, `blend_weighted`). Rig-space
//! writes read the *current* ancestor chain, so when mixing rig-space writes
//! on one stream, ancestors must be written before descendants. That ordering
//! is a documented contract, not something this module enforces.

use crate::error::AccessError;
use crate::math::{quat_conjugate, quat_mul, Trs};
use crate::rig::RigDescriptor;

/// Read-only view = (descriptor ref, buffer ref).
#[derive(Clone, Copy)]
pub struct AnimationStream<'a> {
    rig: &'a RigDescriptor,
    buf: &'a [f32],
}

/// Mutable view over the same layout.
pub struct AnimationStreamMut<'a> {
    rig: &'a RigDescriptor,
    buf: &'a mut [f32],
}

#[inline]
fn check_len(rig: &RigDescriptor, len: usize) -> Result<(), AccessError> {
    if len != rig.slot_count() {
        return Err(AccessError::BufferSizeMismatch {
            expected: rig.slot_count(),
            got: len,
        });
    }
    Ok(())
}

#[inline]
fn check_joint(rig: &RigDescriptor, joint: usize) -> Result<(), AccessError> {
    if joint >= rig.joint_count() {
        return Err(AccessError::ChannelOutOfRange {
            kind: "joint",
            index: joint,
            count: rig.joint_count(),
        });
    }
    Ok(())
}

#[inline]
fn read_vec3(buf: &[f32], off: usize) -> [f32; 3] {
    [buf[off], buf[off + 1], buf[off + 2]]
}

#[inline]
fn read_vec4(buf: &[f32], off: usize) -> [f32; 4] {
    [buf[off], buf[off + 1], buf[off + 2], buf[off + 3]]
}

/// Joint transform in parent space, no bounds check (callers validate).
#[inline]
pub(crate) fn local_trs(rig: &RigDescriptor, buf: &[f32], joint: usize) -> Trs {
    Trs {
        translation: read_vec3(buf, rig.translation_offset(joint)),
        rotation: read_vec4(buf, rig.rotation_offset(joint)),
        scale: read_vec3(buf, rig.scale_offset(joint)),
    }
}

/// Joint transform in rig space: compose up the ancestor chain.
pub(crate) fn rig_trs(rig: &RigDescriptor, buf: &[f32], joint: usize) -> Trs {
    let local = local_trs(rig, buf, joint);
    match rig.joint(joint).parent {
        None => local,
        Some(parent) => rig_trs(rig, buf, parent).compose(&local),
    }
}

impl<'a> AnimationStream<'a> {
    /// Bind a read view; the buffer must be exactly the descriptor's slot
    /// count.
    pub fn bind(rig: &'a RigDescriptor, buf: &'a [f32]) -> Result<Self, AccessError> {
        check_len(rig, buf.len())?;
        Ok(Self { rig, buf })
    }

    #[inline]
    pub fn rig(&self) -> &'a RigDescriptor {
        self.rig
    }

    #[inline]
    pub(crate) fn buf(&self) -> &[f32] {
        self.buf
    }

    pub fn local_to_parent_translation(&self, joint: usize) -> Result<[f32; 3], AccessError> {
        check_joint(self.rig, joint)?;
        Ok(read_vec3(self.buf, self.rig.translation_offset(joint)))
    }

    pub fn local_to_parent_rotation(&self, joint: usize) -> Result<[f32; 4], AccessError> {
        check_joint(self.rig, joint)?;
        Ok(read_vec4(self.buf, self.rig.rotation_offset(joint)))
    }

    pub fn local_to_parent_scale(&self, joint: usize) -> Result<[f32; 3], AccessError> {
        check_joint(self.rig, joint)?;
        Ok(read_vec3(self.buf, self.rig.scale_offset(joint)))
    }

    /// Joint translation in rig space (composes the ancestor chain).
    pub fn local_to_rig_translation(&self, joint: usize) -> Result<[f32; 3], AccessError> {
        check_joint(self.rig, joint)?;
        Ok(rig_trs(self.rig, self.buf, joint).translation)
    }

    /// Joint rotation in rig space (composes the ancestor chain).
    pub fn local_to_rig_rotation(&self, joint: usize) -> Result<[f32; 4], AccessError> {
        check_joint(self.rig, joint)?;
        Ok(rig_trs(self.rig, self.buf, joint).rotation)
    }

    pub fn float(&self, channel: usize) -> Result<f32, AccessError> {
        if channel >= self.rig.float_count() {
            return Err(AccessError::ChannelOutOfRange {
                kind: "float",
                index: channel,
                count: self.rig.float_count(),
            });
        }
        Ok(self.buf[self.rig.float_offset(channel)])
    }

    /// Integer channels are stored float-encoded; reads round to nearest,
    /// which also finalizes any weighted accumulation still in the slot.
    pub fn int(&self, channel: usize) -> Result<i32, AccessError> {
        if channel >= self.rig.int_count() {
            return Err(AccessError::ChannelOutOfRange {
                kind: "int",
                index: channel,
                count: self.rig.int_count(),
            });
        }
        Ok(self.buf[self.rig.int_offset(channel)].round() as i32)
    }
}

impl<'a> AnimationStreamMut<'a> {
    pub fn bind(rig: &'a RigDescriptor, buf: &'a mut [f32]) -> Result<Self, AccessError> {
        check_len(rig, buf.len())?;
        Ok(Self { rig, buf })
    }

    #[inline]
    pub fn rig(&self) -> &'a RigDescriptor {
        self.rig
    }

    /// Downgrade to a read view of the same buffer.
    #[inline]
    pub fn as_read(&self) -> AnimationStream<'_> {
        AnimationStream {
            rig: self.rig,
            buf: self.buf,
        }
    }

    #[inline]
    pub(crate) fn buf(&self) -> &[f32] {
        self.buf
    }

    #[inline]
    pub(crate) fn buf_mut(&mut self) -> &mut [f32] {
        self.buf
    }

    // ---- parent-space accessors (O(1), no hierarchy walk) ----

    pub fn local_to_parent_translation(&self, joint: usize) -> Result<[f32; 3], AccessError> {
        self.as_read().local_to_parent_translation(joint)
    }

    pub fn local_to_parent_rotation(&self, joint: usize) -> Result<[f32; 4], AccessError> {
        self.as_read().local_to_parent_rotation(joint)
    }

    pub fn local_to_parent_scale(&self, joint: usize) -> Result<[f32; 3], AccessError> {
        self.as_read().local_to_parent_scale(joint)
    }

    pub fn set_local_to_parent_translation(
        &mut self,
        joint: usize,
        t: [f32; 3],
    ) -> Result<(), AccessError> {
        check_joint(self.rig, joint)?;
        let off = self.rig.translation_offset(joint);
        self.buf[off..off + 3].copy_from_slice(&t);
        Ok(())
    }

    pub fn set_local_to_parent_rotation(
        &mut self,
        joint: usize,
        r: [f32; 4],
    ) -> Result<(), AccessError> {
        check_joint(self.rig, joint)?;
        let off = self.rig.rotation_offset(joint);
        self.buf[off..off + 4].copy_from_slice(&r);
        Ok(())
    }

    pub fn set_local_to_parent_scale(
        &mut self,
        joint: usize,
        s: [f32; 3],
    ) -> Result<(), AccessError> {
        check_joint(self.rig, joint)?;
        let off = self.rig.scale_offset(joint);
        self.buf[off..off + 3].copy_from_slice(&s);
        Ok(())
    }

    // ---- rig-space accessors ----

    pub fn local_to_rig_translation(&self, joint: usize) -> Result<[f32; 3], AccessError> {
        self.as_read().local_to_rig_translation(joint)
    }

    pub fn local_to_rig_rotation(&self, joint: usize) -> Result<[f32; 4], AccessError> {
        self.as_read().local_to_rig_rotation(joint)
    }

    /// Write a rig-space translation by solving the parent-relative value
    /// against the current ancestor chain. Ancestors first when mixing
    /// rig-space writes.
    pub fn set_local_to_rig_translation(
        &mut self,
        joint: usize,
        t: [f32; 3],
    ) -> Result<(), AccessError> {
        check_joint(self.rig, joint)?;
        let local = match self.rig.joint(joint).parent {
            None => t,
            Some(parent) => rig_trs(self.rig, self.buf, parent).inverse_transform_point(t),
        };
        self.set_local_to_parent_translation(joint, local)
    }

    /// Write a rig-space rotation by solving the parent-relative value
    /// against the current ancestor chain.
    pub fn set_local_to_rig_rotation(
        &mut self,
        joint: usize,
        r: [f32; 4],
    ) -> Result<(), AccessError> {
        check_joint(self.rig, joint)?;
        let local = match self.rig.joint(joint).parent {
            None => r,
            Some(parent) => {
                let parent_rot = rig_trs(self.rig, self.buf, parent).rotation;
                quat_mul(quat_conjugate(parent_rot), r)
            }
        };
        self.set_local_to_parent_rotation(joint, local)
    }

    // ---- custom channels ----

    pub fn float(&self, channel: usize) -> Result<f32, AccessError> {
        self.as_read().float(channel)
    }

    pub fn int(&self, channel: usize) -> Result<i32, AccessError> {
        self.as_read().int(channel)
    }

    pub fn set_float(&mut self, channel: usize, v: f32) -> Result<(), AccessError> {
        if channel >= self.rig.float_count() {
            return Err(AccessError::ChannelOutOfRange {
                kind: "float",
                index: channel,
                count: self.rig.float_count(),
            });
        }
        let off = self.rig.float_offset(channel);
        self.buf[off] = v;
        Ok(())
    }

    pub fn set_int(&mut self, channel: usize, v: i32) -> Result<(), AccessError> {
        if channel >= self.rig.int_count() {
            return Err(AccessError::ChannelOutOfRange {
                kind: "int",
                index: channel,
                count: self.rig.int_count(),
            });
        }
        let off = self.rig.int_offset(channel);
        self.buf[off] = v as f32;
        Ok(())
    }

    // ---- bulk operations ----

    /// Bulk copy from a stream sharing this descriptor.
    pub fn copy_from(&mut self, src: &AnimationStream<'_>) -> Result<(), AccessError> {
        if !RigDescriptor::same_rig(self.rig, src.rig) {
            return Err(AccessError::DescriptorMismatch);
        }
        self.buf.copy_from_slice(src.buf);
        Ok(())
    }

    /// Reset the whole buffer to the descriptor's default pose.
    pub fn reset_to_defaults(&mut self) {
        self.buf.copy_from_slice(self.rig.default_pose());
    }
}
