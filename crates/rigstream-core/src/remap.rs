//! Cross-rig remap engine: a precomputed channel-to-channel correspondence
//! between two descriptors, matched purely by hashed channel identity, with
//! optional spatial offsets.
//!
//! A destination channel with no matching source hash keeps its own default;
//! that is the documented fallback, not an error. Offset-tagged entries are
//! applied in rig space after the plain copies, as one combined list across
//! kinds ordered ancestors-before-descendants, mirroring the stream's
//! rig-space write contract: a descendant's translation must be solved
//! against its ancestor's final rotation, so the two kinds interleave.

use std::sync::Arc;

use hashbrown::HashMap;
use log::debug;

use crate::error::AccessError;
use crate::ids::ChannelId;
use crate::math::{quat_mul, quat_rotate_vec3, QUAT_IDENTITY};
use crate::rig::RigDescriptor;
use crate::stream::{AnimationStream, AnimationStreamMut};

/// One parent-relative mapped channel: source index -> destination index.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RemapEntry {
    pub src: u32,
    pub dst: u32,
}

/// Spatial offset for a remapped translation: scaled, then rotated into the
/// destination rig's space.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TranslationOffset {
    pub scale: [f32; 3],
    pub rotation: [f32; 4],
}

impl Default for TranslationOffset {
    fn default() -> Self {
        Self {
            scale: [1.0, 1.0, 1.0],
            rotation: QUAT_IDENTITY,
        }
    }
}

/// Pre/post rotations applied around a remapped rig-space rotation.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RotationOffset {
    pub pre: [f32; 4],
    pub post: [f32; 4],
}

impl Default for RotationOffset {
    fn default() -> Self {
        Self {
            pre: QUAT_IDENTITY,
            post: QUAT_IDENTITY,
        }
    }
}

/// The kind-tagged payload of one rig-space write. Carrying the offset
/// inline keeps the entry self-contained; there is no separate table to
/// index into.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum RigSpaceOp {
    Translation(TranslationOffset),
    Rotation(RotationOffset),
}

/// One offset-tagged channel applied in rig space.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RigSpaceEntry {
    pub src: u32,
    pub dst: u32,
    pub op: RigSpaceOp,
}

/// Offset overrides keyed by destination channel id. An id that matches no
/// destination joint is ignored (and logged) at build time.
#[derive(Clone, Debug, Default)]
pub struct RemapOffsets {
    pub translations: Vec<(ChannelId, TranslationOffset)>,
    pub rotations: Vec<(ChannelId, RotationOffset)>,
}

/// Immutable correspondence table between one (source, destination) rig
/// pair. Built once, shared read-only.
pub struct RemapTable {
    src: Arc<RigDescriptor>,
    dst: Arc<RigDescriptor>,

    // Parent-relative copies, applied first in any order.
    translations: Vec<RemapEntry>,
    rotations: Vec<RemapEntry>,
    scales: Vec<RemapEntry>,
    floats: Vec<RemapEntry>,
    ints: Vec<RemapEntry>,

    // Rig-space writes, both kinds in one ancestors-first sequence.
    rig_space: Vec<RigSpaceEntry>,
}

impl RemapTable {
    /// Build the table: hash every source channel, then resolve every
    /// destination channel in ordinal order. Partial matches are expected
    /// and deterministic given stable descriptors.
    pub fn build(
        src: Arc<RigDescriptor>,
        dst: Arc<RigDescriptor>,
        offsets: &RemapOffsets,
    ) -> Arc<RemapTable> {
        let translation_overrides: HashMap<ChannelId, TranslationOffset> =
            offsets.translations.iter().copied().collect();
        let rotation_overrides: HashMap<ChannelId, RotationOffset> =
            offsets.rotations.iter().copied().collect();
        for (id, _) in &offsets.translations {
            if dst.joint_index_of(*id).is_none() {
                debug!("translation offset for {id:?} matches no destination joint");
            }
        }
        for (id, _) in &offsets.rotations {
            if dst.joint_index_of(*id).is_none() {
                debug!("rotation offset for {id:?} matches no destination joint");
            }
        }

        let mut translations = Vec::new();
        let mut rotations = Vec::new();
        let mut scales = Vec::new();
        let mut rig_space = Vec::new();

        // Each source joint contributes one hash covering its T+R+S triple.
        // Destination ordinal order is topological, so pushing both kinds
        // per joint keeps `rig_space` ancestors-first across kinds.
        for (dst_index, joint) in dst.joints().iter().enumerate() {
            let Some(src_index) = src.joint_index_of(joint.id) else {
                debug!("no source joint for {:?}; keeping destination default", joint.id);
                continue;
            };
            let (src_u, dst_u) = (src_index as u32, dst_index as u32);

            if let Some(offset) = translation_overrides.get(&joint.id) {
                rig_space.push(RigSpaceEntry {
                    src: src_u,
                    dst: dst_u,
                    op: RigSpaceOp::Translation(*offset),
                });
            } else {
                translations.push(RemapEntry {
                    src: src_u,
                    dst: dst_u,
                });
            }

            if let Some(offset) = rotation_overrides.get(&joint.id) {
                rig_space.push(RigSpaceEntry {
                    src: src_u,
                    dst: dst_u,
                    op: RigSpaceOp::Rotation(*offset),
                });
            } else {
                rotations.push(RemapEntry {
                    src: src_u,
                    dst: dst_u,
                });
            }

            scales.push(RemapEntry {
                src: src_u,
                dst: dst_u,
            });
        }

        let mut floats = Vec::new();
        for (dst_index, id) in dst.float_ids().iter().enumerate() {
            if let Some(src_index) = src.float_index_of(*id) {
                floats.push(RemapEntry {
                    src: src_index as u32,
                    dst: dst_index as u32,
                });
            }
        }
        let mut ints = Vec::new();
        for (dst_index, id) in dst.int_ids().iter().enumerate() {
            if let Some(src_index) = src.int_index_of(*id) {
                ints.push(RemapEntry {
                    src: src_index as u32,
                    dst: dst_index as u32,
                });
            }
        }

        Arc::new(RemapTable {
            src,
            dst,
            translations,
            rotations,
            scales,
            floats,
            ints,
            rig_space,
        })
    }

    pub fn source_rig(&self) -> &Arc<RigDescriptor> {
        &self.src
    }

    pub fn destination_rig(&self) -> &Arc<RigDescriptor> {
        &self.dst
    }

    /// Parent-relative translation copies (offset-tagged channels are in
    /// `rig_space_entries` instead).
    pub fn translation_entries(&self) -> &[RemapEntry] {
        &self.translations
    }

    /// Parent-relative rotation copies.
    pub fn rotation_entries(&self) -> &[RemapEntry] {
        &self.rotations
    }

    pub fn scale_entries(&self) -> &[RemapEntry] {
        &self.scales
    }

    pub fn float_entries(&self) -> &[RemapEntry] {
        &self.floats
    }

    pub fn int_entries(&self) -> &[RemapEntry] {
        &self.ints
    }

    /// Offset-tagged rig-space writes, both kinds interleaved in
    /// ancestors-first destination order.
    pub fn rig_space_entries(&self) -> &[RigSpaceEntry] {
        &self.rig_space
    }
}

/// Copy every matched source channel into the destination stream, applying
/// offsets where tagged. Unmatched destination channels are untouched, so
/// callers wanting defaults there reset the destination first.
pub fn remap_stream(
    table: &RemapTable,
    src: &AnimationStream<'_>,
    dst: &mut AnimationStreamMut<'_>,
) -> Result<(), AccessError> {
    if !RigDescriptor::same_rig(&table.src, src.rig())
        || !RigDescriptor::same_rig(&table.dst, dst.rig())
    {
        return Err(AccessError::DescriptorMismatch);
    }

    // Parent-relative copies first.
    for e in &table.translations {
        let t = src.local_to_parent_translation(e.src as usize)?;
        dst.set_local_to_parent_translation(e.dst as usize, t)?;
    }
    for e in &table.rotations {
        let r = src.local_to_parent_rotation(e.src as usize)?;
        dst.set_local_to_parent_rotation(e.dst as usize, r)?;
    }
    for e in &table.scales {
        let s = src.local_to_parent_scale(e.src as usize)?;
        dst.set_local_to_parent_scale(e.dst as usize, s)?;
    }
    for e in &table.floats {
        let v = src.float(e.src as usize)?;
        dst.set_float(e.dst as usize, v)?;
    }
    for e in &table.ints {
        let v = src.int(e.src as usize)?;
        dst.set_int(e.dst as usize, v)?;
    }

    // Rig-space writes read the destination's current ancestor chain, so an
    // ancestor's rotation must land before a descendant's translation is
    // solved; the single interleaved sequence guarantees that.
    for e in &table.rig_space {
        match e.op {
            RigSpaceOp::Translation(offset) => {
                let t = src.local_to_rig_translation(e.src as usize)?;
                let scaled = [
                    t[0] * offset.scale[0],
                    t[1] * offset.scale[1],
                    t[2] * offset.scale[2],
                ];
                let v = quat_rotate_vec3(offset.rotation, scaled);
                dst.set_local_to_rig_translation(e.dst as usize, v)?;
            }
            RigSpaceOp::Rotation(offset) => {
                let r = src.local_to_rig_rotation(e.src as usize)?;
                let v = quat_mul(offset.pre, quat_mul(r, offset.post));
                dst.set_local_to_rig_rotation(e.dst as usize, v)?;
            }
        }
    }
    Ok(())
}
