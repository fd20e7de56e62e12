//! Rig descriptor: immutable joint hierarchy plus hashed binding tables.
//!
//! A descriptor is built once from author-side definitions, validated, and
//! then shared read-only (via `Arc`) across every stream of that skeleton.
//! It also fixes the flat stream layout:
//! `translations(3f/joint) | rotations(4f/joint) | scales(3f/joint) | floats | ints`.

use std::sync::Arc;

use hashbrown::HashMap;
use serde::{Deserialize, Serialize};

use crate::error::BuildError;
use crate::ids::{ChannelHasher, ChannelId};
use crate::math::QUAT_IDENTITY;

fn default_translation() -> [f32; 3] {
    [0.0, 0.0, 0.0]
}
fn default_rotation() -> [f32; 4] {
    QUAT_IDENTITY
}
fn default_scale() -> [f32; 3] {
    [1.0, 1.0, 1.0]
}

/// Author-side joint definition. `name` is the full hierarchical path and is
/// what the channel hasher runs over.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct JointDef {
    pub name: String,
    /// Index of the parent joint; `None` marks the root.
    #[serde(default)]
    pub parent: Option<usize>,
    #[serde(default = "default_translation")]
    pub default_translation: [f32; 3],
    #[serde(default = "default_rotation")]
    pub default_rotation: [f32; 4],
    #[serde(default = "default_scale")]
    pub default_scale: [f32; 3],
}

impl JointDef {
    pub fn new(name: &str, parent: Option<usize>) -> Self {
        Self {
            name: name.to_string(),
            parent,
            default_translation: default_translation(),
            default_rotation: default_rotation(),
            default_scale: default_scale(),
        }
    }

    pub fn with_translation(mut self, t: [f32; 3]) -> Self {
        self.default_translation = t;
        self
    }

    pub fn with_rotation(mut self, r: [f32; 4]) -> Self {
        self.default_rotation = r;
        self
    }

    pub fn with_scale(mut self, s: [f32; 3]) -> Self {
        self.default_scale = s;
        self
    }
}

/// Custom scalar float channel definition.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct CustomFloatDef {
    pub name: String,
    #[serde(default)]
    pub default: f32,
}

/// Custom integer channel definition (stored float-encoded in streams).
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct CustomIntDef {
    pub name: String,
    #[serde(default)]
    pub default: i32,
}

/// The five channel kinds a rig binds. Closed set; remap dispatch matches on
/// this rather than anything open-ended.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub enum ChannelKind {
    Translation,
    Rotation,
    Scale,
    Float,
    Int,
}

/// Validated, immutable joint entry.
#[derive(Clone, Debug)]
pub struct Joint {
    pub id: ChannelId,
    pub parent: Option<usize>,
    pub default_translation: [f32; 3],
    pub default_rotation: [f32; 4],
    pub default_scale: [f32; 3],
}

/// Immutable shared rig descriptor. Never mutated after `build`.
#[derive(Debug)]
pub struct RigDescriptor {
    joints: Vec<Joint>,
    float_ids: Vec<ChannelId>,
    float_defaults: Vec<f32>,
    int_ids: Vec<ChannelId>,
    int_defaults: Vec<i32>,

    // Hash -> storage index, one table per id namespace.
    joint_lookup: HashMap<ChannelId, usize>,
    float_lookup: HashMap<ChannelId, usize>,
    int_lookup: HashMap<ChannelId, usize>,

    /// Whole default pose materialized in stream layout.
    default_pose: Vec<f32>,
}

impl RigDescriptor {
    /// Validate definitions and build a shared descriptor.
    ///
    /// Rules: non-empty hierarchy, the root (and only the root) at index 0,
    /// every parent index strictly below its child, unique ids per kind.
    pub fn build(
        joints: &[JointDef],
        floats: &[CustomFloatDef],
        ints: &[CustomIntDef],
        hasher: ChannelHasher,
    ) -> Result<Arc<Self>, BuildError> {
        if joints.is_empty() {
            return Err(BuildError::EmptyHierarchy);
        }
        if joints[0].parent.is_some() {
            return Err(BuildError::MissingRoot);
        }

        let mut built: Vec<Joint> = Vec::with_capacity(joints.len());
        let mut joint_lookup = HashMap::with_capacity(joints.len());
        for (index, def) in joints.iter().enumerate() {
            match def.parent {
                None if index != 0 => return Err(BuildError::MultipleRoots { index }),
                Some(parent) if parent >= index => {
                    return Err(BuildError::ParentOutOfOrder { index, parent })
                }
                _ => {}
            }
            let id = hasher(&def.name);
            if joint_lookup.insert(id, index).is_some() {
                return Err(BuildError::DuplicateId {
                    id,
                    name: def.name.clone(),
                });
            }
            built.push(Joint {
                id,
                parent: def.parent,
                default_translation: def.default_translation,
                default_rotation: def.default_rotation,
                default_scale: def.default_scale,
            });
        }

        let mut float_ids = Vec::with_capacity(floats.len());
        let mut float_defaults = Vec::with_capacity(floats.len());
        let mut float_lookup = HashMap::with_capacity(floats.len());
        for (index, def) in floats.iter().enumerate() {
            let id = hasher(&def.name);
            if float_lookup.insert(id, index).is_some() {
                return Err(BuildError::DuplicateId {
                    id,
                    name: def.name.clone(),
                });
            }
            float_ids.push(id);
            float_defaults.push(def.default);
        }

        let mut int_ids = Vec::with_capacity(ints.len());
        let mut int_defaults = Vec::with_capacity(ints.len());
        let mut int_lookup = HashMap::with_capacity(ints.len());
        for (index, def) in ints.iter().enumerate() {
            let id = hasher(&def.name);
            if int_lookup.insert(id, index).is_some() {
                return Err(BuildError::DuplicateId {
                    id,
                    name: def.name.clone(),
                });
            }
            int_ids.push(id);
            int_defaults.push(def.default);
        }

        let mut rig = Self {
            joints: built,
            float_ids,
            float_defaults,
            int_ids,
            int_defaults,
            joint_lookup,
            float_lookup,
            int_lookup,
            default_pose: Vec::new(),
        };
        rig.default_pose = rig.materialize_default_pose();
        Ok(Arc::new(rig))
    }

    /// `build` with the default FNV-1a channel hasher.
    pub fn build_default(
        joints: &[JointDef],
        floats: &[CustomFloatDef],
        ints: &[CustomIntDef],
    ) -> Result<Arc<Self>, BuildError> {
        Self::build(joints, floats, ints, crate::ids::hash_channel_name)
    }

    fn materialize_default_pose(&self) -> Vec<f32> {
        let mut buf = vec![0.0f32; self.slot_count()];
        for (j, joint) in self.joints.iter().enumerate() {
            buf[self.translation_offset(j)..self.translation_offset(j) + 3]
                .copy_from_slice(&joint.default_translation);
            buf[self.rotation_offset(j)..self.rotation_offset(j) + 4]
                .copy_from_slice(&joint.default_rotation);
            buf[self.scale_offset(j)..self.scale_offset(j) + 3]
                .copy_from_slice(&joint.default_scale);
        }
        for (c, v) in self.float_defaults.iter().enumerate() {
            buf[self.float_offset(c)] = *v;
        }
        for (c, v) in self.int_defaults.iter().enumerate() {
            buf[self.int_offset(c)] = *v as f32;
        }
        buf
    }

    #[inline]
    pub fn joint_count(&self) -> usize {
        self.joints.len()
    }

    #[inline]
    pub fn float_count(&self) -> usize {
        self.float_ids.len()
    }

    #[inline]
    pub fn int_count(&self) -> usize {
        self.int_ids.len()
    }

    #[inline]
    pub fn joints(&self) -> &[Joint] {
        &self.joints
    }

    #[inline]
    pub fn joint(&self, index: usize) -> &Joint {
        &self.joints[index]
    }

    #[inline]
    pub fn float_ids(&self) -> &[ChannelId] {
        &self.float_ids
    }

    #[inline]
    pub fn int_ids(&self) -> &[ChannelId] {
        &self.int_ids
    }

    #[inline]
    pub fn float_default(&self, index: usize) -> f32 {
        self.float_defaults[index]
    }

    #[inline]
    pub fn int_default(&self, index: usize) -> i32 {
        self.int_defaults[index]
    }

    /// Storage index of the joint carrying this id, if any.
    #[inline]
    pub fn joint_index_of(&self, id: ChannelId) -> Option<usize> {
        self.joint_lookup.get(&id).copied()
    }

    #[inline]
    pub fn float_index_of(&self, id: ChannelId) -> Option<usize> {
        self.float_lookup.get(&id).copied()
    }

    #[inline]
    pub fn int_index_of(&self, id: ChannelId) -> Option<usize> {
        self.int_lookup.get(&id).copied()
    }

    // ---- stream layout ----

    #[inline]
    pub fn translation_offset(&self, joint: usize) -> usize {
        3 * joint
    }

    #[inline]
    pub fn rotation_offset(&self, joint: usize) -> usize {
        3 * self.joints.len() + 4 * joint
    }

    #[inline]
    pub fn scale_offset(&self, joint: usize) -> usize {
        7 * self.joints.len() + 3 * joint
    }

    #[inline]
    pub fn float_offset(&self, channel: usize) -> usize {
        10 * self.joints.len() + channel
    }

    #[inline]
    pub fn int_offset(&self, channel: usize) -> usize {
        10 * self.joints.len() + self.float_ids.len() + channel
    }

    /// Total float slots a stream buffer for this rig must hold.
    #[inline]
    pub fn slot_count(&self) -> usize {
        10 * self.joints.len() + self.float_ids.len() + self.int_ids.len()
    }

    /// The whole default pose, laid out exactly like a stream buffer.
    #[inline]
    pub fn default_pose(&self) -> &[f32] {
        &self.default_pose
    }

    /// Descriptor identity: streams and remap tables compare by reference,
    /// not structurally.
    #[inline]
    pub fn same_rig(a: &RigDescriptor, b: &RigDescriptor) -> bool {
        std::ptr::eq(a, b)
    }

    /// True if `ancestor` appears on `joint`'s parent chain (or equals it).
    pub fn is_ancestor_or_self(&self, ancestor: usize, joint: usize) -> bool {
        let mut cur = Some(joint);
        while let Some(i) = cur {
            if i == ancestor {
                return true;
            }
            cur = self.joints[i].parent;
        }
        false
    }
}
