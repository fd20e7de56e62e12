//! JSON wire format for rig definitions produced by the import pipeline.
//!
//! Schema:
//! ```json
//! {
//!   "joints": [
//!     { "name": "Root", "defaultTranslation": [0,0,0] },
//!     { "name": "Root/Hips", "parent": 0 }
//!   ],
//!   "floats": [ { "name": "Blink", "default": 0.0 } ],
//!   "ints":   [ { "name": "State", "default": 0 } ]
//! }
//! ```
//! Omitted defaults fall back to the identity pose.

use std::sync::Arc;

use serde::Deserialize;

use crate::ids::hash_channel_name;
use crate::math::QUAT_IDENTITY;
use crate::rig::{CustomFloatDef, CustomIntDef, JointDef, RigDescriptor};

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct StoredJoint {
    name: String,
    #[serde(default)]
    parent: Option<usize>,
    #[serde(default)]
    default_translation: Option<[f32; 3]>,
    #[serde(default)]
    default_rotation: Option<[f32; 4]>,
    #[serde(default)]
    default_scale: Option<[f32; 3]>,
}

#[derive(Deserialize)]
struct StoredRig {
    joints: Vec<StoredJoint>,
    #[serde(default)]
    floats: Vec<CustomFloatDef>,
    #[serde(default)]
    ints: Vec<CustomIntDef>,
}

/// Parse a stored rig JSON document and build a shared descriptor with the
/// default channel hasher.
pub fn parse_stored_rig_json(s: &str) -> Result<Arc<RigDescriptor>, String> {
    let stored: StoredRig = serde_json::from_str(s).map_err(|e| format!("parse error: {e}"))?;
    let joints: Vec<JointDef> = stored
        .joints
        .into_iter()
        .map(|j| JointDef {
            name: j.name,
            parent: j.parent,
            default_translation: j.default_translation.unwrap_or([0.0, 0.0, 0.0]),
            default_rotation: j.default_rotation.unwrap_or(QUAT_IDENTITY),
            default_scale: j.default_scale.unwrap_or([1.0, 1.0, 1.0]),
        })
        .collect();
    RigDescriptor::build(&joints, &stored.floats, &stored.ints, hash_channel_name)
        .map_err(|e| e.to_string())
}
