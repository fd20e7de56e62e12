//! rigstream-core (engine-agnostic)
//!
//! Represents and manipulates articulated skeletal poses as flat buffers
//! ("animation streams") interpreted through shared, immutable rig
//! descriptors. Provides the pose algebra (weighted blend, additive
//! composition, normalization), masked layer mixing, 1D/2D blend trees, and
//! a hashed cross-rig remap engine. Clip decoding, scheduling and rendering
//! live in the host; every operation here is a synchronous, deterministic
//! function of its explicit inputs.

pub mod blend_tree;
pub mod clip;
pub mod config;
pub mod error;
pub mod ids;
pub mod layers;
pub mod mask;
pub mod math;
pub mod ops;
pub mod remap;
pub mod rig;
pub mod stored_rig;
pub mod stream;

// Re-exports for consumers (adapters)
pub use blend_tree::{
    BlendTree, BlendTree1d, BlendTree2d, BlendTreeInstance, ConfigState, Motion1d, Motion2d,
    MotionSource,
};
pub use clip::{ClipId, ClipInstanceCache, ClipSampler};
pub use config::Config;
pub use error::{AccessError, BuildError, ConfigError, EvalError};
pub use ids::{hash_channel_name, ChannelHasher, ChannelId};
pub use layers::{evaluate_layers, BlendingMode, MixerLayer};
pub use mask::ChannelMask;
pub use ops::{add_scaled, blend, blend_weighted, normalize_rotations};
pub use remap::{
    remap_stream, RemapEntry, RemapOffsets, RemapTable, RigSpaceEntry, RigSpaceOp, RotationOffset,
    TranslationOffset,
};
pub use rig::{ChannelKind, CustomFloatDef, CustomIntDef, Joint, JointDef, RigDescriptor};
pub use stored_rig::parse_stored_rig_json;
pub use stream::{AnimationStream, AnimationStreamMut};
