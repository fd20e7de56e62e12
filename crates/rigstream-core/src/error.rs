//! Error contracts.
//!
//! Build-time problems (`BuildError`) are fatal and never auto-recovered;
//! per-call stream problems (`AccessError`) fail the call immediately rather
//! than risk corrupting a shared buffer. An unmatched channel during rig
//! remapping is deliberately NOT an error (see `remap`).

use thiserror::Error;

use crate::ids::ChannelId;

/// Fatal validation failures when building a descriptor or a blend tree.
#[derive(Clone, Debug, Error, PartialEq)]
pub enum BuildError {
    #[error("joint hierarchy is empty")]
    EmptyHierarchy,
    #[error("joint {index} is a second root; exactly one parentless joint is allowed")]
    MultipleRoots { index: usize },
    #[error("joint 0 must be the root (it has a parent)")]
    MissingRoot,
    #[error("joint {index} references parent {parent}, ancestors must precede descendants")]
    ParentOutOfOrder { index: usize, parent: usize },
    #[error("duplicate channel id {id:?} for '{name}'")]
    DuplicateId { id: ChannelId, name: String },
    #[error("blend tree has no motions")]
    NoMotions,
    #[error("blend tree thresholds must be strictly ascending (motion {index})")]
    UnsortedThresholds { index: usize },
}

/// Fatal per-call failures when touching a stream.
#[derive(Clone, Debug, Error, PartialEq)]
pub enum AccessError {
    #[error("stream buffer holds {got} slots, descriptor requires {expected}")]
    BufferSizeMismatch { expected: usize, got: usize },
    #[error("{kind} index {index} out of range (count {count})")]
    ChannelOutOfRange {
        kind: &'static str,
        index: usize,
        count: usize,
    },
    #[error("streams are bound to different rig descriptors")]
    DescriptorMismatch,
}

/// Two-phase configuration violations: a rig must be bound before any asset
/// that depends on it, and both before the first evaluation.
#[derive(Clone, Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("rig descriptor is not bound yet")]
    RigNotBound,
    #[error("already configured; rebinding is not supported")]
    AlreadyConfigured,
    #[error("instance is not fully configured")]
    NotReady,
}

/// Combined error for evaluation entry points that validate both
/// configuration state and stream access.
#[derive(Clone, Debug, Error, PartialEq)]
pub enum EvalError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Access(#[from] AccessError),
    #[error("motion references clip slot {index}, only {count} provided")]
    ClipOutOfRange { index: usize, count: usize },
}
