//! Evaluation sizing hints.

use serde::{Deserialize, Serialize};

/// Capacity hints for preallocated evaluation scratch. Hot paths never
/// allocate once warmed past these.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Config {
    /// Expected number of leaf clips reachable from one blend tree.
    pub scratch_leaf_weights: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            scratch_leaf_weights: 16,
        }
    }
}
