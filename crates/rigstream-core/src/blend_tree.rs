//! 1D and 2D blend trees, plus the two-phase configured instance that binds
//! them to a rig.
//!
//! Trees hold only weights and parameters; pose composition is a
//! `blend_weighted` over the clip streams an external sampler produced.
//! Nested trees (a motion that is itself a tree) receive parameter updates
//! recursively by name, and leaf weights are collected into reused buffers
//! so evaluation never reallocates after warmup.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::config::Config;
use crate::error::{BuildError, ConfigError, EvalError};
use crate::ops;
use crate::rig::RigDescriptor;
use crate::stream::{AnimationStream, AnimationStreamMut};

/// What a motion resolves to: an external clip slot, or a nested tree.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub enum MotionSource {
    /// Index into the clip-stream slice handed to `evaluate_into`.
    Clip(usize),
    SubTree1d(Box<BlendTree1d>),
    SubTree2d(Box<BlendTree2d>),
}

/// 1D motion: positioned on a scalar threshold axis.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Motion1d {
    pub source: MotionSource,
    pub threshold: f32,
    pub speed: f32,
    pub duration: f32,
}

/// 2D motion: positioned in the 2D parameter plane.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Motion2d {
    pub source: MotionSource,
    pub position: [f32; 2],
    pub speed: f32,
    pub duration: f32,
}

/// 1D blend tree: a scalar parameter cross-fades the two motions bracketing
/// it; outside the threshold range it clamps to the nearest motion at full
/// weight.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct BlendTree1d {
    pub parameter: String,
    motions: Vec<Motion1d>,
    value: f32,
    #[serde(skip)]
    weights: Vec<f32>,
    #[serde(skip, default = "dirty_default")]
    dirty: bool,
}

fn dirty_default() -> bool {
    true
}

impl BlendTree1d {
    /// Motions must be pre-sorted by strictly ascending threshold.
    pub fn new(parameter: &str, motions: Vec<Motion1d>) -> Result<Self, BuildError> {
        if motions.is_empty() {
            return Err(BuildError::NoMotions);
        }
        for i in 1..motions.len() {
            if motions[i].threshold <= motions[i - 1].threshold {
                return Err(BuildError::UnsortedThresholds { index: i });
            }
        }
        let weights = vec![0.0; motions.len()];
        let value = motions[0].threshold;
        Ok(Self {
            parameter: parameter.to_string(),
            motions,
            value,
            weights,
            dirty: true,
        })
    }

    pub fn motions(&self) -> &[Motion1d] {
        &self.motions
    }

    /// Update a named parameter; recurses into nested trees.
    pub fn set_parameter(&mut self, name: &str, value: f32) {
        if name == self.parameter && self.value != value {
            self.value = value;
            self.dirty = true;
        }
        for m in &mut self.motions {
            propagate_parameter(&mut m.source, name, value);
        }
    }

    /// Recompute weights if a parameter changed since the last evaluation.
    pub fn evaluate(&mut self) {
        if self.weights.len() != self.motions.len() {
            // Deserialized trees arrive with empty scratch.
            self.weights.resize(self.motions.len(), 0.0);
            self.dirty = true;
        }
        if self.dirty {
            self.compute_weights();
            self.dirty = false;
        }
        for m in &mut self.motions {
            evaluate_source(&mut m.source);
        }
    }

    fn compute_weights(&mut self) {
        let v = self.value;
        self.weights.fill(0.0);
        let first = self.motions[0].threshold;
        let last = self.motions[self.motions.len() - 1].threshold;
        if v <= first {
            self.weights[0] = 1.0;
            return;
        }
        if v >= last {
            let n = self.weights.len();
            self.weights[n - 1] = 1.0;
            return;
        }
        // v is strictly inside the range; find the bracketing pair.
        let hi = self
            .motions
            .iter()
            .position(|m| v <= m.threshold)
            .unwrap_or(self.motions.len() - 1);
        let lo = hi - 1;
        let span = self.motions[hi].threshold - self.motions[lo].threshold;
        let t = (v - self.motions[lo].threshold) / span;
        self.weights[lo] = 1.0 - t;
        self.weights[hi] = t;
    }

    /// Weights aligned with `motions()`. Valid after `evaluate`.
    pub fn weights(&self) -> &[f32] {
        &self.weights
    }

    /// Effective playback duration of the active bracket: a weighted
    /// harmonic combination of each motion's (speed, duration),
    /// `1/D = sum(w_i * speed_i / duration_i)`. Scaling the tree's overall
    /// rate therefore keeps its loop in phase.
    pub fn duration(&self) -> f32 {
        let mut inv = 0.0f32;
        for (m, w) in self.motions.iter().zip(&self.weights) {
            if *w <= 0.0 {
                continue;
            }
            let d = source_duration(&m.source).unwrap_or(m.duration);
            if d > 0.0 && m.speed > 0.0 {
                inv += w * m.speed / d;
            }
        }
        if inv > 0.0 {
            inv.recip()
        } else {
            0.0
        }
    }

    /// Append (clip slot, effective weight) pairs, multiplying through
    /// nested tree weights. `scale` is the weight of this tree in its
    /// parent.
    pub fn collect_leaf_weights(&self, scale: f32, out: &mut Vec<(usize, f32)>) {
        for (m, w) in self.motions.iter().zip(&self.weights) {
            let eff = scale * w;
            if eff <= 0.0 {
                continue;
            }
            collect_source(&m.source, eff, out);
        }
    }
}

/// 2D blend tree: gradient-band (inverse-projection) weighting over the full
/// motion set, recomputed only when a parameter changes.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct BlendTree2d {
    pub parameter_x: String,
    pub parameter_y: String,
    motions: Vec<Motion2d>,
    value: [f32; 2],
    #[serde(skip)]
    weights: Vec<f32>,
    #[serde(skip, default = "dirty_default")]
    dirty: bool,
}

impl BlendTree2d {
    pub fn new(
        parameter_x: &str,
        parameter_y: &str,
        motions: Vec<Motion2d>,
    ) -> Result<Self, BuildError> {
        if motions.is_empty() {
            return Err(BuildError::NoMotions);
        }
        let weights = vec![0.0; motions.len()];
        Ok(Self {
            parameter_x: parameter_x.to_string(),
            parameter_y: parameter_y.to_string(),
            motions,
            value: [0.0, 0.0],
            weights,
            dirty: true,
        })
    }

    pub fn motions(&self) -> &[Motion2d] {
        &self.motions
    }

    pub fn set_parameter(&mut self, name: &str, value: f32) {
        if name == self.parameter_x && self.value[0] != value {
            self.value[0] = value;
            self.dirty = true;
        }
        if name == self.parameter_y && self.value[1] != value {
            self.value[1] = value;
            self.dirty = true;
        }
        for m in &mut self.motions {
            propagate_parameter(&mut m.source, name, value);
        }
    }

    pub fn evaluate(&mut self) {
        if self.weights.len() != self.motions.len() {
            self.weights.resize(self.motions.len(), 0.0);
            self.dirty = true;
        }
        if self.dirty {
            self.compute_weights();
            self.dirty = false;
        }
        for m in &mut self.motions {
            evaluate_source(&mut m.source);
        }
    }

    /// Gradient-band interpolation: each motion's influence is the minimum
    /// over all other motions of the clamped inverse projection of the
    /// sample point onto the band between the two positions. A sample
    /// exactly on a motion's position yields weight 1 for it and 0 for the
    /// rest.
    fn compute_weights(&mut self) {
        let p = self.value;
        let n = self.motions.len();
        if n == 1 {
            self.weights[0] = 1.0;
            return;
        }
        let mut sum = 0.0f32;
        for i in 0..n {
            let pi = self.motions[i].position;
            let mut w = 1.0f32;
            for j in 0..n {
                if j == i {
                    continue;
                }
                let pj = self.motions[j].position;
                let band = [pj[0] - pi[0], pj[1] - pi[1]];
                let len2 = band[0] * band[0] + band[1] * band[1];
                if len2 <= 1e-12 {
                    // Coincident motion positions impose no constraint.
                    continue;
                }
                let rel = [p[0] - pi[0], p[1] - pi[1]];
                let proj = (rel[0] * band[0] + rel[1] * band[1]) / len2;
                w = w.min((1.0 - proj).clamp(0.0, 1.0));
                if w == 0.0 {
                    break;
                }
            }
            self.weights[i] = w;
            sum += w;
        }
        if sum > 0.0 {
            for w in &mut self.weights {
                *w /= sum;
            }
        } else {
            // Sample far outside every band: snap to the nearest motion.
            let nearest = (0..n)
                .min_by(|&a, &b| {
                    dist2(p, self.motions[a].position)
                        .total_cmp(&dist2(p, self.motions[b].position))
                })
                .unwrap_or(0);
            self.weights.fill(0.0);
            self.weights[nearest] = 1.0;
        }
    }

    pub fn weights(&self) -> &[f32] {
        &self.weights
    }

    pub fn duration(&self) -> f32 {
        let mut inv = 0.0f32;
        for (m, w) in self.motions.iter().zip(&self.weights) {
            if *w <= 0.0 {
                continue;
            }
            let d = source_duration(&m.source).unwrap_or(m.duration);
            if d > 0.0 && m.speed > 0.0 {
                inv += w * m.speed / d;
            }
        }
        if inv > 0.0 {
            inv.recip()
        } else {
            0.0
        }
    }

    pub fn collect_leaf_weights(&self, scale: f32, out: &mut Vec<(usize, f32)>) {
        for (m, w) in self.motions.iter().zip(&self.weights) {
            let eff = scale * w;
            if eff <= 0.0 {
                continue;
            }
            collect_source(&m.source, eff, out);
        }
    }
}

#[inline]
fn dist2(a: [f32; 2], b: [f32; 2]) -> f32 {
    let dx = a[0] - b[0];
    let dy = a[1] - b[1];
    dx * dx + dy * dy
}

fn propagate_parameter(source: &mut MotionSource, name: &str, value: f32) {
    match source {
        MotionSource::Clip(_) => {}
        MotionSource::SubTree1d(t) => t.set_parameter(name, value),
        MotionSource::SubTree2d(t) => t.set_parameter(name, value),
    }
}

fn evaluate_source(source: &mut MotionSource) {
    match source {
        MotionSource::Clip(_) => {}
        MotionSource::SubTree1d(t) => t.evaluate(),
        MotionSource::SubTree2d(t) => t.evaluate(),
    }
}

fn collect_source(source: &MotionSource, eff: f32, out: &mut Vec<(usize, f32)>) {
    match source {
        MotionSource::Clip(slot) => out.push((*slot, eff)),
        MotionSource::SubTree1d(t) => t.collect_leaf_weights(eff, out),
        MotionSource::SubTree2d(t) => t.collect_leaf_weights(eff, out),
    }
}

/// Either tree dimensionality behind one façade.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub enum BlendTree {
    Dim1(BlendTree1d),
    Dim2(BlendTree2d),
}

impl BlendTree {
    pub fn set_parameter(&mut self, name: &str, value: f32) {
        match self {
            BlendTree::Dim1(t) => t.set_parameter(name, value),
            BlendTree::Dim2(t) => t.set_parameter(name, value),
        }
    }

    pub fn evaluate(&mut self) {
        match self {
            BlendTree::Dim1(t) => t.evaluate(),
            BlendTree::Dim2(t) => t.evaluate(),
        }
    }

    pub fn duration(&self) -> f32 {
        match self {
            BlendTree::Dim1(t) => t.duration(),
            BlendTree::Dim2(t) => t.duration(),
        }
    }

    pub fn collect_leaf_weights(&self, scale: f32, out: &mut Vec<(usize, f32)>) {
        match self {
            BlendTree::Dim1(t) => t.collect_leaf_weights(scale, out),
            BlendTree::Dim2(t) => t.collect_leaf_weights(scale, out),
        }
    }
}

fn source_duration(source: &MotionSource) -> Option<f32> {
    match source {
        MotionSource::Clip(_) => None,
        MotionSource::SubTree1d(t) => Some(t.duration()),
        MotionSource::SubTree2d(t) => Some(t.duration()),
    }
}

/// Configuration progress of a `BlendTreeInstance`.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum ConfigState {
    Unconfigured,
    RigBound,
    Ready,
}

/// A blend tree bound to a rig, evaluated against externally sampled clip
/// streams. Configuration is two-phase and order-checked: the rig must be
/// bound before the tree asset, and both before the first evaluation.
pub struct BlendTreeInstance {
    state: ConfigState,
    rig: Option<Arc<RigDescriptor>>,
    tree: Option<BlendTree>,
    leaf_weights: Vec<(usize, f32)>,
}

impl BlendTreeInstance {
    pub fn new(cfg: &Config) -> Self {
        Self {
            state: ConfigState::Unconfigured,
            rig: None,
            tree: None,
            leaf_weights: Vec::with_capacity(cfg.scratch_leaf_weights),
        }
    }

    pub fn state(&self) -> ConfigState {
        self.state
    }

    pub fn bind_rig(&mut self, rig: Arc<RigDescriptor>) -> Result<(), ConfigError> {
        if self.state != ConfigState::Unconfigured {
            return Err(ConfigError::AlreadyConfigured);
        }
        self.rig = Some(rig);
        self.state = ConfigState::RigBound;
        Ok(())
    }

    pub fn bind_tree(&mut self, tree: BlendTree) -> Result<(), ConfigError> {
        match self.state {
            ConfigState::Unconfigured => Err(ConfigError::RigNotBound),
            ConfigState::Ready => Err(ConfigError::AlreadyConfigured),
            ConfigState::RigBound => {
                self.tree = Some(tree);
                self.state = ConfigState::Ready;
                Ok(())
            }
        }
    }

    pub fn rig(&self) -> Option<&Arc<RigDescriptor>> {
        self.rig.as_ref()
    }

    pub fn set_parameter(&mut self, name: &str, value: f32) -> Result<(), ConfigError> {
        let Some(tree) = self.tree.as_mut() else {
            return Err(ConfigError::NotReady);
        };
        tree.set_parameter(name, value);
        Ok(())
    }

    /// Effective looping duration under the current parameters.
    pub fn duration(&mut self) -> Result<f32, ConfigError> {
        let Some(tree) = self.tree.as_mut() else {
            return Err(ConfigError::NotReady);
        };
        tree.evaluate();
        Ok(tree.duration())
    }

    /// Evaluate the tree and compose the weighted pose from `clips` (indexed
    /// by `MotionSource::Clip` slot) into `out`. All streams must share the
    /// bound rig.
    pub fn evaluate_into(
        &mut self,
        clips: &[AnimationStream<'_>],
        out: &mut AnimationStreamMut<'_>,
    ) -> Result<(), EvalError> {
        if self.state != ConfigState::Ready {
            return Err(ConfigError::NotReady.into());
        }
        let rig = self.rig.as_deref().ok_or(ConfigError::RigNotBound)?;
        if !RigDescriptor::same_rig(rig, out.rig()) {
            return Err(crate::error::AccessError::DescriptorMismatch.into());
        }

        let tree = self.tree.as_mut().ok_or(ConfigError::NotReady)?;
        tree.evaluate();
        self.leaf_weights.clear();
        tree.collect_leaf_weights(1.0, &mut self.leaf_weights);

        for (slot, _) in &self.leaf_weights {
            if *slot >= clips.len() {
                return Err(EvalError::ClipOutOfRange {
                    index: *slot,
                    count: clips.len(),
                });
            }
        }

        // Borrow-friendly: materialize the (stream, weight) pairs for ops.
        let inputs: Vec<(AnimationStream<'_>, f32)> = self
            .leaf_weights
            .iter()
            .map(|(slot, w)| (clips[*slot], *w))
            .collect();
        ops::blend_weighted(&inputs, out)?;
        Ok(())
    }
}
