//! Layer mixer: N weighted, maskable pose contributions composed in fixed
//! ascending index order.
//!
//! Override layers cross-fade masked-in channels from the *running*
//! accumulated pose (so the first override lerps from the defaults, not from
//! zero); additive layers accumulate on top. Channels no layer touches keep
//! the default pose. Disconnected layers contribute as identity and never
//! fault evaluation.

use crate::error::AccessError;
use crate::mask::ChannelMask;
use crate::ops;
use crate::stream::{AnimationStream, AnimationStreamMut};

/// Blending mode of one mixer layer.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum BlendingMode {
    Override,
    Additive,
}

/// One mixer input. `input: None` models a disconnected port.
pub struct MixerLayer<'a> {
    pub input: Option<AnimationStream<'a>>,
    pub weight: f32,
    pub mode: BlendingMode,
    pub mask: Option<&'a ChannelMask>,
}

impl<'a> MixerLayer<'a> {
    pub fn overriding(input: AnimationStream<'a>, weight: f32) -> Self {
        Self {
            input: Some(input),
            weight,
            mode: BlendingMode::Override,
            mask: None,
        }
    }

    pub fn additive(input: AnimationStream<'a>, weight: f32) -> Self {
        Self {
            input: Some(input),
            weight,
            mode: BlendingMode::Additive,
            mask: None,
        }
    }

    pub fn with_mask(mut self, mask: &'a ChannelMask) -> Self {
        self.mask = Some(mask);
        self
    }

    /// An unset port: identity contribution.
    pub fn disconnected() -> Self {
        Self {
            input: None,
            weight: 0.0,
            mode: BlendingMode::Override,
            mask: None,
        }
    }
}

/// Evaluate the layer stack into `out`. The output starts from the
/// descriptor defaults; layers then apply in index order. Rotations are
/// normalized once at the end.
pub fn evaluate_layers(
    layers: &[MixerLayer<'_>],
    out: &mut AnimationStreamMut<'_>,
) -> Result<(), AccessError> {
    out.reset_to_defaults();
    for layer in layers {
        let Some(input) = &layer.input else {
            continue;
        };
        if layer.weight <= 0.0 {
            continue;
        }
        match layer.mode {
            BlendingMode::Override => {
                ops::blend_into_masked(out, input, layer.weight.min(1.0), layer.mask)?;
            }
            BlendingMode::Additive => {
                ops::add_scaled_masked(out, input, layer.weight, layer.mask)?;
            }
        }
    }
    ops::normalize_rotations(out);
    Ok(())
}
