//! Activation functions applied to hidden and output nodes.
//!
//! Input and bias nodes never pass through an activation: their output is
//! written directly before each evaluation pass.

use serde::{Deserialize, Serialize};

/// Activation function applied to a node's accumulated input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum Activation {
    /// Hyperbolic tangent: f(x) = tanh(x)
    #[default]
    Tanh,
    /// Steepened sigmoid from the original NEAT paper: f(x) = 1 / (1 + e^(-4.9x))
    SteepenedSigmoid,
    /// Identity function: f(x) = x. Handy for linear read-outs.
    Identity,
}

impl Activation {
    /// All available activation functions.
    pub const ALL: [Self; 3] = [Self::Tanh, Self::SteepenedSigmoid, Self::Identity];

    /// Apply this activation function to an input value.
    ///
    /// NaN propagates unchanged. Infinite inputs map to the function's limit.
    #[inline]
    #[must_use]
    pub fn apply(self, x: f32) -> f32 {
        if x.is_nan() {
            return f32::NAN;
        }

        match self {
            Self::Tanh => {
                if x == f32::INFINITY {
                    return 1.0;
                }
                if x == f32::NEG_INFINITY {
                    return -1.0;
                }
                x.tanh()
            }
            Self::SteepenedSigmoid => logistic(4.9 * x),
            Self::Identity => x,
        }
    }
}

#[inline]
fn logistic(x: f32) -> f32 {
    if x == f32::INFINITY {
        return 1.0;
    }
    if x == f32::NEG_INFINITY {
        return 0.0;
    }
    // exp overflows past ~88
    let clamped = x.clamp(-88.0, 88.0);
    1.0 / (1.0 + (-clamped).exp())
}
