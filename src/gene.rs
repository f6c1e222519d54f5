//! Gene types for NEAT genomes.
//!
//! This module defines the fundamental building blocks of a genome:
//! - [`NodeGene`]: a neuron with a layer and per-pass activation state
//! - [`ConnectionGene`]: a weighted, innovation-tagged edge between two nodes

use std::f32::consts::PI;
use std::fmt;

use rand::Rng;
use serde::{Deserialize, Serialize};
use slotmap::new_key_type;

use crate::genome::NeatConfig;

new_key_type! {
    /// Arena index of a node inside its owning genome.
    ///
    /// Keys are only meaningful for the genome that issued them; use
    /// [`NodeId`] to talk about "the same" node across genomes.
    pub struct NodeKey;

    /// Arena index of a connection inside its owning genome.
    pub struct ConnectionKey;
}

/// Genome-local node identifier.
///
/// Ids are handed out contiguously by the owning genome and never reused, so
/// a clone or crossover child keeps the ids of its primary parent. The
/// innovation ledger keys structural mutations on these ids.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct NodeId(pub u32);

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// The type/role of a node in the network.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NodeType {
    /// Input node - its output is written from the input vector.
    Input,
    /// Output node - produces final network output.
    Output,
    /// Hidden node - inserted by splitting a connection.
    Hidden,
    /// Bias node - always outputs 1.0.
    Bias,
}

/// A node gene representing a neuron in the network.
///
/// Activation state (`input_sum`, `output`) and the outgoing-edge cache are
/// derived per genome and are not serialized.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeGene {
    /// Stable genome-local identifier.
    pub id: NodeId,
    /// The type/role of this node.
    pub kind: NodeType,
    /// Layer index. 0 holds inputs and the bias; outputs sit on the last layer.
    pub layer: u32,
    /// Weighted sum accumulated during the current evaluation pass.
    #[serde(skip)]
    pub input_sum: f32,
    /// Post-activation value from the last evaluation pass.
    #[serde(skip)]
    pub output: f32,
    /// Outgoing connections, rebuilt by `Genome::connect_nodes`.
    #[serde(skip)]
    pub(crate) outgoing: Vec<ConnectionKey>,
}

impl NodeGene {
    fn with_layer(id: NodeId, kind: NodeType, layer: u32) -> Self {
        Self {
            id,
            kind,
            layer,
            input_sum: 0.0,
            output: 0.0,
            outgoing: Vec::new(),
        }
    }

    /// Create a new input node on layer 0.
    #[must_use]
    pub fn input(id: NodeId) -> Self {
        Self::with_layer(id, NodeType::Input, 0)
    }

    /// Create a new output node on layer 1.
    #[must_use]
    pub fn output(id: NodeId) -> Self {
        Self::with_layer(id, NodeType::Output, 1)
    }

    /// Create a bias node on layer 0.
    #[must_use]
    pub fn bias(id: NodeId) -> Self {
        Self::with_layer(id, NodeType::Bias, 0)
    }

    /// Create a hidden node on the given layer.
    #[must_use]
    pub fn hidden(id: NodeId, layer: u32) -> Self {
        Self::with_layer(id, NodeType::Hidden, layer)
    }

    /// Copy the structural part of this node (id, kind, layer).
    ///
    /// Activation state is reset and the edge cache is left empty for the
    /// receiving genome to rebuild.
    #[must_use]
    pub fn detached(&self) -> Self {
        Self::with_layer(self.id, self.kind, self.layer)
    }

    /// Outgoing connections as of the last adjacency rebuild.
    #[must_use]
    pub fn outgoing(&self) -> &[ConnectionKey] {
        &self.outgoing
    }
}

/// A connection gene representing a weighted link between two nodes.
///
/// Endpoints are arena keys into the owning genome's node storage and can
/// only be set by the genome's own operators.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConnectionGene {
    /// Innovation number issued by the [`InnovationLedger`](crate::InnovationLedger).
    pub innovation: u64,
    pub(crate) from: NodeKey,
    pub(crate) to: NodeKey,
    /// The connection weight.
    pub weight: f32,
    /// Disabled connections are skipped during evaluation but preserved for crossover.
    pub enabled: bool,
}

impl ConnectionGene {
    /// Create a new enabled connection.
    #[must_use]
    pub fn new(innovation: u64, from: NodeKey, to: NodeKey, weight: f32) -> Self {
        Self {
            innovation,
            from,
            to,
            weight,
            enabled: true,
        }
    }

    /// The source node.
    #[must_use]
    pub fn from(&self) -> NodeKey {
        self.from
    }

    /// The target node.
    #[must_use]
    pub fn to(&self) -> NodeKey {
        self.to
    }

    /// Copy this gene onto a different pair of endpoints.
    #[must_use]
    pub(crate) fn rewired(&self, from: NodeKey, to: NodeKey) -> Self {
        Self {
            from,
            to,
            ..self.clone()
        }
    }

    /// Mutate the weight: either replace it outright or nudge it by a small
    /// normally distributed step and clamp to the weight range.
    pub fn mutate_weight<R: Rng>(&mut self, rng: &mut R, config: &NeatConfig) {
        if rng.random::<f32>() < config.weight_replace_prob {
            self.weight = uniform_weight(rng, config.weight_range);
        } else {
            self.weight += standard_normal(rng) * config.weight_perturb_scale;
            self.weight = self
                .weight
                .clamp(-config.weight_range, config.weight_range);
        }
    }
}

/// Uniform sample from `[-range, range)`.
#[inline]
pub(crate) fn uniform_weight<R: Rng>(rng: &mut R, range: f32) -> f32 {
    rng.random::<f32>() * 2.0 * range - range
}

/// Standard normal sample via the Box-Muller transform.
pub(crate) fn standard_normal<R: Rng>(rng: &mut R) -> f32 {
    // (0, 1] keeps ln() finite
    let u1 = 1.0 - rng.random::<f32>();
    let u2 = 1.0 - rng.random::<f32>();
    (-2.0 * u1.ln()).sqrt() * (2.0 * PI * u2).sin()
}
