//! Layer-based topology analysis.
//!
//! Every node carries a layer index and every enabled connection runs from a
//! lower layer to a strictly higher one, so evaluating nodes layer by layer is
//! a valid topological order. This module derives that order and the
//! per-layer statistics used to decide whether a genome can still grow.

use slotmap::SlotMap;

use crate::gene::{NodeGene, NodeKey};
use crate::genome::Genome;

/// Node counts per layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LayerCensus {
    counts: Vec<usize>,
}

impl LayerCensus {
    /// Count the nodes on each layer of `genome`.
    #[must_use]
    pub fn from_genome(genome: &Genome) -> Self {
        Self::from_layers(genome.layers(), genome.nodes().map(|(_, node)| node.layer))
    }

    /// Count layer occupancy from raw layer indices.
    ///
    /// `layer_count` sizes the census; indices beyond it extend the census
    /// rather than being dropped.
    #[must_use]
    pub fn from_layers(layer_count: u32, layers: impl IntoIterator<Item = u32>) -> Self {
        let mut counts = vec![0usize; layer_count as usize];
        for layer in layers {
            let idx = layer as usize;
            if idx >= counts.len() {
                counts.resize(idx + 1, 0);
            }
            counts[idx] += 1;
        }
        Self { counts }
    }

    /// Number of layers covered by the census.
    #[must_use]
    pub fn layer_count(&self) -> usize {
        self.counts.len()
    }

    /// Nodes on `layer`, zero for layers outside the census.
    #[must_use]
    pub fn nodes_in_layer(&self, layer: u32) -> usize {
        self.counts.get(layer as usize).copied().unwrap_or(0)
    }

    /// Per-layer counts, lowest layer first.
    #[must_use]
    pub fn counts(&self) -> &[usize] {
        &self.counts
    }

    /// Largest number of distinct forward connections the layering allows:
    /// every node may link to every node on any later layer.
    #[must_use]
    pub fn max_connections(&self) -> usize {
        let mut later = 0;
        let mut max = 0;
        for &count in self.counts.iter().rev() {
            max += count * later;
            later += count;
        }
        max
    }
}

/// Nodes grouped by ascending layer, keeping arena order within a layer.
#[must_use]
pub fn evaluation_order(nodes: &SlotMap<NodeKey, NodeGene>) -> Vec<NodeKey> {
    let mut order: Vec<(NodeKey, u32)> = nodes.iter().map(|(key, node)| (key, node.layer)).collect();
    // stable: ties keep insertion order
    order.sort_by_key(|&(_, layer)| layer);
    order.into_iter().map(|(key, _)| key).collect()
}
