//! Layered NEAT genome with arena-allocated graph topology.
//!
//! The [`Genome`] stores nodes and connections in `SlotMap` arenas.
//! Connections refer to their endpoints by arena key, so cloning or crossing
//! genomes is a key remap rather than pointer surgery. Every node sits on an
//! integer layer and every connection runs from a lower layer to a higher
//! one, which makes "ascending layer" a valid evaluation order.
//!
//! Structural operators take an explicit [`InnovationLedger`] and random
//! source, so a run is reproducible from its seed.

use std::collections::HashMap;

use rand::Rng;
use serde::{Deserialize, Serialize};
use slotmap::SlotMap;
use tracing::{debug, trace, warn};

use crate::activation::Activation;
use crate::error::GenomeError;
use crate::gene::{uniform_weight, ConnectionGene, ConnectionKey, NodeGene, NodeId, NodeKey, NodeType};
use crate::innovation::InnovationLedger;
use crate::topology::{evaluation_order, LayerCensus};

/// Chance that a matching gene is copied from the primary parent.
const PRIMARY_GENE_PROB: f32 = 0.5;

/// Configuration for genome creation and mutation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NeatConfig {
    /// Number of input nodes (excluding bias).
    pub num_inputs: usize,
    /// Number of output nodes.
    pub num_outputs: usize,
    /// Activation applied to hidden and output nodes.
    pub activation: Activation,
    /// Probability that a `mutate` call perturbs every connection weight.
    pub weight_mutation_prob: f32,
    /// Probability that a `mutate` call adds a connection.
    pub add_connection_prob: f32,
    /// Probability that a `mutate` call adds a node.
    pub add_node_prob: f32,
    /// Probability of replacing a weight instead of perturbing it.
    pub weight_replace_prob: f32,
    /// Scale applied to the standard-normal weight perturbation.
    pub weight_perturb_scale: f32,
    /// Weights are drawn from and clamped to `[-weight_range, weight_range]`.
    pub weight_range: f32,
    /// Probability that a gene disabled in either parent is disabled in the child.
    pub disable_inherited_prob: f32,
    /// Whether initial wiring also links the bias node to every output.
    pub connect_bias_to_outputs: bool,
    /// Random draws `add_connection` makes before scanning every node pair.
    pub max_sampling_attempts: usize,
}

impl Default for NeatConfig {
    fn default() -> Self {
        Self {
            num_inputs: 2,
            num_outputs: 1,
            activation: Activation::Tanh,
            weight_mutation_prob: 0.8,
            add_connection_prob: 0.05,
            add_node_prob: 0.01,
            weight_replace_prob: 0.1,
            weight_perturb_scale: 1.0 / 50.0,
            weight_range: 1.0,
            disable_inherited_prob: 0.75,
            connect_bias_to_outputs: false,
            max_sampling_attempts: 64,
        }
    }
}

impl NeatConfig {
    /// Default operator settings for the given input/output counts.
    #[must_use]
    pub fn new(num_inputs: usize, num_outputs: usize) -> Self {
        Self {
            num_inputs,
            num_outputs,
            ..Default::default()
        }
    }

    /// Check that every probability lies in `[0, 1]` and the weight settings
    /// are finite and usable.
    ///
    /// # Errors
    ///
    /// Returns [`GenomeError::InvalidConfig`] naming the first offending field.
    pub fn validate(&self) -> Result<(), GenomeError> {
        if self.num_outputs == 0 {
            return Err(GenomeError::InvalidConfig(
                "num_outputs must be at least 1".to_string(),
            ));
        }

        let probabilities = [
            ("weight_mutation_prob", self.weight_mutation_prob),
            ("add_connection_prob", self.add_connection_prob),
            ("add_node_prob", self.add_node_prob),
            ("weight_replace_prob", self.weight_replace_prob),
            ("disable_inherited_prob", self.disable_inherited_prob),
        ];
        for (name, p) in probabilities {
            if !(0.0..=1.0).contains(&p) {
                return Err(GenomeError::InvalidConfig(format!(
                    "{name} must be within [0, 1], got {p}"
                )));
            }
        }

        if !self.weight_range.is_finite() || self.weight_range <= 0.0 {
            return Err(GenomeError::InvalidConfig(format!(
                "weight_range must be positive and finite, got {}",
                self.weight_range
            )));
        }
        if !self.weight_perturb_scale.is_finite() || self.weight_perturb_scale < 0.0 {
            return Err(GenomeError::InvalidConfig(format!(
                "weight_perturb_scale must be non-negative and finite, got {}",
                self.weight_perturb_scale
            )));
        }

        Ok(())
    }
}

/// A NEAT genome: a layered node set, a connection list and the derived
/// caches needed to evaluate it.
///
/// The outgoing-edge cache and the evaluation order are rebuilt by
/// [`generate_network`](Self::generate_network). Structural operators keep
/// the edge cache current and mark the evaluation order stale;
/// [`feed_forward`](Self::feed_forward) regenerates it when needed.
#[derive(Debug, Serialize, Deserialize)]
pub struct Genome {
    config: NeatConfig,
    nodes: SlotMap<NodeKey, NodeGene>,
    connections: SlotMap<ConnectionKey, ConnectionGene>,
    input_keys: Vec<NodeKey>,
    output_keys: Vec<NodeKey>,
    bias_key: NodeKey,
    layers: u32,
    next_node: u32,
    #[serde(skip)]
    network: Vec<NodeKey>,
    #[serde(skip)]
    adjacency_current: bool,
    #[serde(skip)]
    network_current: bool,
}

impl Genome {
    /// Create a genome with input, output and bias nodes and no connections.
    ///
    /// Ids are assigned contiguously: inputs first, then outputs, then the bias.
    #[must_use]
    pub fn new(config: NeatConfig) -> Self {
        let mut nodes: SlotMap<NodeKey, NodeGene> =
            SlotMap::with_capacity_and_key(config.num_inputs + config.num_outputs + 1);
        let mut next_node = 0u32;

        let mut input_keys = Vec::with_capacity(config.num_inputs);
        for _ in 0..config.num_inputs {
            input_keys.push(nodes.insert(NodeGene::input(NodeId(next_node))));
            next_node += 1;
        }

        let mut output_keys = Vec::with_capacity(config.num_outputs);
        for _ in 0..config.num_outputs {
            output_keys.push(nodes.insert(NodeGene::output(NodeId(next_node))));
            next_node += 1;
        }

        let bias_key = nodes.insert(NodeGene::bias(NodeId(next_node)));
        next_node += 1;

        let mut genome = Self {
            config,
            nodes,
            connections: SlotMap::with_key(),
            input_keys,
            output_keys,
            bias_key,
            layers: 2,
            next_node,
            network: Vec::new(),
            adjacency_current: false,
            network_current: false,
        };
        genome.generate_network();
        genome
    }

    /// Create a genome with every input wired to every output, ready to
    /// evaluate.
    #[must_use]
    pub fn with_initial_wiring<R: Rng>(
        config: NeatConfig,
        ledger: &mut InnovationLedger,
        rng: &mut R,
    ) -> Self {
        let mut genome = Self::new(config);
        genome.connect_initial(ledger, rng);
        genome.generate_network();
        genome
    }

    /// Wire every input to every output with random weights.
    ///
    /// The bias node joins the sources only when
    /// [`NeatConfig::connect_bias_to_outputs`] is set. Pairs that are already
    /// connected are left alone.
    pub fn connect_initial<R: Rng>(&mut self, ledger: &mut InnovationLedger, rng: &mut R) {
        if self.fully_connected() {
            return;
        }
        self.ensure_adjacency();

        let mut sources = self.input_keys.clone();
        if self.config.connect_bias_to_outputs {
            sources.push(self.bias_key);
        }
        let targets = self.output_keys.clone();

        let mut added = 0usize;
        for &from in &sources {
            for &to in &targets {
                if self.are_connected(from, to) {
                    continue;
                }
                let weight = uniform_weight(rng, self.config.weight_range);
                self.push_connection(from, to, weight, ledger);
                added += 1;
            }
        }

        self.structure_changed();
        debug!(added, "initial connections wired");
    }

    // ------------------------------------------------------------------
    // Accessors
    // ------------------------------------------------------------------

    /// Configuration this genome was created with.
    #[must_use]
    pub fn config(&self) -> &NeatConfig {
        &self.config
    }

    /// Nodes in insertion order.
    pub fn nodes(&self) -> impl Iterator<Item = (NodeKey, &NodeGene)> + '_ {
        self.nodes.iter()
    }

    /// Connections in insertion order.
    pub fn connections(&self) -> impl Iterator<Item = (ConnectionKey, &ConnectionGene)> + '_ {
        self.connections.iter()
    }

    #[must_use]
    pub fn node(&self, key: NodeKey) -> Option<&NodeGene> {
        self.nodes.get(key)
    }

    #[must_use]
    pub fn connection(&self, key: ConnectionKey) -> Option<&ConnectionGene> {
        self.connections.get(key)
    }

    /// Overwrite a connection's weight.
    ///
    /// # Errors
    ///
    /// Returns [`GenomeError::ConnectionNotFound`] if `key` is not a
    /// connection of this genome.
    pub fn set_weight(&mut self, key: ConnectionKey, weight: f32) -> Result<(), GenomeError> {
        let conn = self
            .connections
            .get_mut(key)
            .ok_or(GenomeError::ConnectionNotFound)?;
        conn.weight = weight;
        Ok(())
    }

    /// Enable or disable a connection.
    ///
    /// # Errors
    ///
    /// Returns [`GenomeError::ConnectionNotFound`] if `key` is not a
    /// connection of this genome.
    pub fn set_enabled(&mut self, key: ConnectionKey, enabled: bool) -> Result<(), GenomeError> {
        let conn = self
            .connections
            .get_mut(key)
            .ok_or(GenomeError::ConnectionNotFound)?;
        conn.enabled = enabled;
        Ok(())
    }

    #[must_use]
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    #[must_use]
    pub fn connection_count(&self) -> usize {
        self.connections.len()
    }

    /// Look up a node by its genome-local id.
    #[must_use]
    pub fn get_node(&self, id: NodeId) -> Option<&NodeGene> {
        self.nodes.values().find(|node| node.id == id)
    }

    /// Arena key of the node with the given id.
    #[must_use]
    pub fn node_key(&self, id: NodeId) -> Option<NodeKey> {
        self.nodes
            .iter()
            .find(|(_, node)| node.id == id)
            .map(|(key, _)| key)
    }

    /// Like [`node_key`](Self::node_key), but an unknown id is an error.
    ///
    /// # Errors
    ///
    /// Returns [`GenomeError::NodeNotFound`] if no node carries `id`.
    pub fn require_node(&self, id: NodeId) -> Result<NodeKey, GenomeError> {
        self.node_key(id).ok_or(GenomeError::NodeNotFound(id))
    }

    /// Input nodes in id order.
    #[must_use]
    pub fn input_keys(&self) -> &[NodeKey] {
        &self.input_keys
    }

    /// Output nodes in id order.
    #[must_use]
    pub fn output_keys(&self) -> &[NodeKey] {
        &self.output_keys
    }

    #[must_use]
    pub fn bias_key(&self) -> NodeKey {
        self.bias_key
    }

    #[must_use]
    pub fn bias_id(&self) -> NodeId {
        self.nodes[self.bias_key].id
    }

    #[must_use]
    pub fn num_inputs(&self) -> usize {
        self.input_keys.len()
    }

    #[must_use]
    pub fn num_outputs(&self) -> usize {
        self.output_keys.len()
    }

    /// Number of layers, including the input and output layers.
    #[must_use]
    pub fn layers(&self) -> u32 {
        self.layers
    }

    /// The id the next inserted node will receive.
    #[must_use]
    pub fn next_node_id(&self) -> NodeId {
        NodeId(self.next_node)
    }

    /// Cached evaluation order. Only meaningful while
    /// [`is_network_current`](Self::is_network_current) holds.
    #[must_use]
    pub fn network(&self) -> &[NodeKey] {
        &self.network
    }

    #[must_use]
    pub fn is_network_current(&self) -> bool {
        self.network_current
    }

    /// Innovation numbers of all connections, in insertion order.
    #[must_use]
    pub fn connection_innovations(&self) -> Vec<u64> {
        self.connections.values().map(|c| c.innovation).collect()
    }

    #[must_use]
    pub fn num_enabled_connections(&self) -> usize {
        self.connections.values().filter(|c| c.enabled).count()
    }

    /// Find the first connection carrying `innovation`.
    #[must_use]
    pub fn find_connection_by_innovation(&self, innovation: u64) -> Option<ConnectionKey> {
        self.connections
            .iter()
            .find(|(_, c)| c.innovation == innovation)
            .map(|(key, _)| key)
    }

    /// All hidden nodes.
    #[must_use]
    pub fn hidden_keys(&self) -> Vec<NodeKey> {
        self.nodes
            .iter()
            .filter(|(_, n)| n.kind == NodeType::Hidden)
            .map(|(key, _)| key)
            .collect()
    }

    // ------------------------------------------------------------------
    // Derived caches
    // ------------------------------------------------------------------

    /// Rebuild every node's outgoing-edge cache in one pass over the
    /// connection list.
    pub fn connect_nodes(&mut self) {
        for node in self.nodes.values_mut() {
            node.outgoing.clear();
        }
        for (key, conn) in &self.connections {
            if let Some(node) = self.nodes.get_mut(conn.from) {
                node.outgoing.push(key);
            }
        }
        self.adjacency_current = true;
    }

    /// Rebuild the edge cache and the evaluation order.
    ///
    /// The order groups nodes by ascending layer and keeps insertion order
    /// within a layer.
    pub fn generate_network(&mut self) {
        self.connect_nodes();
        self.network = evaluation_order(&self.nodes);
        self.network_current = true;
        trace!(nodes = self.network.len(), layers = self.layers, "network generated");
    }

    fn ensure_adjacency(&mut self) {
        if !self.adjacency_current {
            self.connect_nodes();
        }
    }

    fn structure_changed(&mut self) {
        self.connect_nodes();
        self.network_current = false;
    }

    // ------------------------------------------------------------------
    // Evaluation
    // ------------------------------------------------------------------

    /// Run one forward pass.
    ///
    /// Input node outputs are set from `vision`, the bias outputs 1.0, nodes
    /// are engaged in layer order, and output values are returned in output
    /// id order. Accumulators are cleared afterwards so passes don't leak
    /// into each other.
    ///
    /// # Errors
    ///
    /// Returns [`GenomeError::InputLengthMismatch`] if `vision` does not have
    /// one value per input node.
    pub fn feed_forward(&mut self, vision: &[f32]) -> Result<Vec<f32>, GenomeError> {
        if vision.len() != self.input_keys.len() {
            return Err(GenomeError::InputLengthMismatch {
                expected: self.input_keys.len(),
                actual: vision.len(),
            });
        }
        if !self.network_current {
            trace!("evaluation order stale, regenerating");
            self.generate_network();
        }

        for (&key, &value) in self.input_keys.iter().zip(vision) {
            self.nodes[key].output = value;
        }
        let bias_key = self.bias_key;
        self.nodes[bias_key].output = 1.0;

        let network = std::mem::take(&mut self.network);
        for &key in &network {
            self.engage(key);
        }
        self.network = network;

        let outputs = self
            .output_keys
            .iter()
            .map(|&key| self.nodes[key].output)
            .collect();

        for node in self.nodes.values_mut() {
            node.input_sum = 0.0;
        }

        Ok(outputs)
    }

    /// Activate one node and push its output along enabled outgoing edges.
    fn engage(&mut self, key: NodeKey) {
        let activation = self.config.activation;
        let node = &mut self.nodes[key];
        if node.layer != 0 {
            node.output = activation.apply(node.input_sum);
        }
        let output = node.output;

        let outgoing = std::mem::take(&mut node.outgoing);
        for &conn_key in &outgoing {
            let Some(conn) = self.connections.get(conn_key) else {
                continue;
            };
            if !conn.enabled {
                continue;
            }
            if let Some(target) = self.nodes.get_mut(conn.to) {
                target.input_sum += conn.weight * output;
            }
        }
        self.nodes[key].outgoing = outgoing;
    }

    // ------------------------------------------------------------------
    // Structural queries
    // ------------------------------------------------------------------

    /// Whether a connection already links `a` and `b` in either direction.
    ///
    /// Nodes on the same layer are never connected.
    #[must_use]
    pub fn are_connected(&self, a: NodeKey, b: NodeKey) -> bool {
        let (Some(node_a), Some(node_b)) = (self.nodes.get(a), self.nodes.get(b)) else {
            return false;
        };
        if node_a.layer == node_b.layer {
            return false;
        }

        let (lower, upper) = if node_a.layer < node_b.layer {
            (a, b)
        } else {
            (b, a)
        };

        if !self.adjacency_current {
            return self
                .connections
                .values()
                .any(|c| c.from == lower && c.to == upper);
        }

        self.nodes[lower]
            .outgoing
            .iter()
            .any(|&key| self.connections.get(key).is_some_and(|c| c.to == upper))
    }

    fn can_connect(&self, a: NodeKey, b: NodeKey) -> bool {
        self.nodes[a].layer != self.nodes[b].layer && !self.are_connected(a, b)
    }

    /// Whether every forward connection the current layering allows exists.
    #[must_use]
    pub fn fully_connected(&self) -> bool {
        self.connections.len() >= LayerCensus::from_genome(self).max_connections()
    }

    // ------------------------------------------------------------------
    // Structural mutation
    // ------------------------------------------------------------------

    /// Append a connection numbered by the ledger against the current shape.
    fn push_connection(
        &mut self,
        from: NodeKey,
        to: NodeKey,
        weight: f32,
        ledger: &mut InnovationLedger,
    ) -> ConnectionKey {
        let innovations = self.connection_innovations();
        let innovation =
            ledger.innovation_number(self.nodes[from].id, self.nodes[to].id, &innovations);
        self.adjacency_current = false;
        self.connections
            .insert(ConnectionGene::new(innovation, from, to, weight))
    }

    /// Connect two nodes, lower layer first, and rebuild the edge cache.
    fn link(
        &mut self,
        a: NodeKey,
        b: NodeKey,
        weight: f32,
        ledger: &mut InnovationLedger,
    ) -> ConnectionKey {
        let (from, to) = if self.nodes[a].layer > self.nodes[b].layer {
            (b, a)
        } else {
            (a, b)
        };
        let key = self.push_connection(from, to, weight, ledger);
        self.structure_changed();
        debug!(
            from = %self.nodes[from].id,
            to = %self.nodes[to].id,
            innovation = self.connections[key].innovation,
            "connection added"
        );
        key
    }

    /// Add a connection between two specific nodes.
    ///
    /// The lower-layer node becomes the source regardless of argument order.
    /// Returns `Ok(None)` if the nodes share a layer or are already connected.
    ///
    /// # Errors
    ///
    /// Returns [`GenomeError::NodeNotFound`] if either id is unknown.
    pub fn add_connection_between(
        &mut self,
        from: NodeId,
        to: NodeId,
        weight: f32,
        ledger: &mut InnovationLedger,
    ) -> Result<Option<ConnectionKey>, GenomeError> {
        let a = self.require_node(from)?;
        let b = self.require_node(to)?;
        self.ensure_adjacency();

        if !self.can_connect(a, b) {
            return Ok(None);
        }
        Ok(Some(self.link(a, b, weight, ledger)))
    }

    /// Add a connection between two random, unconnected nodes on different
    /// layers.
    ///
    /// Does nothing when the genome is already fully connected. Random pairs
    /// are drawn up to [`NeatConfig::max_sampling_attempts`] times; after
    /// that every valid pair is enumerated and one is picked uniformly.
    ///
    /// # Errors
    ///
    /// Returns [`GenomeError::ExhaustedSearch`] if no valid pair exists even
    /// though the layer census says the genome has room.
    pub fn add_connection<R: Rng>(
        &mut self,
        ledger: &mut InnovationLedger,
        rng: &mut R,
    ) -> Result<Option<ConnectionKey>, GenomeError> {
        self.ensure_adjacency();
        if self.fully_connected() {
            debug!("genome fully connected, no connection added");
            return Ok(None);
        }

        let keys: Vec<NodeKey> = self.nodes.keys().collect();
        let attempts = self.config.max_sampling_attempts;

        for _ in 0..attempts {
            let a = keys[rng.random_range(0..keys.len())];
            let b = keys[rng.random_range(0..keys.len())];
            if self.can_connect(a, b) {
                let weight = uniform_weight(rng, self.config.weight_range);
                return Ok(Some(self.link(a, b, weight, ledger)));
            }
        }

        let mut candidates = Vec::new();
        for (i, &a) in keys.iter().enumerate() {
            for &b in &keys[i + 1..] {
                if self.can_connect(a, b) {
                    candidates.push((a, b));
                }
            }
        }
        trace!(attempts, candidates = candidates.len(), "sampling exhausted, scanning pairs");

        if candidates.is_empty() {
            return Err(GenomeError::ExhaustedSearch {
                operation: "add_connection",
                attempts,
            });
        }

        let (a, b) = candidates[rng.random_range(0..candidates.len())];
        let weight = uniform_weight(rng, self.config.weight_range);
        Ok(Some(self.link(a, b, weight, ledger)))
    }

    /// Insert a hidden node in place of an existing connection.
    ///
    /// The connection is disabled and replaced by `from -> new` (weight 1.0),
    /// `new -> to` (the original weight) and `bias -> new` (weight 0.0). The
    /// new node goes one layer above `from`; if that collides with `to`'s
    /// layer, every other node at or above it moves up one layer.
    ///
    /// # Errors
    ///
    /// Returns [`GenomeError::ConnectionNotFound`] if `key` is not a
    /// connection of this genome.
    pub fn split_connection(
        &mut self,
        key: ConnectionKey,
        ledger: &mut InnovationLedger,
    ) -> Result<NodeKey, GenomeError> {
        let conn = self
            .connections
            .get_mut(key)
            .ok_or(GenomeError::ConnectionNotFound)?;
        conn.enabled = false;
        let (from, to, weight) = (conn.from, conn.to, conn.weight);

        let id = NodeId(self.next_node);
        self.next_node += 1;
        let layer = self.nodes[from].layer + 1;
        let hidden = self.nodes.insert(NodeGene::hidden(id, layer));

        let bias = self.bias_key;
        self.push_connection(from, hidden, 1.0, ledger);
        self.push_connection(hidden, to, weight, ledger);
        self.push_connection(bias, hidden, 0.0, ledger);

        if self.nodes[to].layer == layer {
            for (node_key, node) in &mut self.nodes {
                if node_key != hidden && node.layer >= layer {
                    node.layer += 1;
                }
            }
            self.layers += 1;
        }

        self.structure_changed();
        debug!(node = %id, layer, layers = self.layers, "connection split");
        Ok(hidden)
    }

    /// Split a random connection with [`split_connection`](Self::split_connection).
    ///
    /// Connections leaving the bias node are skipped unless there is only one
    /// connection. With no connections at all, or when every connection
    /// leaves the bias, a connection is added instead and `Ok(None)` is
    /// returned.
    ///
    /// # Errors
    ///
    /// Propagates errors from [`add_connection`](Self::add_connection).
    pub fn add_node<R: Rng>(
        &mut self,
        ledger: &mut InnovationLedger,
        rng: &mut R,
    ) -> Result<Option<NodeKey>, GenomeError> {
        if self.connections.is_empty() {
            debug!("no connection to split, adding a connection instead");
            self.add_connection(ledger, rng)?;
            return Ok(None);
        }

        let bias = self.bias_key;
        let eligible: Vec<ConnectionKey> = if self.connections.len() == 1 {
            self.connections.keys().collect()
        } else {
            self.connections
                .iter()
                .filter(|(_, c)| c.from != bias)
                .map(|(key, _)| key)
                .collect()
        };

        if eligible.is_empty() {
            warn!(
                connections = self.connections.len(),
                "every connection leaves the bias node, adding a connection instead"
            );
            self.add_connection(ledger, rng)?;
            return Ok(None);
        }

        let key = eligible[rng.random_range(0..eligible.len())];
        self.split_connection(key, ledger).map(Some)
    }

    /// Apply one round of mutation.
    ///
    /// A genome without connections first gains one. Then three independent
    /// draws decide whether all weights are perturbed, a connection is added
    /// and a node is added.
    ///
    /// # Errors
    ///
    /// Propagates errors from the structural operators.
    pub fn mutate<R: Rng>(
        &mut self,
        ledger: &mut InnovationLedger,
        rng: &mut R,
    ) -> Result<(), GenomeError> {
        if self.connections.is_empty() {
            self.add_connection(ledger, rng)?;
        }

        if rng.random::<f32>() < self.config.weight_mutation_prob {
            for conn in self.connections.values_mut() {
                conn.mutate_weight(rng, &self.config);
            }
        }

        if rng.random::<f32>() < self.config.add_connection_prob {
            self.add_connection(ledger, rng)?;
        }

        if rng.random::<f32>() < self.config.add_node_prob {
            self.add_node(ledger, rng)?;
        }

        Ok(())
    }

    // ------------------------------------------------------------------
    // Recombination
    // ------------------------------------------------------------------

    fn endpoint_id(&self, gene: &ConnectionGene, key: NodeKey) -> Result<NodeId, GenomeError> {
        self.nodes
            .get(key)
            .map(|node| node.id)
            .ok_or(GenomeError::DanglingConnection {
                innovation: gene.innovation,
            })
    }

    /// Fresh nodes copied from this genome with no connections, plus the
    /// mapping from this genome's node keys to the copy's.
    fn skeleton(&self) -> (Self, HashMap<NodeKey, NodeKey>) {
        let mut nodes: SlotMap<NodeKey, NodeGene> =
            SlotMap::with_capacity_and_key(self.nodes.len());
        let mut remap = HashMap::with_capacity(self.nodes.len());
        for (key, node) in &self.nodes {
            remap.insert(key, nodes.insert(node.detached()));
        }

        let genome = Self {
            config: self.config.clone(),
            nodes,
            connections: SlotMap::with_capacity_and_key(self.connections.len()),
            input_keys: self.input_keys.iter().map(|k| remap[k]).collect(),
            output_keys: self.output_keys.iter().map(|k| remap[k]).collect(),
            bias_key: remap[&self.bias_key],
            layers: self.layers,
            next_node: self.next_node,
            network: Vec::new(),
            adjacency_current: false,
            network_current: false,
        };
        (genome, remap)
    }

    /// Produce a child with `self` as the fitter parent.
    ///
    /// Genes are aligned by innovation number. A matching gene comes from
    /// either parent with equal probability, and is disabled with
    /// [`NeatConfig::disable_inherited_prob`] if either copy is disabled.
    /// Genes only `self` has are inherited unchanged; genes only `other` has
    /// are dropped. The child's nodes are copies of `self`'s.
    ///
    /// # Errors
    ///
    /// Returns [`GenomeError::NodeNotFound`] if a gene taken from `other`
    /// references a node id this genome does not have, and
    /// [`GenomeError::DanglingConnection`] if an inherited gene points
    /// outside its parent's node arena.
    pub fn crossover<R: Rng>(&self, other: &Genome, rng: &mut R) -> Result<Genome, GenomeError> {
        let mut inherited: Vec<(&ConnectionGene, &Genome, bool)> =
            Vec::with_capacity(self.connections.len());
        let mut matched = 0usize;

        for conn in self.connections.values() {
            let Some(theirs) = other
                .connections
                .values()
                .find(|c| c.innovation == conn.innovation)
            else {
                inherited.push((conn, self, conn.enabled));
                continue;
            };
            matched += 1;

            let mut enabled = true;
            if (!conn.enabled || !theirs.enabled)
                && rng.random::<f32>() < self.config.disable_inherited_prob
            {
                enabled = false;
            }

            if rng.random::<f32>() < PRIMARY_GENE_PROB {
                inherited.push((conn, self, enabled));
            } else {
                inherited.push((theirs, other, enabled));
            }
        }

        let (mut child, _) = self.skeleton();
        let by_id: HashMap<NodeId, NodeKey> =
            child.nodes.iter().map(|(key, node)| (node.id, key)).collect();
        let resolve = |parent: &Genome, gene: &ConnectionGene, key: NodeKey| {
            parent
                .endpoint_id(gene, key)
                .and_then(|id| by_id.get(&id).copied().ok_or(GenomeError::NodeNotFound(id)))
        };

        for (gene, parent, enabled) in inherited {
            let from = resolve(parent, gene, gene.from)?;
            let to = resolve(parent, gene, gene.to)?;
            let mut conn = gene.rewired(from, to);
            conn.enabled = enabled;
            child.connections.insert(conn);
        }

        child.generate_network();
        debug!(
            genes = child.connections.len(),
            matched,
            "crossover complete"
        );
        Ok(child)
    }
}

impl Clone for Genome {
    /// Deep copy with fresh node state. Shares nothing with the source.
    fn clone(&self) -> Self {
        let (mut genome, remap) = self.skeleton();
        for conn in self.connections.values() {
            match (remap.get(&conn.from), remap.get(&conn.to)) {
                (Some(&from), Some(&to)) => {
                    genome.connections.insert(conn.rewired(from, to));
                }
                _ => warn!(
                    innovation = conn.innovation,
                    "dropping connection with an endpoint outside the genome"
                ),
            }
        }
        genome.generate_network();
        genome
    }
}
