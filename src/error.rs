//! Error types for genome construction, mutation and evaluation.

use thiserror::Error;

use crate::gene::NodeId;

/// Errors surfaced by [`Genome`](crate::Genome) operators.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GenomeError {
    /// The input vector handed to `feed_forward` does not match the genome's input count.
    #[error("input length mismatch: expected {expected}, got {actual}")]
    InputLengthMismatch {
        /// Number of input nodes in the genome.
        expected: usize,
        /// Length of the vector that was supplied.
        actual: usize,
    },

    /// A node id did not resolve inside the genome.
    ///
    /// Callers must treat this as a broken invariant and never substitute a default node.
    #[error("node {0} does not exist in this genome")]
    NodeNotFound(NodeId),

    /// A connection key did not resolve inside the genome.
    #[error("connection does not exist in this genome")]
    ConnectionNotFound,

    /// A connection endpoint does not resolve inside its own genome.
    #[error("connection with innovation {innovation} has an endpoint outside its genome")]
    DanglingConnection {
        /// Innovation number of the broken gene.
        innovation: u64,
    },

    /// A bounded search for a structural mutation site found nothing.
    #[error("{operation} found no valid candidate after {attempts} attempts")]
    ExhaustedSearch {
        /// The operator that gave up.
        operation: &'static str,
        /// How many random draws were made before the exhaustive scan.
        attempts: usize,
    },

    /// A [`NeatConfig`](crate::NeatConfig) field is out of range.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}
