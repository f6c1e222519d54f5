//! Innovation tracking for structural mutations.
//!
//! Crossover aligns genes by innovation number, so two genomes that make the
//! same structural change independently must be handed the same number. The
//! [`InnovationLedger`] remembers every mutation it has numbered together with
//! a snapshot of the mutating genome's connection set. A later request reuses
//! a number only when both the endpoint pair and the genome shape match;
//! anything else mints a fresh, strictly increasing number.
//!
//! The ledger is an ordinary value owned by the caller and passed by `&mut`
//! into every mutating operator, which serializes access by construction.
//! Share it across threads behind a `Mutex` if mutation is parallelized.

use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::gene::NodeId;

/// One numbered structural mutation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InnovationRecord {
    /// Source node id of the new connection.
    pub from: NodeId,
    /// Target node id of the new connection.
    pub to: NodeId,
    /// The number assigned to the connection.
    pub innovation: u64,
    /// Sorted innovation numbers of the mutating genome's connections at the time.
    snapshot: Vec<u64>,
}

impl InnovationRecord {
    fn new(from: NodeId, to: NodeId, innovation: u64, genome_innovations: &[u64]) -> Self {
        let mut snapshot = genome_innovations.to_vec();
        snapshot.sort_unstable();
        Self {
            from,
            to,
            innovation,
            snapshot,
        }
    }

    /// The genome shape captured when this mutation was first seen.
    #[must_use]
    pub fn snapshot(&self) -> &[u64] {
        &self.snapshot
    }

    /// Whether a mutation `from -> to` on a genome whose connections carry
    /// `genome_innovations` is the same mutation as this record.
    #[must_use]
    pub fn matches(&self, from: NodeId, to: NodeId, genome_innovations: &[u64]) -> bool {
        self.from == from
            && self.to == to
            && self.snapshot.len() == genome_innovations.len()
            && genome_innovations
                .iter()
                .all(|inn| self.snapshot.binary_search(inn).is_ok())
    }
}

/// Run-wide registry of structural mutations and their innovation numbers.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct InnovationLedger {
    next_innovation: u64,
    epoch: u64,
    history: Vec<InnovationRecord>,
}

impl InnovationLedger {
    /// Create an empty ledger whose first innovation number is 0.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the innovation number for a connection `from -> to` being added
    /// to a genome whose existing connections carry `genome_innovations`.
    ///
    /// The first matching record wins. If none matches, a new number is
    /// minted and recorded together with the genome snapshot.
    pub fn innovation_number(&mut self, from: NodeId, to: NodeId, genome_innovations: &[u64]) -> u64 {
        if let Some(record) = self
            .history
            .iter()
            .find(|record| record.matches(from, to, genome_innovations))
        {
            trace!(%from, %to, innovation = record.innovation, "reusing innovation");
            return record.innovation;
        }

        let innovation = self.next_innovation;
        self.next_innovation += 1;
        self.history.push(InnovationRecord::new(
            from,
            to,
            innovation,
            genome_innovations,
        ));
        trace!(%from, %to, innovation, "minted innovation");
        innovation
    }

    /// Forget recorded mutations while keeping numbering monotonic.
    ///
    /// After this call no earlier mutation is reused; new ids continue from
    /// where the previous epoch stopped.
    pub fn begin_epoch(&mut self) {
        self.history.clear();
        self.epoch += 1;
        trace!(epoch = self.epoch, next = self.next_innovation, "innovation epoch started");
    }

    /// The number the next novel mutation will receive.
    #[must_use]
    pub fn next_innovation(&self) -> u64 {
        self.next_innovation
    }

    /// How many times [`begin_epoch`](Self::begin_epoch) has been called.
    #[must_use]
    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    /// Mutations recorded in the current epoch, oldest first.
    #[must_use]
    pub fn records(&self) -> &[InnovationRecord] {
        &self.history
    }

    /// Number of records in the current epoch.
    #[must_use]
    pub fn len(&self) -> usize {
        self.history.len()
    }

    /// Whether the current epoch has no records.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.history.is_empty()
    }
}
