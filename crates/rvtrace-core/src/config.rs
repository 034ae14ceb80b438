//! Per-cycle declaration of node counts and variable-size parameters.

use crate::node::{ALL_KINDS, NodeKind};

/// How many instances of each node kind a cycle carries, plus the sizing
/// parameters for the variable-size kinds.
///
/// A value type; it performs no validation of its own. Malformed
/// combinations (e.g. both `Pc32` and `Pc64` counts nonzero) surface from
/// [`crate::builder::CycleBuilder::new`].
#[derive(Clone, Copy, Debug, Default)]
pub struct CycleConfig {
    counts: [u32; 13],
    pub csr_count: u32,
    pub ram_size: i64,
}

impl CycleConfig {
    pub fn new() -> Self {
        Self::default()
    }

    fn index(kind: NodeKind) -> usize {
        kind.tag() as usize
    }

    pub fn set_count(&mut self, kind: NodeKind, n: u32) -> &mut Self {
        self.counts[Self::index(kind)] = n;
        self
    }

    pub fn count(&self, kind: NodeKind) -> u32 {
        self.counts[Self::index(kind)]
    }

    pub fn total_count(&self) -> u32 {
        self.counts.iter().sum()
    }

    /// Iterate kinds with a nonzero count, in catalog order.
    pub fn present_kinds(&self) -> impl Iterator<Item = NodeKind> + '_ {
        ALL_KINDS.into_iter().filter(move |k| self.count(*k) > 0)
    }
}
