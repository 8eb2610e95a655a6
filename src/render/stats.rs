//! Render statistics, accumulated per root.
//!
//! Every pass rebuilds the whole tree, so the creation counters grow by the
//! size of the tree on each pass. They are mainly useful to confirm how many
//! passes a sequence of state writes produced.

/// Counts for a single render pass.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct PassStats {
    pub elements_created: u64,
    pub text_nodes_created: u64,
    pub listeners_attached: u64,
    /// Empty and boolean children that produced no node
    pub children_skipped: u64,
}

/// Snapshot of accumulated render statistics.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct StatsSnapshot {
    pub passes: u64,
    pub failed_passes: u64,
    pub elements_created: u64,
    pub text_nodes_created: u64,
    pub listeners_attached: u64,
    pub children_skipped: u64,
    pub last_pass: Option<PassStats>,
}

#[derive(Default)]
pub(crate) struct RenderStats {
    totals: StatsSnapshot,
}

impl RenderStats {
    pub(crate) fn record_pass(&mut self, pass: PassStats) {
        let totals = &mut self.totals;
        totals.passes += 1;
        totals.elements_created += pass.elements_created;
        totals.text_nodes_created += pass.text_nodes_created;
        totals.listeners_attached += pass.listeners_attached;
        totals.children_skipped += pass.children_skipped;
        totals.last_pass = Some(pass);
    }

    pub(crate) fn record_failure(&mut self) {
        self.totals.failed_passes += 1;
    }

    pub(crate) fn snapshot(&self) -> StatsSnapshot {
        self.totals.clone()
    }
}
