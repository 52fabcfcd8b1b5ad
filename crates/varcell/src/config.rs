#![forbid(unsafe_code)]

//! Per-cell policies for producer invocation and snapshot commit ordering.

/// How often the producer runs when a change is detected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Produce {
    /// Invoke the producer once and clone the value into every slot.
    ///
    /// Slots can never diverge, even for a non-deterministic producer.
    #[default]
    Once,
    /// Invoke the producer once per slot (work first, then result).
    ///
    /// Kept for owners that rely on the producer running for its side
    /// effects on every slot. A non-deterministic producer can leave `work`
    /// and `result` holding different values. All calls complete before any
    /// slot is written, so a failure part-way through stores nothing.
    PerSlot,
}

/// When the new snapshot is written relative to the producer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Commit {
    /// Write the snapshot only after every slot has been stored.
    ///
    /// A failing or cancelled producer leaves the cell exactly as it was, so
    /// the next update sees the same change again.
    #[default]
    AfterProduce,
    /// Write the snapshot before running the producer.
    ///
    /// A failing or cancelled producer leaves a committed snapshot next to a
    /// stale result; the next update with the same value is a no-op.
    BeforeProduce,
}

/// Configuration for a [`ValueCell`](crate::ValueCell).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CellConfig {
    /// Producer invocation policy.
    /// Default: [`Produce::Once`].
    pub produce: Produce,

    /// Snapshot commit ordering.
    /// Default: [`Commit::AfterProduce`].
    pub commit: Commit,

    /// Name attached to log events emitted by the cell.
    /// Default: `None`.
    pub label: Option<&'static str>,
}

impl Default for CellConfig {
    fn default() -> Self {
        Self {
            produce: Produce::Once,
            commit: Commit::AfterProduce,
            label: None,
        }
    }
}

impl CellConfig {
    /// One producer call per slot, snapshot committed before producing.
    #[must_use]
    pub fn compat() -> Self {
        Self {
            produce: Produce::PerSlot,
            commit: Commit::BeforeProduce,
            label: None,
        }
    }

    /// Set the producer invocation policy.
    #[must_use]
    pub fn with_produce(mut self, produce: Produce) -> Self {
        self.produce = produce;
        self
    }

    /// Set the snapshot commit ordering.
    #[must_use]
    pub fn with_commit(mut self, commit: Commit) -> Self {
        self.commit = commit;
        self
    }

    /// Set the label attached to log events.
    #[must_use]
    pub fn with_label(mut self, label: &'static str) -> Self {
        self.label = Some(label);
        self
    }

    pub(crate) fn label(&self) -> &'static str {
        self.label.unwrap_or("-")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_once_and_after_produce() {
        let config = CellConfig::default();
        assert_eq!(config.produce, Produce::Once);
        assert_eq!(config.commit, Commit::AfterProduce);
        assert_eq!(config.label, None);
        assert_eq!(config.label(), "-");
    }

    #[test]
    fn compat_preset() {
        let config = CellConfig::compat();
        assert_eq!(config.produce, Produce::PerSlot);
        assert_eq!(config.commit, Commit::BeforeProduce);
    }

    #[test]
    fn builders_override_fields() {
        let config = CellConfig::default()
            .with_produce(Produce::PerSlot)
            .with_commit(Commit::BeforeProduce)
            .with_label("editor");
        assert_eq!(config, CellConfig::compat().with_label("editor"));
        assert_eq!(config.label(), "editor");
    }
}
