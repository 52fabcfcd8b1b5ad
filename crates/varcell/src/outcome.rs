#![forbid(unsafe_code)]

/// What an update operation decided.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Outcome {
    /// The snapshot equalled the last one; nothing was recomputed.
    Unchanged,
    /// A change was detected and the slots were rewritten.
    Changed,
}

impl Outcome {
    #[must_use]
    pub fn is_changed(self) -> bool {
        self == Self::Changed
    }

    #[must_use]
    pub fn is_unchanged(self) -> bool {
        self == Self::Unchanged
    }
}
