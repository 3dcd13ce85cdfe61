use shared_types::MatchId;

/// Result of applying one winner-advancement instruction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PropagationOutcome {
    /// Target did not exist and was created with only the target slot filled.
    Created { match_id: MatchId },
    /// Target slot was empty and now holds the winner.
    SlotFilled { match_id: MatchId, ready: bool },
    /// Target slot already held the winner. Nothing was written.
    AlreadyApplied { match_id: MatchId },
}

impl PropagationOutcome {
    #[must_use]
    pub fn match_id(&self) -> MatchId {
        match self {
            Self::Created { match_id }
            | Self::SlotFilled { match_id, .. }
            | Self::AlreadyApplied { match_id } => *match_id,
        }
    }

    /// Whether the store was written.
    #[must_use]
    pub fn wrote(&self) -> bool {
        !matches!(self, Self::AlreadyApplied { .. })
    }
}

/// Summary of a bulk seeding run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SeedingReport {
    pub created: usize,
    /// Pairs whose position already had a match.
    pub skipped: usize,
    /// One line per pair that could not be inserted.
    pub failures: Vec<String>,
}

impl SeedingReport {
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }
}
