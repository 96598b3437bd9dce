//! Per-episode quality decision and multi-episode aggregation.

use std::fmt;

use crate::types::{Episode, MediaFile, Quality, QualityTable};

/// What a candidate file means for one episode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    /// The episode has no usable file.
    Import,
    /// The candidate strictly outranks the current file.
    Replace,
    /// The current file is as good or better.
    Skip,
}

impl Decision {
    /// Compares `candidate` with the episode's current file, if any.
    ///
    /// `current` is `None` both for episodes without a link and for links
    /// whose record no longer exists.
    #[must_use]
    pub fn decide(table: &QualityTable, current: Option<Quality>, candidate: Quality) -> Self {
        match current {
            None => Decision::Import,
            Some(current) if table.is_upgrade(candidate, current) => Decision::Replace,
            Some(_) => Decision::Skip,
        }
    }

    /// Returns `true` for `Import` and `Replace`.
    #[must_use]
    pub fn accepts(self) -> bool {
        !matches!(self, Decision::Skip)
    }
}

impl fmt::Display for Decision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Decision::Import => "import",
            Decision::Replace => "replace",
            Decision::Skip => "skip",
        };
        f.write_str(name)
    }
}

/// An episode, the file currently linked to it and the verdict for the
/// candidate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EpisodeDecision {
    pub episode: Episode,
    pub current: Option<MediaFile>,
    pub decision: Decision,
}

impl EpisodeDecision {
    pub fn new(
        table: &QualityTable,
        episode: Episode,
        current: Option<MediaFile>,
        candidate: Quality,
    ) -> Self {
        let decision = Decision::decide(table, current.as_ref().map(|f| f.quality), candidate);
        Self {
            episode,
            current,
            decision,
        }
    }
}

/// A candidate is imported when any matched episode accepts it.
#[must_use]
pub fn any_accepts(decisions: &[EpisodeDecision]) -> bool {
    decisions.iter().any(|d| d.decision.accepts())
}
