/// Pipeline stage definitions for tracking request progress
///
/// This module defines the stages a request moves through and which moves
/// between them are legal.
use crate::ReelError;
use std::fmt;

/// Represents the current stage of one pipeline run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PipelineStage {
    // ===== Collection =====
    /// Fetching the first list page (or the whole spreadsheet)
    FetchingFirstPage,

    /// Reading the page count from the first page
    CountingPages,

    /// Fetching pages 2..N sequentially
    FetchingRemainingPages,

    // ===== Resolution =====
    /// Resolving films through the bounded worker pool
    ResolvingItems,

    /// Ordering the finished results
    Sorting,

    // ===== Terminal =====
    /// Results are ready
    Done,

    /// The first page could not be retrieved
    Failed,
}

impl PipelineStage {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Done | Self::Failed)
    }

    /// Returns true when moving from `self` to `next` is legal
    ///
    /// Sources that deliver everything in one document skip straight from
    /// `FetchingFirstPage` to `ResolvingItems`. Only `FetchingFirstPage` may fail.
    pub fn can_transition_to(&self, next: PipelineStage) -> bool {
        use PipelineStage::*;
        matches!(
            (self, next),
            (FetchingFirstPage, CountingPages)
                | (FetchingFirstPage, ResolvingItems)
                | (FetchingFirstPage, Failed)
                | (CountingPages, FetchingRemainingPages)
                | (FetchingRemainingPages, ResolvingItems)
                | (ResolvingItems, Sorting)
                | (Sorting, Done)
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::FetchingFirstPage => "fetching_first_page",
            Self::CountingPages => "counting_pages",
            Self::FetchingRemainingPages => "fetching_remaining_pages",
            Self::ResolvingItems => "resolving_items",
            Self::Sorting => "sorting",
            Self::Done => "done",
            Self::Failed => "failed",
        }
    }
}

impl fmt::Display for PipelineStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Records the stages of one run and rejects illegal moves
#[derive(Debug, Clone)]
pub struct StageTracker {
    history: Vec<PipelineStage>,
}

impl Default for StageTracker {
    fn default() -> Self {
        Self::new()
    }
}

impl StageTracker {
    /// Starts in `FetchingFirstPage`
    pub fn new() -> Self {
        Self {
            history: vec![PipelineStage::FetchingFirstPage],
        }
    }

    pub fn current(&self) -> PipelineStage {
        self.history
            .last()
            .copied()
            .unwrap_or(PipelineStage::FetchingFirstPage)
    }

    pub fn history(&self) -> &[PipelineStage] {
        &self.history
    }

    pub fn advance(&mut self, next: PipelineStage) -> Result<(), ReelError> {
        let from = self.current();
        if !from.can_transition_to(next) {
            return Err(ReelError::InvalidTransition { from, to: next });
        }
        tracing::info!("Pipeline stage: {} -> {}", from, next);
        self.history.push(next);
        Ok(())
    }

    /// Moves to `Failed` when still collecting the first page
    pub fn fail(&mut self) {
        if let Err(e) = self.advance(PipelineStage::Failed) {
            tracing::debug!("Not marking run as failed: {}", e);
        }
    }
}
