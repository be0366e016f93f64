//! Per-request execution state machine
//!
//! The copy and transcode batches of one request are independent and may be
//! dispatched in any order or concurrently. The merge step has a hard
//! ordering dependency: it joins over both batches and must not be
//! dispatched until every segment output is resolved and complete. This
//! tracker makes that barrier explicit and rejects illegal transitions.

use tracing::debug;

use crate::error::{TrimError, TrimResult};

/// Lifecycle state of a single trim request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestState {
    /// Plan produced, nothing dispatched; dropping it here cancels for free
    Planned,
    /// At least one batch is in flight
    Executing,
    /// Both batches completed; merge may be dispatched
    BothComplete,
    /// Merge handed to the execution layer
    MergeDispatched,
    /// Terminal: output produced
    MergeComplete,
    /// Terminal: the plan itself could not be produced
    PlanningFailed,
    /// Terminal: a copy or transcode batch failed
    EncodeFailed,
    /// Terminal: the final concatenation failed
    MergeFailed,
}

impl RequestState {
    /// True for states with no outgoing transitions
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            RequestState::MergeComplete
                | RequestState::PlanningFailed
                | RequestState::EncodeFailed
                | RequestState::MergeFailed
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BatchProgress {
    Pending,
    Dispatched,
    Complete,
}

/// Tracks one request from planning through merge
#[derive(Debug)]
pub struct RequestTracker {
    state: RequestState,
    copy: BatchProgress,
    transcode: BatchProgress,
}

impl RequestTracker {
    /// Start tracking a freshly planned request
    pub fn new() -> Self {
        Self {
            state: RequestState::Planned,
            copy: BatchProgress::Pending,
            transcode: BatchProgress::Pending,
        }
    }

    /// Current lifecycle state
    pub fn state(&self) -> RequestState {
        self.state
    }

    /// Record the copy batch being handed to the execution layer
    pub fn dispatch_copy(&mut self) -> TrimResult<()> {
        self.dispatch_batch(true)
    }

    /// Record the transcode batch being handed to the execution layer
    pub fn dispatch_transcode(&mut self) -> TrimResult<()> {
        self.dispatch_batch(false)
    }

    /// Record completion of the copy batch
    pub fn copy_complete(&mut self) -> TrimResult<()> {
        self.complete_batch(true)
    }

    /// Record completion of the transcode batch
    pub fn transcode_complete(&mut self) -> TrimResult<()> {
        self.complete_batch(false)
    }

    /// Record a failed copy or transcode batch; terminal
    pub fn batch_failed(&mut self) {
        self.state = RequestState::EncodeFailed;
    }

    /// Record a planning failure; terminal
    pub fn planning_failed(&mut self) {
        self.state = RequestState::PlanningFailed;
    }

    /// Dispatch the merge; only legal once both batches completed
    pub fn dispatch_merge(&mut self) -> TrimResult<()> {
        if self.state != RequestState::BothComplete {
            return Err(TrimError::InvalidState {
                message: format!(
                    "merge dispatched in state {:?}; both batches must be complete",
                    self.state
                ),
            });
        }
        self.state = RequestState::MergeDispatched;
        debug!("merge dispatched");
        Ok(())
    }

    /// Record a completed merge; terminal
    pub fn merge_complete(&mut self) -> TrimResult<()> {
        if self.state != RequestState::MergeDispatched {
            return Err(TrimError::InvalidState {
                message: format!("merge completion in state {:?}", self.state),
            });
        }
        self.state = RequestState::MergeComplete;
        Ok(())
    }

    /// Record a failed merge; terminal
    pub fn merge_failed(&mut self) {
        self.state = RequestState::MergeFailed;
    }

    fn dispatch_batch(&mut self, copy: bool) -> TrimResult<()> {
        if !matches!(self.state, RequestState::Planned | RequestState::Executing) {
            return Err(TrimError::InvalidState {
                message: format!("batch dispatched in state {:?}", self.state),
            });
        }
        let progress = if copy { &mut self.copy } else { &mut self.transcode };
        if *progress != BatchProgress::Pending {
            return Err(TrimError::InvalidState {
                message: "batch dispatched twice".to_string(),
            });
        }
        *progress = BatchProgress::Dispatched;
        self.state = RequestState::Executing;
        Ok(())
    }

    fn complete_batch(&mut self, copy: bool) -> TrimResult<()> {
        if self.state != RequestState::Executing {
            return Err(TrimError::InvalidState {
                message: format!("batch completion in state {:?}", self.state),
            });
        }
        let progress = if copy { &mut self.copy } else { &mut self.transcode };
        if *progress != BatchProgress::Dispatched {
            return Err(TrimError::InvalidState {
                message: "batch completed without being dispatched".to_string(),
            });
        }
        *progress = BatchProgress::Complete;
        if self.copy == BatchProgress::Complete && self.transcode == BatchProgress::Complete {
            self.state = RequestState::BothComplete;
        }
        Ok(())
    }
}

impl Default for RequestTracker {
    fn default() -> Self {
        Self::new()
    }
}
