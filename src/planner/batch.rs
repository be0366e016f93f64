//! Grouping of planned segments into execution batches
//!
//! Segments that share a source and an execution mode can be produced by one
//! run of the external engine with multiple simultaneous outputs, amortizing
//! process start-up and decode cost. The batcher only groups descriptors; it
//! performs no I/O and execution order inside a batch is free.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::planner::{Segment, SegmentMode, TrimPlan};

/// Same-mode segments dispatchable as a single external execution
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutionBatch {
    /// Mode shared by every job in the batch
    pub mode: SegmentMode,
    /// Jobs in chronological order
    pub jobs: Vec<Segment>,
}

impl ExecutionBatch {
    fn empty(mode: SegmentMode) -> Self {
        Self { mode, jobs: Vec::new() }
    }

    /// True when there is nothing to dispatch
    pub fn is_empty(&self) -> bool {
        self.jobs.is_empty()
    }

    /// Number of jobs in the batch
    pub fn len(&self) -> usize {
        self.jobs.len()
    }
}

/// The copy and transcode batches for one or more trim requests
///
/// The two batches are mutually independent and may execute concurrently;
/// neither depends on the other's output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrimBatches {
    pub copy: ExecutionBatch,
    pub transcode: ExecutionBatch,
}

/// Partitions trim plans into per-mode execution batches
pub struct JobBatcher;

impl JobBatcher {
    /// Batch a single request's plan
    pub fn batch(plan: &TrimPlan) -> TrimBatches {
        Self::batch_all(std::slice::from_ref(plan))
    }

    /// Batch several requests against the same source into shared batches
    ///
    /// Relative segment order is preserved within each batch; outputs stay
    /// distinguishable through each segment's request-prefixed `OutputRef`.
    pub fn batch_all(plans: &[TrimPlan]) -> TrimBatches {
        let mut copy = ExecutionBatch::empty(SegmentMode::Copy);
        let mut transcode = ExecutionBatch::empty(SegmentMode::Transcode);

        for plan in plans {
            for segment in &plan.segments {
                match segment.mode {
                    SegmentMode::Copy => copy.jobs.push(segment.clone()),
                    SegmentMode::Transcode => transcode.jobs.push(segment.clone()),
                }
            }
        }

        debug!(
            requests = plans.len(),
            copy_jobs = copy.len(),
            transcode_jobs = transcode.len(),
            "batched trim plans"
        );
        TrimBatches { copy, transcode }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::planner::{KeyframeIndex, SegmentPlanner};
    use crate::timeline::{TimeRange, Timestamp};

    fn ts(s: &str) -> Timestamp {
        Timestamp::parse(s).unwrap()
    }

    fn plan_for(start: &str, end: &str, request: &str) -> TrimPlan {
        let frames = vec![ts("0"), ts("2"), ts("4"), ts("6"), ts("8")];
        let idx = KeyframeIndex::new(frames, ts("10")).unwrap();
        let session = TimeRange::new(Timestamp::zero(), idx.duration()).unwrap();
        SegmentPlanner::new(&idx)
            .plan(TimeRange::new(ts(start), ts(end)).unwrap(), session, request)
            .unwrap()
    }

    #[test]
    fn partitions_by_mode_preserving_order() {
        let plan = plan_for("1", "7", "clip");
        let batches = JobBatcher::batch(&plan);

        assert_eq!(batches.copy.len(), 1);
        assert_eq!(batches.transcode.len(), 2);
        assert_eq!(batches.copy.jobs[0].start, ts("2"));
        assert_eq!(batches.transcode.jobs[0].start, ts("1"));
        assert_eq!(batches.transcode.jobs[1].start, ts("6"));
        assert!(batches.transcode.jobs[0].start < batches.transcode.jobs[1].start);
    }

    #[test]
    fn aligned_plan_yields_empty_transcode_batch() {
        let plan = plan_for("2", "6", "clip");
        let batches = JobBatcher::batch(&plan);
        assert_eq!(batches.copy.len(), 1);
        assert!(batches.transcode.is_empty());
    }

    #[test]
    fn multiple_requests_share_batches_with_distinct_outputs() {
        let first = plan_for("1", "7", "intro");
        let second = plan_for("3", "9", "outro");
        let batches = JobBatcher::batch_all(&[first, second]);

        assert_eq!(batches.copy.len(), 2);
        assert_eq!(batches.transcode.len(), 4);

        let labels: Vec<String> = batches
            .transcode
            .jobs
            .iter()
            .map(|j| j.output.label())
            .collect();
        assert_eq!(labels.len(), 4);
        assert!(labels.contains(&"intro_start".to_string()));
        assert!(labels.contains(&"outro_end".to_string()));
        // No two jobs may resolve to the same artifact
        let mut deduped = labels.clone();
        deduped.sort();
        deduped.dedup();
        assert_eq!(deduped.len(), labels.len());
    }
}
