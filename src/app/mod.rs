//! Application orchestration: probe, plan, dispatch, merge
//!
//! Wires the planning core to the collaborator ports. The copy and transcode
//! batches of a request run concurrently; the merge waits on both through
//! the request tracker's barrier before it is dispatched.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::Serialize;
use tracing::info;

use crate::adapters::{FfmpegExecutor, FfprobeInspector};
use crate::error::{TrimError, TrimResult};
use crate::planner::{JobBatcher, MergePlan, MergePlanner, TrimBatches, TrimPlan};
use crate::ports::{MediaInspector, TrimExecutor};
use crate::session::{RequestTracker, TrimSession};
use crate::timeline::{TimeRange, Timestamp};

/// Default request prefix for single-request CLI runs
const REQUEST_PREFIX: &str = "clip";

/// Serializable report for the `plan` command
#[derive(Debug, Serialize)]
pub struct PlanReport {
    pub video_codec: String,
    pub audio_codec: String,
    pub duration: Timestamp,
    pub plan: TrimPlan,
    pub batches: TrimBatches,
    pub merge: MergePlan,
}

/// Serializable report for the `inspect` command
#[derive(Debug, Serialize)]
pub struct InspectReport {
    pub video_codec: String,
    pub audio_codec: String,
    pub duration: Timestamp,
    pub keyframe_count: usize,
    pub first_keyframe: Timestamp,
    pub last_keyframe: Timestamp,
}

/// Trim application over injected collaborator ports
pub struct TrimApp {
    inspector: Arc<dyn MediaInspector>,
    executor: Arc<dyn TrimExecutor>,
}

impl TrimApp {
    /// Create an app with explicit port implementations
    pub fn new(inspector: Arc<dyn MediaInspector>, executor: Arc<dyn TrimExecutor>) -> Self {
        Self {
            inspector,
            executor,
        }
    }

    /// Create an app backed by the ffprobe/ffmpeg process adapters
    pub fn with_process_adapters() -> Self {
        Self::new(
            Arc::new(FfprobeInspector::new()),
            Arc::new(FfmpegExecutor::new()),
        )
    }

    /// Probe, plan, execute, and merge a single trim request
    pub async fn trim(
        &self,
        input: &Path,
        requested: TimeRange,
        output: &Path,
        temp_parent: Option<&Path>,
    ) -> TrimResult<PathBuf> {
        let summary = self.inspector.inspect(input).await?;
        let session = match temp_parent {
            Some(parent) => TrimSession::new_in(summary, parent)?,
            None => TrimSession::new(summary)?,
        };

        let mut tracker = RequestTracker::new();
        let plan = match session.plan(requested, REQUEST_PREFIX) {
            Ok(plan) => plan,
            Err(e) => {
                tracker.planning_failed();
                return Err(e);
            }
        };
        let batches = JobBatcher::batch(&plan);
        let merge = MergePlanner::plan(&plan.segments)?;

        tracker.dispatch_copy()?;
        tracker.dispatch_transcode()?;
        let (copy_result, transcode_result) = tokio::join!(
            self.executor.run_batch(&batches.copy, &session, input),
            self.executor.run_batch(&batches.transcode, &session, input),
        );
        // Settle both outcomes before propagating so a failure in one batch
        // never leaves the other dispatched-but-unrecorded
        let copy_settled = self.settle_batch(&mut tracker, copy_result, true);
        let transcode_settled = self.settle_batch(&mut tracker, transcode_result, false);
        copy_settled?;
        transcode_settled?;

        tracker.dispatch_merge()?;
        if let Err(e) = self.executor.run_merge(&merge, &session, output).await {
            tracker.merge_failed();
            return Err(e);
        }
        tracker.merge_complete()?;

        info!(
            output = %output.display(),
            segments = plan.segments.len(),
            transcoded = %plan.transcode_duration(),
            "trim complete"
        );
        Ok(output.to_path_buf())
    }

    /// Produce the full plan for a request without dispatching anything
    ///
    /// Dropping the report is a free cancellation: nothing has been handed
    /// to the execution layer.
    pub async fn plan(&self, input: &Path, requested: TimeRange) -> TrimResult<PlanReport> {
        let summary = self.inspector.inspect(input).await?;
        let video_codec = summary.video_codec.clone();
        let audio_codec = summary.audio_codec.clone();
        let session = TrimSession::new(summary)?;

        let plan = session.plan(requested, REQUEST_PREFIX)?;
        let batches = JobBatcher::batch(&plan);
        let merge = MergePlanner::plan(&plan.segments)?;

        Ok(PlanReport {
            video_codec,
            audio_codec,
            duration: session.index().duration(),
            plan,
            batches,
            merge,
        })
    }

    /// Summarize a source's codecs and keyframe timeline
    pub async fn inspect(&self, input: &Path) -> TrimResult<InspectReport> {
        let summary = self.inspector.inspect(input).await?;
        let video_codec = summary.video_codec.clone();
        let audio_codec = summary.audio_codec.clone();
        let session = TrimSession::new(summary)?;
        let index = session.index();

        Ok(InspectReport {
            video_codec,
            audio_codec,
            duration: index.duration(),
            keyframe_count: index.len(),
            first_keyframe: index.first(),
            last_keyframe: index.last(),
        })
    }

    fn settle_batch(
        &self,
        tracker: &mut RequestTracker,
        result: TrimResult<Vec<PathBuf>>,
        copy: bool,
    ) -> TrimResult<()> {
        match result {
            Ok(_) => {
                // The sibling batch may already have failed the request; a
                // completion after that is moot
                if tracker.state().is_terminal() {
                    return Ok(());
                }
                if copy {
                    tracker.copy_complete()
                } else {
                    tracker.transcode_complete()
                }
            }
            Err(e) => {
                tracker.batch_failed();
                Err(e)
            }
        }
    }
}

impl Default for TrimApp {
    fn default() -> Self {
        Self::with_process_adapters()
    }
}

/// Parse the CLI's start/end strings into a validated time range
pub fn parse_range(start: &str, end: &str) -> TrimResult<TimeRange> {
    let start = Timestamp::parse(start)?;
    let end = Timestamp::parse(end)?;
    if start >= end {
        return Err(TrimError::InvalidRange {
            start: start.to_string(),
            end: end.to_string(),
        });
    }
    TimeRange::new(start, end)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_range_accepts_mixed_formats() {
        let range = parse_range("1:30", "120.5").unwrap();
        assert_eq!(range.start, Timestamp::from_secs(90));
        assert_eq!(range.end, Timestamp::parse("120.5").unwrap());
    }

    #[test]
    fn parse_range_rejects_empty_interval() {
        assert!(matches!(
            parse_range("5", "5"),
            Err(TrimError::InvalidRange { .. })
        ));
        assert!(matches!(
            parse_range("6", "5"),
            Err(TrimError::InvalidRange { .. })
        ));
    }
}
