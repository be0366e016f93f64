//! End-to-end orchestration tests over fake collaborator ports

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use smarttrim::app::{parse_range, TrimApp};
use smarttrim::{
    ExecutionBatch, MediaInspector, MediaSummary, MergePlan, SegmentMode, Timestamp, TrimError,
    TrimExecutor, TrimResult, TrimSession,
};

fn ts(s: &str) -> Timestamp {
    Timestamp::parse(s).unwrap()
}

/// Inspector returning a canned probe result
struct FakeInspector {
    summary: MediaSummary,
}

impl FakeInspector {
    fn standard() -> Self {
        Self {
            summary: MediaSummary {
                video_codec: "h264".to_string(),
                audio_codec: "aac".to_string(),
                keyframes: vec![ts("0"), ts("2"), ts("4"), ts("6"), ts("8")],
                duration: ts("10"),
            },
        }
    }
}

#[async_trait]
impl MediaInspector for FakeInspector {
    async fn inspect(&self, _path: &Path) -> TrimResult<MediaSummary> {
        Ok(self.summary.clone())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct DispatchedBatch {
    mode: SegmentMode,
    labels: Vec<String>,
}

/// Executor that records dispatches instead of spawning processes
#[derive(Default)]
struct RecordingExecutor {
    batches: Mutex<Vec<DispatchedBatch>>,
    merges: Mutex<Vec<Vec<String>>>,
    fail_copy: AtomicBool,
    fail_transcode: AtomicBool,
}

impl RecordingExecutor {
    fn failing_transcode() -> Self {
        let exec = Self::default();
        exec.fail_transcode.store(true, Ordering::SeqCst);
        exec
    }

    fn failing_copy() -> Self {
        let exec = Self::default();
        exec.fail_copy.store(true, Ordering::SeqCst);
        exec
    }

    fn failing_both() -> Self {
        let exec = Self::failing_copy();
        exec.fail_transcode.store(true, Ordering::SeqCst);
        exec
    }
}

#[async_trait]
impl TrimExecutor for RecordingExecutor {
    async fn run_batch(
        &self,
        batch: &ExecutionBatch,
        session: &TrimSession,
        _source: &Path,
    ) -> TrimResult<Vec<PathBuf>> {
        if batch.is_empty() {
            return Ok(Vec::new());
        }
        if batch.mode == SegmentMode::Copy && self.fail_copy.load(Ordering::SeqCst) {
            return Err(TrimError::CopyFailed {
                message: "simulated stream-copy failure".to_string(),
            });
        }
        if batch.mode == SegmentMode::Transcode && self.fail_transcode.load(Ordering::SeqCst) {
            return Err(TrimError::EncodeFailed {
                message: "simulated encoder failure".to_string(),
            });
        }
        self.batches.lock().unwrap().push(DispatchedBatch {
            mode: batch.mode,
            labels: batch.jobs.iter().map(|j| j.output.label()).collect(),
        });
        Ok(batch
            .jobs
            .iter()
            .map(|j| session.resolve(&j.output))
            .collect())
    }

    async fn run_merge(
        &self,
        plan: &MergePlan,
        _session: &TrimSession,
        _output: &Path,
    ) -> TrimResult<()> {
        self.merges
            .lock()
            .unwrap()
            .push(plan.inputs.iter().map(|r| r.label()).collect());
        Ok(())
    }
}

fn app_with(executor: Arc<RecordingExecutor>) -> TrimApp {
    TrimApp::new(Arc::new(FakeInspector::standard()), executor)
}

#[tokio::test]
async fn trim_dispatches_both_batches_then_merges_in_order() {
    let executor = Arc::new(RecordingExecutor::default());
    let app = app_with(executor.clone());

    let output = app
        .trim(
            Path::new("in.mp4"),
            parse_range("1", "7").unwrap(),
            Path::new("out.mp4"),
            None,
        )
        .await
        .unwrap();
    assert_eq!(output, PathBuf::from("out.mp4"));

    let batches = executor.batches.lock().unwrap().clone();
    assert_eq!(batches.len(), 2);
    let copy = batches.iter().find(|b| b.mode == SegmentMode::Copy).unwrap();
    let transcode = batches
        .iter()
        .find(|b| b.mode == SegmentMode::Transcode)
        .unwrap();
    assert_eq!(copy.labels, vec!["clip_middle"]);
    assert_eq!(transcode.labels, vec!["clip_start", "clip_end"]);

    let merges = executor.merges.lock().unwrap().clone();
    assert_eq!(
        merges,
        vec![vec![
            "clip_start".to_string(),
            "clip_middle".to_string(),
            "clip_end".to_string()
        ]]
    );
}

#[tokio::test]
async fn keyframe_aligned_trim_skips_the_transcode_batch() {
    let executor = Arc::new(RecordingExecutor::default());
    let app = app_with(executor.clone());

    app.trim(
        Path::new("in.mp4"),
        parse_range("2", "6").unwrap(),
        Path::new("out.mp4"),
        None,
    )
    .await
    .unwrap();

    let batches = executor.batches.lock().unwrap().clone();
    assert_eq!(batches.len(), 1);
    assert_eq!(batches[0].mode, SegmentMode::Copy);
}

#[tokio::test]
async fn failed_batch_aborts_before_merge() {
    let executor = Arc::new(RecordingExecutor::failing_transcode());
    let app = app_with(executor.clone());

    let err = app
        .trim(
            Path::new("in.mp4"),
            parse_range("1", "7").unwrap(),
            Path::new("out.mp4"),
            None,
        )
        .await
        .unwrap_err();
    assert!(matches!(err, TrimError::EncodeFailed { .. }));
    // The barrier held: no merge was dispatched for the failed request
    assert!(executor.merges.lock().unwrap().is_empty());
}

#[tokio::test]
async fn copy_failure_surfaces_even_when_transcode_succeeds() {
    let executor = Arc::new(RecordingExecutor::failing_copy());
    let app = app_with(executor.clone());

    let err = app
        .trim(
            Path::new("in.mp4"),
            parse_range("1", "7").unwrap(),
            Path::new("out.mp4"),
            None,
        )
        .await
        .unwrap_err();
    // The completed transcode batch must not mask the copy failure
    assert!(matches!(err, TrimError::CopyFailed { .. }));
    assert!(executor.merges.lock().unwrap().is_empty());
}

#[tokio::test]
async fn concurrent_batch_failures_report_the_copy_error() {
    let executor = Arc::new(RecordingExecutor::failing_both());
    let app = app_with(executor.clone());

    let err = app
        .trim(
            Path::new("in.mp4"),
            parse_range("1", "7").unwrap(),
            Path::new("out.mp4"),
            None,
        )
        .await
        .unwrap_err();
    assert!(matches!(err, TrimError::CopyFailed { .. }));
    assert!(executor.merges.lock().unwrap().is_empty());
}

#[tokio::test]
async fn zero_length_request_fails_planning() {
    let executor = Arc::new(RecordingExecutor::default());
    let app = app_with(executor.clone());

    let err = app
        .trim(
            Path::new("in.mp4"),
            // Clamps to nothing: entirely past the stream end
            parse_range("20", "30").unwrap(),
            Path::new("out.mp4"),
            None,
        )
        .await
        .unwrap_err();
    assert!(matches!(err, TrimError::InvalidRange { .. }));
    assert!(executor.batches.lock().unwrap().is_empty());
    assert!(executor.merges.lock().unwrap().is_empty());
}

#[tokio::test]
async fn plan_report_covers_requested_interval_without_dispatching() {
    let executor = Arc::new(RecordingExecutor::default());
    let app = app_with(executor.clone());

    let report = app
        .plan(Path::new("in.mp4"), parse_range("1", "7").unwrap())
        .await
        .unwrap();

    let segments = &report.plan.segments;
    assert_eq!(segments.first().unwrap().start, ts("1"));
    assert_eq!(segments.last().unwrap().end, ts("7"));
    for pair in segments.windows(2) {
        assert_eq!(pair[0].end, pair[1].start);
    }
    assert_eq!(report.batches.copy.len(), 1);
    assert_eq!(report.batches.transcode.len(), 2);
    assert!(report.merge.fix_timestamps);

    // Planning alone dispatches nothing; dropping the report cancels freely
    assert!(executor.batches.lock().unwrap().is_empty());
    assert!(executor.merges.lock().unwrap().is_empty());
}

#[tokio::test]
async fn inspect_reports_keyframe_timeline() {
    let app = app_with(Arc::new(RecordingExecutor::default()));
    let report = app.inspect(Path::new("in.mp4")).await.unwrap();

    assert_eq!(report.video_codec, "h264");
    assert_eq!(report.audio_codec, "aac");
    assert_eq!(report.keyframe_count, 5);
    assert_eq!(report.first_keyframe, ts("0"));
    assert_eq!(report.last_keyframe, ts("8"));
    assert_eq!(report.duration, ts("10"));
}

#[tokio::test]
async fn temp_parent_scopes_intermediate_outputs() {
    let temp = tempfile::TempDir::new().unwrap();
    let executor = Arc::new(RecordingExecutor::default());
    let app = app_with(executor.clone());

    app.trim(
        Path::new("in.mp4"),
        parse_range("1", "7").unwrap(),
        Path::new("out.mp4"),
        Some(temp.path()),
    )
    .await
    .unwrap();

    // Session temp dir lived under the requested parent and is gone now
    assert_eq!(std::fs::read_dir(temp.path()).unwrap().count(), 0);
}
