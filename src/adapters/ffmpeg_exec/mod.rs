//! FFmpeg adapter for the execution port
//!
//! One `ffmpeg` invocation per batch: a single seeked, timestamp-preserving
//! input fanned out to every output in the batch, so all same-mode segments
//! share one decode pass. The merge runs the concat demuxer over the list
//! file derived from the merge plan.

use std::ffi::OsString;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::process::Command;
use tracing::{debug, info};

use crate::error::{TrimError, TrimResult};
use crate::planner::{ExecutionBatch, MergePlan, SegmentMode};
use crate::ports::TrimExecutor;
use crate::session::TrimSession;

/// `ffmpeg`-backed batch and merge executor
pub struct FfmpegExecutor {
    binary: PathBuf,
}

impl FfmpegExecutor {
    /// Create an executor using `ffmpeg` from PATH
    pub fn new() -> Self {
        Self {
            binary: PathBuf::from("ffmpeg"),
        }
    }

    /// Use a specific ffmpeg binary
    pub fn with_binary(mut self, binary: impl Into<PathBuf>) -> Self {
        self.binary = binary.into();
        self
    }

    async fn run(&self, args: Vec<OsString>, on_fail: fn(String) -> TrimError) -> TrimResult<()> {
        debug!(binary = %self.binary.display(), ?args, "running ffmpeg");
        let output = Command::new(&self.binary)
            .args(&args)
            .output()
            .await
            .map_err(|e| on_fail(format!("failed to spawn {}: {}", self.binary.display(), e)))?;
        if !output.status.success() {
            return Err(on_fail(
                String::from_utf8_lossy(&output.stderr).trim().to_string(),
            ));
        }
        Ok(())
    }

    /// Build the argument list for one batch execution
    ///
    /// The input is seeked to the session's keyframe-aligned window with
    /// `-copyts`, so the absolute per-segment `-ss`/`-to` output bounds stay
    /// valid inside it.
    fn batch_args(
        batch: &ExecutionBatch,
        session: &TrimSession,
        source: &Path,
    ) -> (Vec<OsString>, Vec<PathBuf>) {
        let window = session.seek_window();
        let mut args: Vec<OsString> = vec![
            "-loglevel".into(),
            "error".into(),
            "-y".into(),
            "-ss".into(),
            window.start.to_string().into(),
            "-to".into(),
            window.end.to_string().into(),
            "-copyts".into(),
            "-i".into(),
            source.as_os_str().to_os_string(),
        ];

        let mut outputs = Vec::with_capacity(batch.jobs.len());
        for job in &batch.jobs {
            args.push("-ss".into());
            args.push(job.start.to_string().into());
            args.push("-to".into());
            args.push(job.end.to_string().into());
            match batch.mode {
                SegmentMode::Copy => {
                    args.push("-c".into());
                    args.push("copy".into());
                }
                SegmentMode::Transcode => {
                    args.push("-c:v".into());
                    args.push(session.video_codec().into());
                    args.push("-c:a".into());
                    args.push(session.audio_codec().into());
                }
            }
            let path = session.resolve(&job.output);
            args.push(path.as_os_str().to_os_string());
            outputs.push(path);
        }
        (args, outputs)
    }

    fn merge_args(plan: &MergePlan, list_path: &Path, output: &Path) -> Vec<OsString> {
        let mut args: Vec<OsString> = vec![
            "-loglevel".into(),
            "error".into(),
            "-y".into(),
            "-f".into(),
            "concat".into(),
            "-safe".into(),
            "0".into(),
            "-i".into(),
            list_path.as_os_str().to_os_string(),
        ];
        if plan.copy_streams {
            args.push("-c".into());
            args.push("copy".into());
        }
        if plan.fix_timestamps {
            args.push("-avoid_negative_ts".into());
            args.push("1".into());
        }
        args.push(output.as_os_str().to_os_string());
        args
    }

    /// Render the concat demuxer list file contents
    fn merge_list(paths: &[PathBuf]) -> String {
        let mut list = String::new();
        for path in paths {
            list.push_str("file '");
            // Concat demuxer quoting: close, escape, reopen
            list.push_str(&path.to_string_lossy().replace('\'', "'\\''"));
            list.push_str("'\n");
        }
        list
    }
}

impl Default for FfmpegExecutor {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl TrimExecutor for FfmpegExecutor {
    async fn run_batch(
        &self,
        batch: &ExecutionBatch,
        session: &TrimSession,
        source: &Path,
    ) -> TrimResult<Vec<PathBuf>> {
        if batch.is_empty() {
            return Ok(Vec::new());
        }
        let on_fail: fn(String) -> TrimError = match batch.mode {
            SegmentMode::Copy => |message| TrimError::CopyFailed { message },
            SegmentMode::Transcode => |message| TrimError::EncodeFailed { message },
        };

        let (args, outputs) = Self::batch_args(batch, session, source);
        info!(
            mode = ?batch.mode,
            jobs = batch.len(),
            source = %source.display(),
            "dispatching batch"
        );
        self.run(args, on_fail).await?;
        Ok(outputs)
    }

    async fn run_merge(
        &self,
        plan: &MergePlan,
        session: &TrimSession,
        output: &Path,
    ) -> TrimResult<()> {
        let request = plan
            .inputs
            .first()
            .map(|r| r.request().to_string())
            .ok_or_else(|| TrimError::MergeFailed {
                message: "merge plan has no inputs".to_string(),
            })?;

        let paths: Vec<PathBuf> = plan.inputs.iter().map(|r| session.resolve(r)).collect();
        let list_path = session.merge_list_path(&request);
        tokio::fs::write(&list_path, Self::merge_list(&paths)).await?;

        info!(
            inputs = plan.inputs.len(),
            output = %output.display(),
            "dispatching merge"
        );
        self.run(Self::merge_args(plan, &list_path, output), |message| {
            TrimError::MergeFailed { message }
        })
        .await
    }
}
