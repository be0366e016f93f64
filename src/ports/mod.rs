//! Ports - contracts between the planning core and its collaborators
//!
//! Probing a container for its codec metadata and keyframe timeline, and
//! running the actual copy/transcode/merge work, are external concerns. The
//! core only consumes and produces the descriptors defined here.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::TrimResult;
use crate::planner::{ExecutionBatch, MergePlan};
use crate::session::TrimSession;
use crate::timeline::Timestamp;

/// Probe result: everything the planning core needs to know about a source
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MediaSummary {
    /// Video codec identifier, reused verbatim as the re-encode target so
    /// transcoded segments stay merge-compatible with copied ones
    pub video_codec: String,
    /// Audio codec identifier, same contract as `video_codec`
    pub audio_codec: String,
    /// Keyframe timestamps of the primary video stream, ascending
    pub keyframes: Vec<Timestamp>,
    /// Total stream duration
    pub duration: Timestamp,
}

/// Port for the media-inspection collaborator
#[async_trait]
pub trait MediaInspector: Send + Sync {
    /// Probe a media file for codecs, keyframes, and duration
    async fn inspect(&self, path: &Path) -> TrimResult<MediaSummary>;
}

/// Port for the execution collaborator that runs copy/transcode/merge work
///
/// Failure of a dispatched batch must surface as an error here; the caller's
/// state machine guarantees a failed batch never proceeds to merge.
/// Cancellation and timeout policy belong to implementations of this port.
#[async_trait]
pub trait TrimExecutor: Send + Sync {
    /// Execute every job in a batch against `source`, resolving each job's
    /// output reference through the session; returns the produced artifacts
    /// in job order. An empty batch completes immediately.
    async fn run_batch(
        &self,
        batch: &ExecutionBatch,
        session: &TrimSession,
        source: &Path,
    ) -> TrimResult<Vec<PathBuf>>;

    /// Execute the final concatenation into `output`
    async fn run_merge(
        &self,
        plan: &MergePlan,
        session: &TrimSession,
        output: &Path,
    ) -> TrimResult<()>;
}
