//! Per-source trim session
//!
//! A `TrimSession` owns everything derived from one probed source: the
//! immutable keyframe index, the session time range, the codec identifiers
//! used as re-encode targets, and a scoped temporary directory that resolves
//! opaque output references to paths. The directory is released when the
//! session drops, on every exit path.

use std::path::{Path, PathBuf};

use tempfile::TempDir;
use tracing::info;

use crate::error::TrimResult;
use crate::planner::{KeyframeIndex, OutputRef, SegmentPlanner, TrimPlan};
use crate::ports::MediaSummary;
use crate::timeline::{TimeRange, Timestamp};

pub mod state;

pub use state::{RequestState, RequestTracker};

/// Planning context for one probed source stream
#[derive(Debug)]
pub struct TrimSession {
    index: KeyframeIndex,
    range: TimeRange,
    video_codec: String,
    audio_codec: String,
    temp: TempDir,
}

impl TrimSession {
    /// Create a session covering the full stream
    pub fn new(summary: MediaSummary) -> TrimResult<Self> {
        Self::build(summary, None)
    }

    /// Create a session with its temp directory under `parent`
    pub fn new_in(summary: MediaSummary, parent: &Path) -> TrimResult<Self> {
        Self::build(summary, Some(parent))
    }

    /// Restrict the session to a sub-range of the stream
    ///
    /// Used when the session itself represents a previously-trimmed
    /// sub-range; all requests planned through it are clamped into it.
    pub fn with_range(mut self, range: TimeRange) -> Self {
        let bounds = TimeRange {
            start: Timestamp::zero(),
            end: self.index.duration(),
        };
        self.range = range.clamp_to(&bounds);
        self
    }

    fn build(summary: MediaSummary, temp_parent: Option<&Path>) -> TrimResult<Self> {
        let index = KeyframeIndex::new(summary.keyframes, summary.duration)?;
        let range = TimeRange {
            start: Timestamp::zero(),
            end: index.duration(),
        };
        let temp = match temp_parent {
            Some(parent) => TempDir::new_in(parent)?,
            None => TempDir::new()?,
        };
        info!(
            keyframes = index.len(),
            duration = %index.duration(),
            video_codec = summary.video_codec,
            audio_codec = summary.audio_codec,
            temp = %temp.path().display(),
            "opened trim session"
        );
        Ok(Self {
            index,
            range,
            video_codec: summary.video_codec,
            audio_codec: summary.audio_codec,
            temp,
        })
    }

    /// Plan a trim request against this session
    pub fn plan(&self, requested: TimeRange, request: &str) -> TrimResult<TrimPlan> {
        SegmentPlanner::new(&self.index).plan(requested, self.range, request)
    }

    /// Resolve an opaque output reference to a path in session scope
    pub fn resolve(&self, output: &OutputRef) -> PathBuf {
        self.temp.path().join(format!("{}.ts", output.label()))
    }

    /// Path for a request's concat list file
    pub fn merge_list_path(&self, request: &str) -> PathBuf {
        self.temp.path().join(format!("{}_concat.txt", request))
    }

    /// Keyframe-aligned window enclosing the session range
    ///
    /// The execution layer seeks the shared decode input to this window so
    /// that per-segment cuts stay inside already-demuxed data; with absolute
    /// timestamps preserved, segment bounds remain valid inside it.
    pub fn seek_window(&self) -> TimeRange {
        TimeRange {
            start: self.index.floor_keyframe(self.range.start),
            end: self.index.ceiling_keyframe(self.range.end),
        }
    }

    /// The keyframe index, shared read-only across requests
    pub fn index(&self) -> &KeyframeIndex {
        &self.index
    }

    /// The session's overall time range
    pub fn range(&self) -> TimeRange {
        self.range
    }

    /// Re-encode target video codec
    pub fn video_codec(&self) -> &str {
        &self.video_codec
    }

    /// Re-encode target audio codec
    pub fn audio_codec(&self) -> &str {
        &self.audio_codec
    }
}
