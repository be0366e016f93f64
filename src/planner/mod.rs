//! Segment planning module
//!
//! Turns a requested time range plus the keyframe timeline into an ordered
//! list of segment descriptors: a stream-copy middle aligned to keyframes and
//! re-encoded slivers at the cut edges. The planners here are pure; probing
//! and execution live behind ports.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::timeline::{TimeRange, Timestamp};

pub mod batch;
pub mod keyframes;
pub mod merge;
pub mod segment;

pub use batch::{ExecutionBatch, JobBatcher, TrimBatches};
pub use keyframes::KeyframeIndex;
pub use merge::{MergePlan, MergePlanner};
pub use segment::SegmentPlanner;

/// How a segment is extracted from the source
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SegmentMode {
    /// Lossless stream copy (fast, keyframe-bound)
    Copy,
    /// Decode and re-encode (slow, frame-accurate)
    Transcode,
}

/// Position of a segment within its trim request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SegmentRole {
    /// Entire request fits between two adjacent keyframes
    Whole,
    /// Re-encoded sliver before the first interior keyframe
    Prefix,
    /// Keyframe-aligned stream-copy section
    Middle,
    /// Re-encoded sliver after the last interior keyframe
    Suffix,
}

impl SegmentRole {
    fn label(&self) -> &'static str {
        match self {
            SegmentRole::Whole => "output",
            SegmentRole::Prefix => "start",
            SegmentRole::Middle => "middle",
            SegmentRole::Suffix => "end",
        }
    }
}

/// Opaque handle to a segment's eventual output artifact
///
/// The core never resolves this to a path; the owning session maps it into
/// its scoped output location. The request prefix keeps outputs from
/// different requests against the same source distinguishable.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct OutputRef {
    request: String,
    role: SegmentRole,
}

impl OutputRef {
    /// Create an output reference for one segment of one request
    pub fn new(request: &str, role: SegmentRole) -> Self {
        Self {
            request: request.to_string(),
            role,
        }
    }

    /// Request prefix this output belongs to
    pub fn request(&self) -> &str {
        &self.request
    }

    /// Stable artifact label, e.g. `clip1_middle`
    pub fn label(&self) -> String {
        format!("{}_{}", self.request, self.role.label())
    }
}

impl fmt::Display for OutputRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// One plannable piece of a trim request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Segment {
    /// Segment start time (absolute source time)
    pub start: Timestamp,
    /// Segment end time (absolute source time)
    pub end: Timestamp,
    /// Copy or transcode
    pub mode: SegmentMode,
    /// Handle to the segment's output artifact
    pub output: OutputRef,
}

impl Segment {
    /// Segment length
    pub fn duration(&self) -> Timestamp {
        self.end.checked_sub(&self.start).unwrap_or_default()
    }
}

/// Ordered segment list for a single trim request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrimPlan {
    /// Request prefix, used for batching keys and output labels
    pub request: String,
    /// The clamped interval this plan reproduces exactly
    pub requested: TimeRange,
    /// Segments in chronological order
    pub segments: Vec<Segment>,
}

impl TrimPlan {
    /// Segments to be produced by lossless stream copy, in order
    pub fn copy_segments(&self) -> impl Iterator<Item = &Segment> {
        self.segments
            .iter()
            .filter(|s| s.mode == SegmentMode::Copy)
    }

    /// Segments to be produced by re-encoding, in order
    pub fn transcode_segments(&self) -> impl Iterator<Item = &Segment> {
        self.segments
            .iter()
            .filter(|s| s.mode == SegmentMode::Transcode)
    }

    /// Total re-encoded duration (the cost this plan minimizes)
    pub fn transcode_duration(&self) -> Timestamp {
        self.transcode_segments()
            .fold(Timestamp::zero(), |acc, s| {
                acc.checked_add(&s.duration()).unwrap_or(acc)
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn plan_enums_serialize_lowercase() {
        assert_eq!(serde_json::to_value(SegmentMode::Copy).unwrap(), json!("copy"));
        assert_eq!(
            serde_json::to_value(SegmentMode::Transcode).unwrap(),
            json!("transcode")
        );
        assert_eq!(
            serde_json::to_value(SegmentRole::Prefix).unwrap(),
            json!("prefix")
        );
    }

    #[test]
    fn output_ref_labels_by_request_and_role() {
        let output = OutputRef::new("clip", SegmentRole::Middle);
        assert_eq!(output.label(), "clip_middle");
        assert_eq!(OutputRef::new("clip", SegmentRole::Whole).label(), "clip_output");
    }
}
