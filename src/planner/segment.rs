//! Core segment planning: split a requested range into copy and transcode
//! segments along keyframe boundaries

use tracing::{debug, info};

use crate::error::{TrimError, TrimResult};
use crate::planner::{KeyframeIndex, OutputRef, Segment, SegmentMode, SegmentRole, TrimPlan};
use crate::timeline::TimeRange;

/// Plans the segment decomposition of a trim request
///
/// Keyframes are the only valid stream-copy cut points, so the largest
/// keyframe-aligned sub-interval of the request is copied verbatim and only
/// the sub-keyframe slivers at each edge are re-encoded. Re-encoded duration
/// stays under one keyframe interval per edge.
pub struct SegmentPlanner<'a> {
    index: &'a KeyframeIndex,
}

impl<'a> SegmentPlanner<'a> {
    /// Create a planner over a keyframe index
    pub fn new(index: &'a KeyframeIndex) -> Self {
        Self { index }
    }

    /// Plan the segments for `requested`, clamped into `session_range`
    ///
    /// `request` is the caller-supplied prefix that keys this request's
    /// output artifacts. Segments come back in chronological order and their
    /// concatenation reproduces the clamped interval exactly. A request that
    /// clamps to a zero-length interval is rejected as `InvalidRange`; an
    /// empty plan is never returned.
    pub fn plan(
        &self,
        requested: TimeRange,
        session_range: TimeRange,
        request: &str,
    ) -> TrimResult<TrimPlan> {
        let requested = requested.clamp_to(&session_range);
        if requested.is_empty() {
            return Err(TrimError::InvalidRange {
                start: requested.start.to_string(),
                end: requested.end.to_string(),
            });
        }

        let inner_start = self.index.ceiling_keyframe(requested.start);
        let inner_end = self.index.floor_keyframe(requested.end);
        debug!(
            requested = %requested,
            inner_start = %inner_start,
            inner_end = %inner_end,
            "computed interior keyframe bounds"
        );

        let mut segments = Vec::with_capacity(3);
        // floor_keyframe saturates up to the first keyframe for requests that
        // end before it, leaving inner_end past the request; no interior
        // keyframe exists then either
        if inner_start > inner_end || inner_end > requested.end {
            // No keyframe lies inside the request; re-encode it whole
            segments.push(Segment {
                start: requested.start,
                end: requested.end,
                mode: SegmentMode::Transcode,
                output: OutputRef::new(request, SegmentRole::Whole),
            });
        } else {
            let prefix_needed = requested.start != inner_start;
            let suffix_needed = requested.end != inner_end;

            if prefix_needed {
                segments.push(Segment {
                    start: requested.start,
                    end: inner_start,
                    mode: SegmentMode::Transcode,
                    output: OutputRef::new(request, SegmentRole::Prefix),
                });
            }
            // Equal bounds collapse the copy section to a single point;
            // at least one edge sliver exists then, since start < end
            if inner_start < inner_end {
                segments.push(Segment {
                    start: inner_start,
                    end: inner_end,
                    mode: SegmentMode::Copy,
                    output: OutputRef::new(request, SegmentRole::Middle),
                });
            }
            if suffix_needed {
                segments.push(Segment {
                    start: inner_end,
                    end: requested.end,
                    mode: SegmentMode::Transcode,
                    output: OutputRef::new(request, SegmentRole::Suffix),
                });
            }
        }

        let plan = TrimPlan {
            request: request.to_string(),
            requested,
            segments,
        };
        info!(
            request,
            segments = plan.segments.len(),
            transcode_duration = %plan.transcode_duration(),
            "planned trim request"
        );
        Ok(plan)
    }
}
