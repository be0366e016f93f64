//! Concatenation planning for completed segments

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{TrimError, TrimResult};
use crate::planner::{OutputRef, Segment};

/// Ordered concatenation job description
///
/// Lists the output artifacts to join, in chronological order. Must only be
/// executed once every referenced artifact is resolved and complete; the
/// per-request state machine enforces that barrier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MergePlan {
    /// Artifact references in concatenation order
    pub inputs: Vec<OutputRef>,
    /// Join by stream copy for all tracks
    pub copy_streams: bool,
    /// Correct timestamp discontinuities introduced by partial seeks
    pub fix_timestamps: bool,
}

/// Builds the merge plan from a request's chronological segment list
pub struct MergePlanner;

impl MergePlanner {
    /// Plan the final concatenation for `segments`
    ///
    /// Every segment here was produced by an independent seek into the
    /// source, so its timestamps do not continue its predecessor's; the
    /// discontinuity-correction flag is always set for a non-empty plan.
    pub fn plan(segments: &[Segment]) -> TrimResult<MergePlan> {
        if segments.is_empty() {
            return Err(TrimError::InvalidState {
                message: "cannot plan a merge over an empty segment list".to_string(),
            });
        }
        for pair in segments.windows(2) {
            if pair[0].end != pair[1].start {
                return Err(TrimError::InvalidState {
                    message: format!(
                        "segments out of order: {} ends at {} but {} starts at {}",
                        pair[0].output, pair[0].end, pair[1].output, pair[1].start
                    ),
                });
            }
        }

        let inputs: Vec<OutputRef> = segments.iter().map(|s| s.output.clone()).collect();
        debug!(inputs = inputs.len(), "planned merge");
        Ok(MergePlan {
            inputs,
            copy_streams: true,
            fix_timestamps: true,
        })
    }
}
