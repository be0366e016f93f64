//! Immutable keyframe timeline with floor/ceiling cut-point queries

use tracing::debug;

use crate::error::{TrimError, TrimResult};
use crate::timeline::Timestamp;

/// Greatest element `<= target` in a sorted slice
pub fn floor_entry<'a, T: Ord>(sorted: &'a [T], target: &T) -> Option<&'a T> {
    let idx = sorted.partition_point(|x| x <= target);
    idx.checked_sub(1).map(|i| &sorted[i])
}

/// Least element `>= target` in a sorted slice
pub fn ceiling_entry<'a, T: Ord>(sorted: &'a [T], target: &T) -> Option<&'a T> {
    sorted.get(sorted.partition_point(|x| x < target))
}

/// Sorted keyframe timestamps plus total stream duration
///
/// Built once per source from probe data and never mutated, so it is safe to
/// share across any number of concurrent planning calls.
#[derive(Debug, Clone)]
pub struct KeyframeIndex {
    timestamps: Vec<Timestamp>,
    duration: Timestamp,
}

impl KeyframeIndex {
    /// Build an index from probed keyframe timestamps and stream duration
    pub fn new(mut timestamps: Vec<Timestamp>, duration: Timestamp) -> TrimResult<Self> {
        if timestamps.is_empty() {
            return Err(TrimError::InvalidMedia {
                message: "no keyframes found in video stream".to_string(),
            });
        }
        if duration == Timestamp::zero() {
            return Err(TrimError::InvalidMedia {
                message: "stream duration missing or zero".to_string(),
            });
        }

        // Probe output should already be ordered, but sort to be safe
        timestamps.sort();

        let last = timestamps[timestamps.len() - 1];
        if duration < last {
            return Err(TrimError::InvalidMedia {
                message: format!(
                    "duration {} precedes last keyframe {}",
                    duration, last
                ),
            });
        }

        debug!(
            keyframes = timestamps.len(),
            duration = %duration,
            "built keyframe index"
        );
        Ok(Self {
            timestamps,
            duration,
        })
    }

    /// Greatest keyframe at or before `t`
    ///
    /// A `t` before the first keyframe floors to the first keyframe: every
    /// timestamp has a defined floor, never a failure.
    pub fn floor_keyframe(&self, t: Timestamp) -> Timestamp {
        *floor_entry(&self.timestamps, &t).unwrap_or(&self.timestamps[0])
    }

    /// Least keyframe at or after `t`
    ///
    /// A `t` after the last keyframe ceils to the stream duration, not the
    /// last keyframe: the ceiling is a safe upper cut point and the stream
    /// end always qualifies.
    pub fn ceiling_keyframe(&self, t: Timestamp) -> Timestamp {
        *ceiling_entry(&self.timestamps, &t).unwrap_or(&self.duration)
    }

    /// Total stream duration
    pub fn duration(&self) -> Timestamp {
        self.duration
    }

    /// First keyframe timestamp
    pub fn first(&self) -> Timestamp {
        self.timestamps[0]
    }

    /// Last keyframe timestamp
    pub fn last(&self) -> Timestamp {
        self.timestamps[self.timestamps.len() - 1]
    }

    /// Number of keyframes
    pub fn len(&self) -> usize {
        self.timestamps.len()
    }

    /// True when the index holds no keyframes (never, post-construction)
    pub fn is_empty(&self) -> bool {
        self.timestamps.is_empty()
    }
}
