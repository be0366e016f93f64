//! smarttrim library
//!
//! Plans extraction of an arbitrary time range from a video stream with
//! minimal quality loss and minimal re-encoding cost. Cuts exactly at
//! keyframes are performed by lossless stream copy; only the sub-keyframe
//! slivers at each edge of a request are re-encoded. The planning core is
//! pure and synchronous; probing and execution are collaborators behind
//! async ports.

pub mod adapters;
pub mod app;
pub mod cli;
pub mod error;
pub mod planner;
pub mod ports;
pub mod session;
pub mod timeline;

// Re-export commonly used types
pub use error::{TrimError, TrimResult};
pub use planner::{
    ExecutionBatch, JobBatcher, KeyframeIndex, MergePlan, MergePlanner, OutputRef, Segment,
    SegmentMode, SegmentPlanner, TrimBatches, TrimPlan,
};
pub use ports::{MediaInspector, MediaSummary, TrimExecutor};
pub use session::{RequestState, RequestTracker, TrimSession};
pub use timeline::{TimeRange, Timestamp};
