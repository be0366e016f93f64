//! CLI module for smarttrim
//!
//! Command-line argument parsing; command execution lives in `app`.

use clap::{Parser, Subcommand};

pub mod args;

/// smarttrim - keyframe-aware video trimming
///
/// Extracts a time range from a video with minimal quality loss: the
/// keyframe-aligned interior is stream-copied losslessly and only the
/// sub-keyframe edges are re-encoded.
#[derive(Parser)]
#[command(name = "smarttrim")]
#[command(about = "Smart trim video with minimal re-encoding")]
#[command(version)]
pub struct Cli {
    /// The command to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands
#[derive(Subcommand)]
pub enum Commands {
    /// Extract a time range from a video file
    Trim(args::TrimArgs),
    /// Print the segment plan for a time range without executing it
    Plan(args::PlanArgs),
    /// Inspect a video file's keyframe timeline and codecs
    Inspect(args::InspectArgs),
}
