//! smarttrim CLI
//!
//! Extracts a time range from a video with minimal quality loss: the
//! keyframe-aligned interior is stream-copied losslessly and only the
//! sub-keyframe edges are re-encoded, then all pieces are concatenated.
//!
//! # Usage
//!
//! ```bash
//! smarttrim trim --input video.mp4 --start 00:01:00 --end 00:02:00 --output clip.mp4
//! smarttrim plan --input video.mp4 --start 1.5 --end 7
//! smarttrim inspect --input video.mp4
//! ```

use anyhow::Result;
use clap::Parser;
use tracing::info;

use smarttrim::app::{parse_range, TrimApp};
use smarttrim::cli::{Cli, Commands};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    let app = TrimApp::with_process_adapters();

    match cli.command {
        Commands::Trim(args) => {
            let range = parse_range(&args.start, &args.end)?;
            let output = app
                .trim(&args.input, range, &args.output, args.temp_dir.as_deref())
                .await?;
            info!(output = %output.display(), "done");
        }
        Commands::Plan(args) => {
            let range = parse_range(&args.start, &args.end)?;
            let report = app.plan(&args.input, range).await?;
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        Commands::Inspect(args) => {
            let report = app.inspect(&args.input).await?;
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
    }

    Ok(())
}
