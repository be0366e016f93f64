//! FFprobe adapter for the media-inspection port
//!
//! Shells out to `ffprobe` and parses its JSON output. Keyframe timestamps
//! arrive as decimal strings (`pkt_pts_time`) and are parsed exactly; they
//! are never routed through floating point.

use std::ffi::OsString;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde::Deserialize;
use tokio::process::Command;
use tracing::{debug, warn};

use crate::error::{TrimError, TrimResult};
use crate::ports::{MediaInspector, MediaSummary};
use crate::timeline::Timestamp;

/// `ffprobe`-backed media inspector
pub struct FfprobeInspector {
    binary: PathBuf,
}

#[derive(Debug, Deserialize)]
struct ProbeDocument {
    #[serde(default)]
    frames: Vec<ProbeFrame>,
    #[serde(default)]
    streams: Vec<ProbeStream>,
    format: Option<ProbeFormat>,
}

#[derive(Debug, Deserialize)]
struct ProbeFrame {
    // Field name depends on the ffprobe version
    pkt_pts_time: Option<String>,
    pts_time: Option<String>,
    best_effort_timestamp_time: Option<String>,
}

impl ProbeFrame {
    fn time(&self) -> Option<&str> {
        self.pkt_pts_time
            .as_deref()
            .or(self.pts_time.as_deref())
            .or(self.best_effort_timestamp_time.as_deref())
    }
}

#[derive(Debug, Deserialize)]
struct ProbeStream {
    codec_name: Option<String>,
    duration: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ProbeFormat {
    duration: Option<String>,
}

impl FfprobeInspector {
    /// Create an inspector using `ffprobe` from PATH
    pub fn new() -> Self {
        Self {
            binary: PathBuf::from("ffprobe"),
        }
    }

    /// Use a specific ffprobe binary
    pub fn with_binary(mut self, binary: impl Into<PathBuf>) -> Self {
        self.binary = binary.into();
        self
    }

    async fn probe(&self, args: Vec<OsString>) -> TrimResult<ProbeDocument> {
        let output = Command::new(&self.binary)
            .args(&args)
            .output()
            .await
            .map_err(|e| TrimError::ProbeFailed {
                message: format!("failed to spawn {}: {}", self.binary.display(), e),
            })?;
        if !output.status.success() {
            return Err(TrimError::ProbeFailed {
                message: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }
        serde_json::from_slice(&output.stdout).map_err(|e| TrimError::ProbeFailed {
            message: format!("unparseable ffprobe output: {}", e),
        })
    }

    fn video_args(path: &Path) -> Vec<OsString> {
        [
            "-v",
            "error",
            "-select_streams",
            "v:0",
            "-skip_frame",
            "nokey",
            "-show_entries",
            "frame=pkt_pts_time,pts_time,best_effort_timestamp_time:stream=codec_name,duration:format=duration",
            "-of",
            "json",
        ]
        .into_iter()
        .map(OsString::from)
        .chain(std::iter::once(path.as_os_str().to_os_string()))
        .collect()
    }

    fn audio_args(path: &Path) -> Vec<OsString> {
        [
            "-v",
            "error",
            "-select_streams",
            "a:0",
            "-show_entries",
            "stream=codec_name",
            "-of",
            "json",
        ]
        .into_iter()
        .map(OsString::from)
        .chain(std::iter::once(path.as_os_str().to_os_string()))
        .collect()
    }

    fn parse_keyframes(doc: &ProbeDocument) -> Vec<Timestamp> {
        let mut keyframes = Vec::with_capacity(doc.frames.len());
        for frame in &doc.frames {
            let Some(raw) = frame.time() else { continue };
            match Timestamp::parse(raw) {
                Ok(ts) => keyframes.push(ts),
                // ffprobe reports "N/A" for frames without a usable pts
                Err(_) => warn!(raw, "skipping keyframe with unusable timestamp"),
            }
        }
        keyframes
    }

    fn parse_duration(doc: &ProbeDocument) -> TrimResult<Timestamp> {
        let raw = doc
            .streams
            .first()
            .and_then(|s| s.duration.as_deref())
            .or(doc.format.as_ref().and_then(|f| f.duration.as_deref()))
            .ok_or_else(|| TrimError::InvalidMedia {
                message: "stream duration missing".to_string(),
            })?;
        Timestamp::parse(raw).map_err(|_| TrimError::InvalidMedia {
            message: format!("unparseable duration: {}", raw),
        })
    }
}

impl Default for FfprobeInspector {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl MediaInspector for FfprobeInspector {
    async fn inspect(&self, path: &Path) -> TrimResult<MediaSummary> {
        let video = self.probe(Self::video_args(path)).await?;
        let video_codec = video
            .streams
            .first()
            .and_then(|s| s.codec_name.clone())
            .ok_or_else(|| TrimError::InvalidMedia {
                message: "no video stream found".to_string(),
            })?;
        let keyframes = Self::parse_keyframes(&video);
        let duration = Self::parse_duration(&video)?;

        let audio = self.probe(Self::audio_args(path)).await?;
        let audio_codec = audio
            .streams
            .first()
            .and_then(|s| s.codec_name.clone())
            .ok_or_else(|| TrimError::InvalidMedia {
                message: "no audio stream found".to_string(),
            })?;

        debug!(
            video_codec,
            audio_codec,
            keyframes = keyframes.len(),
            duration = %duration,
            "probed media"
        );
        Ok(MediaSummary {
            video_codec,
            audio_codec,
            keyframes,
            duration,
        })
    }
}
