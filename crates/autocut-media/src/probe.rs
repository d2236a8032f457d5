//! FFprobe video information.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use tokio::process::Command;

use crate::command::{check_ffprobe, run_captured};
use crate::error::{MediaError, MediaResult};

/// Exact frame rate as a reduced fraction (`30000/1001`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FrameRate {
    pub num: u64,
    pub den: u64,
}

impl FrameRate {
    /// Create a reduced frame rate. Returns `None` for zero terms.
    pub fn new(num: u64, den: u64) -> Option<Self> {
        if num == 0 || den == 0 {
            return None;
        }
        let g = gcd(num, den);
        Some(Self {
            num: num / g,
            den: den / g,
        })
    }

    /// Parse `"30/1"`, `"30000/1001"` or a decimal like `"29.97"`.
    pub fn parse(s: &str) -> Option<Self> {
        let s = s.trim();
        if let Some((num, den)) = s.split_once('/') {
            return Self::new(num.trim().parse().ok()?, den.trim().parse().ok()?);
        }
        // Decimal rates are kept to millisecond-frame precision.
        let fps: f64 = s.parse().ok()?;
        if !fps.is_finite() || fps <= 0.0 {
            return None;
        }
        Self::new((fps * 1000.0).round() as u64, 1000)
    }

    /// Frames per second.
    pub fn as_f64(&self) -> f64 {
        self.num as f64 / self.den as f64
    }

    /// Duration of one frame as `(numerator, denominator)` seconds.
    pub fn frame_duration(&self) -> (u64, u64) {
        (self.den, self.num)
    }
}

impl fmt::Display for FrameRate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.num, self.den)
    }
}

fn gcd(mut a: u64, mut b: u64) -> u64 {
    while b != 0 {
        let t = a % b;
        a = b;
        b = t;
    }
    a
}

/// Video file information.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VideoInfo {
    /// Duration in seconds
    pub duration: f64,
    /// Width in pixels
    pub width: u32,
    /// Height in pixels
    pub height: u32,
    /// Exact frame rate
    pub frame_rate: FrameRate,
    /// Video codec
    pub codec: String,
}

/// FFprobe JSON output format.
#[derive(Debug, Deserialize)]
struct FfprobeOutput {
    format: FfprobeFormat,
    #[serde(default)]
    streams: Vec<FfprobeStream>,
}

#[derive(Debug, Deserialize)]
struct FfprobeFormat {
    duration: Option<String>,
}

#[derive(Debug, Deserialize)]
struct FfprobeStream {
    codec_type: String,
    codec_name: Option<String>,
    width: Option<u32>,
    height: Option<u32>,
    r_frame_rate: Option<String>,
    avg_frame_rate: Option<String>,
}

/// Source media introspection.
#[async_trait]
pub trait MediaProber: Send + Sync {
    async fn probe(&self, path: &Path) -> MediaResult<VideoInfo>;
}

/// [`MediaProber`] backed by the `ffprobe` CLI.
#[derive(Debug, Clone, Default)]
pub struct FfprobeProber {
    timeout_secs: Option<u64>,
}

impl FfprobeProber {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_timeout(mut self, secs: u64) -> Self {
        self.timeout_secs = Some(secs);
        self
    }
}

#[async_trait]
impl MediaProber for FfprobeProber {
    async fn probe(&self, path: &Path) -> MediaResult<VideoInfo> {
        probe_video_with_timeout(path, self.timeout_secs).await
    }
}

async fn probe_video_with_timeout(path: &Path, timeout_secs: Option<u64>) -> MediaResult<VideoInfo> {
    if !path.exists() {
        return Err(MediaError::FileNotFound(path.to_path_buf()));
    }

    check_ffprobe()?;

    let mut command = Command::new("ffprobe");
    command
        .args([
            "-v",
            "quiet",
            "-print_format",
            "json",
            "-show_format",
            "-show_streams",
        ])
        .arg(path);
    let output = run_captured(&mut command, timeout_secs).await?;

    if !output.status.success() {
        return Err(MediaError::FfprobeFailed {
            message: "FFprobe failed".to_string(),
            stderr: Some(String::from_utf8_lossy(&output.stderr).to_string()),
        });
    }

    parse_probe_output(&output.stdout)
}

/// Turn raw ffprobe JSON into [`VideoInfo`].
fn parse_probe_output(stdout: &[u8]) -> MediaResult<VideoInfo> {
    let probe: FfprobeOutput = serde_json::from_slice(stdout)
        .map_err(|e| MediaError::metadata(format!("unreadable ffprobe output: {}", e)))?;

    let video_stream = probe
        .streams
        .iter()
        .find(|s| s.codec_type == "video")
        .ok_or_else(|| MediaError::metadata("No video stream found in file"))?;

    let width = video_stream
        .width
        .filter(|w| *w > 0)
        .ok_or_else(|| MediaError::metadata("video stream has no width"))?;
    let height = video_stream
        .height
        .filter(|h| *h > 0)
        .ok_or_else(|| MediaError::metadata("video stream has no height"))?;

    // r_frame_rate is the container's exact base rate; avg_frame_rate can be 0/0.
    let frame_rate = video_stream
        .r_frame_rate
        .as_deref()
        .and_then(FrameRate::parse)
        .or_else(|| video_stream.avg_frame_rate.as_deref().and_then(FrameRate::parse))
        .ok_or_else(|| MediaError::metadata("video stream has no usable frame rate"))?;

    let duration = probe
        .format
        .duration
        .as_ref()
        .and_then(|d| d.parse::<f64>().ok())
        .unwrap_or(0.0);

    Ok(VideoInfo {
        duration,
        width,
        height,
        frame_rate,
        codec: video_stream.codec_name.clone().unwrap_or_default(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_frame_rate() {
        assert_eq!(FrameRate::parse("30/1"), FrameRate::new(30, 1));
        assert_eq!(FrameRate::parse("60/2"), FrameRate::new(30, 1));
        assert!((FrameRate::parse("30000/1001").unwrap().as_f64() - 29.97).abs() < 0.01);
        assert!((FrameRate::parse("29.97").unwrap().as_f64() - 29.97).abs() < 0.001);
        assert!(FrameRate::parse("0/0").is_none());
        assert!(FrameRate::parse("abc").is_none());
    }

    #[test]
    fn test_frame_duration_is_reciprocal() {
        let rate = FrameRate::parse("30000/1001").unwrap();
        assert_eq!(rate.frame_duration(), (1001, 30000));
        assert_eq!(FrameRate::parse("25/1").unwrap().frame_duration(), (1, 25));
    }

    #[test]
    fn test_parse_probe_output() {
        let json = br#"{
            "format": {"duration": "12.500000"},
            "streams": [
                {"codec_type": "audio", "codec_name": "aac"},
                {"codec_type": "video", "codec_name": "h264", "width": 1920, "height": 1080,
                 "r_frame_rate": "25/1", "avg_frame_rate": "25/1"}
            ]
        }"#;
        let info = parse_probe_output(json).unwrap();
        assert_eq!((info.width, info.height), (1920, 1080));
        assert_eq!(info.frame_rate, FrameRate::new(25, 1).unwrap());
        assert!((info.duration - 12.5).abs() < 1e-9);
        assert_eq!(info.codec, "h264");
    }

    #[test]
    fn test_parse_probe_output_without_video() {
        let json = br#"{"format": {}, "streams": [{"codec_type": "audio"}]}"#;
        assert!(matches!(parse_probe_output(json), Err(MediaError::Metadata(_))));
    }

    #[tokio::test]
    async fn test_probe_missing_file() {
        let err = FfprobeProber::new()
            .probe(Path::new("/definitely/not/here.mp4"))
            .await
            .unwrap_err();
        assert!(matches!(err, MediaError::FileNotFound(_)));
    }
}
