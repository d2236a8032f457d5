//! Denoising through FFmpeg.
//!
//! Three independent transforms that the denoise stage chains:
//! extract the audio track, run it through the `arnndn` RNNoise filter,
//! then mux the cleaned track back under the untouched video stream.

use async_trait::async_trait;
use std::path::Path;
use tracing::info;

use crate::command::{FfmpegCommand, FfmpegRunner};
use crate::error::{MediaError, MediaResult};

/// Audio parameters used for extraction and re-muxing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AudioSettings {
    pub sample_rate: u32,
    pub channels: u32,
    pub bitrate: String,
}

impl Default for AudioSettings {
    fn default() -> Self {
        Self {
            sample_rate: 48_000,
            channels: 2,
            bitrate: "192k".to_string(),
        }
    }
}

/// Denoising capability.
#[async_trait]
pub trait Denoiser: Send + Sync {
    /// Extract the audio track of `video` to a PCM WAV file.
    async fn extract_audio(&self, video: &Path, wav: &Path) -> MediaResult<()>;

    /// Apply noise reduction with the model at `model`.
    ///
    /// Fails with [`MediaError::ModelNotFound`] before invoking anything if
    /// the model file does not exist.
    async fn reduce_noise(&self, input: &Path, output: &Path, model: &Path) -> MediaResult<()>;

    /// Replace the audio of `original_video` with `clean_wav`.
    async fn remux(&self, clean_wav: &Path, original_video: &Path, output: &Path) -> MediaResult<()>;
}

/// [`Denoiser`] backed by the `ffmpeg` CLI.
#[derive(Debug, Clone, Default)]
pub struct FfmpegDenoiser {
    runner: FfmpegRunner,
    settings: AudioSettings,
}

impl FfmpegDenoiser {
    pub fn new(runner: FfmpegRunner, settings: AudioSettings) -> Self {
        Self { runner, settings }
    }
}

/// `ffmpeg -i video -vn -acodec pcm_s16le -ar 48000 -ac 2 out.wav`
pub fn extract_audio_command(video: &Path, wav: &Path, settings: &AudioSettings) -> FfmpegCommand {
    FfmpegCommand::new(video, wav)
        .no_video()
        .output_args(["-acodec", "pcm_s16le"])
        .audio_format(settings.sample_rate, settings.channels)
}

/// `ffmpeg -i in.wav -af arnndn=m=<model> out.wav`
pub fn reduce_noise_command(input: &Path, output: &Path, model: &Path) -> FfmpegCommand {
    FfmpegCommand::new(input, output).audio_filter(format!("arnndn=m={}", model.display()))
}

/// `ffmpeg -i video -i clean.wav -map 0:v:0 -map 1:a:0 -c:v copy -c:a aac ...`
pub fn remux_command(
    clean_wav: &Path,
    original_video: &Path,
    output: &Path,
    settings: &AudioSettings,
) -> FfmpegCommand {
    FfmpegCommand::new(original_video, output)
        .add_input(clean_wav)
        .map("0:v:0")
        .map("1:a:0")
        .video_codec("copy")
        .audio_codec("aac")
        .audio_bitrate(settings.bitrate.clone())
        .audio_format(settings.sample_rate, settings.channels)
}

fn require_file(path: &Path) -> MediaResult<()> {
    if path.exists() {
        Ok(())
    } else {
        Err(MediaError::FileNotFound(path.to_path_buf()))
    }
}

#[async_trait]
impl Denoiser for FfmpegDenoiser {
    async fn extract_audio(&self, video: &Path, wav: &Path) -> MediaResult<()> {
        require_file(video)?;
        info!("Converting {} to WAV format", video.display());
        self.runner
            .run(&extract_audio_command(video, wav, &self.settings))
            .await
    }

    async fn reduce_noise(&self, input: &Path, output: &Path, model: &Path) -> MediaResult<()> {
        if !model.exists() {
            return Err(MediaError::model_not_found(model.display().to_string()));
        }
        require_file(input)?;
        info!(
            model = %model.display(),
            "Applying noise reduction to {}",
            input.display()
        );
        self.runner.run(&reduce_noise_command(input, output, model)).await
    }

    async fn remux(&self, clean_wav: &Path, original_video: &Path, output: &Path) -> MediaResult<()> {
        require_file(clean_wav)?;
        require_file(original_video)?;
        info!("Muxing {} back into {}", clean_wav.display(), output.display());
        self.runner
            .run(&remux_command(clean_wav, original_video, output, &self.settings))
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_extract_audio_args() {
        let args = extract_audio_command(
            Path::new("talk.mp4"),
            Path::new("talk_raw.wav"),
            &AudioSettings::default(),
        )
        .build_args();
        let joined = args.join(" ");
        assert!(joined.contains("-i talk.mp4 -vn -acodec pcm_s16le -ar 48000 -ac 2 talk_raw.wav"));
    }

    #[test]
    fn test_reduce_noise_args() {
        let args = reduce_noise_command(
            Path::new("raw.wav"),
            Path::new("clean.wav"),
            Path::new("/models/lq.rnnn"),
        )
        .build_args();
        assert!(args.contains(&"arnndn=m=/models/lq.rnnn".to_string()));
    }

    #[test]
    fn test_remux_maps_video_then_clean_audio() {
        let args = remux_command(
            Path::new("clean.wav"),
            Path::new("talk.mp4"),
            Path::new("out/talk.mp4"),
            &AudioSettings::default(),
        )
        .build_args()
        .join(" ");
        assert!(args.contains("-i talk.mp4 -i clean.wav"));
        assert!(args.contains("-map 0:v:0 -map 1:a:0 -c:v copy -c:a aac -b:a 192k"));
    }

    #[tokio::test]
    async fn test_reduce_noise_missing_model() {
        let dir = TempDir::new().unwrap();
        let input = dir.path().join("raw.wav");
        std::fs::write(&input, b"pcm").unwrap();

        let err = FfmpegDenoiser::default()
            .reduce_noise(&input, &dir.path().join("clean.wav"), &dir.path().join("missing.rnnn"))
            .await
            .unwrap_err();
        assert!(matches!(err, MediaError::ModelNotFound(_)));
    }

    #[tokio::test]
    async fn test_extract_audio_missing_video() {
        let dir = TempDir::new().unwrap();
        let err = FfmpegDenoiser::default()
            .extract_audio(&dir.path().join("nope.mp4"), &dir.path().join("nope.wav"))
            .await
            .unwrap_err();
        assert!(matches!(err, MediaError::FileNotFound(_)));
    }
}
