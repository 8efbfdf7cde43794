// Muxer - combines the downloaded video and audio tracks with ffmpeg
//
// Two tiers, first success wins:
//   1. stream copy into a container that accepts any codec (mkv)
//   2. H.264/AAC transcode into mp4
//
//   NotStarted -> CopyAttempted(ok)  -> Succeeded(Copy)
//                 CopyAttempted(err) -> TranscodeAttempted(ok)  -> Succeeded(Transcode)
//                                       TranscodeAttempted(err) -> Failed

use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info, warn};

use super::errors::DownloadError;
use super::models::{DownloadProgress, MuxAttempt, MuxStrategy};
use super::traits::{CommandRunner, ProgressEmitter};
use super::utils::{output_path, remove_quietly, tail_lines};
use crate::config::EncoderConfig;

const TRANSCODE_CONTAINER: &str = "mp4";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MuxState {
    NotStarted,
    /// Copy tier ran; `true` when ffmpeg exited zero
    CopyAttempted(bool),
    /// Transcode tier ran; `true` when ffmpeg exited zero
    TranscodeAttempted(bool),
    Succeeded(MuxStrategy),
    Failed,
}

impl MuxState {
    /// Encoder run needed to leave this state
    pub fn required_run(&self) -> Option<MuxStrategy> {
        match self {
            Self::NotStarted => Some(MuxStrategy::Copy),
            Self::CopyAttempted(false) => Some(MuxStrategy::Transcode),
            _ => None,
        }
    }

    /// Move forward; `exit_ok` is the outcome of `required_run()` and is
    /// ignored by states that do not require one
    pub fn next(self, exit_ok: bool) -> Self {
        match self {
            Self::NotStarted => Self::CopyAttempted(exit_ok),
            Self::CopyAttempted(true) => Self::Succeeded(MuxStrategy::Copy),
            Self::CopyAttempted(false) => Self::TranscodeAttempted(exit_ok),
            Self::TranscodeAttempted(true) => Self::Succeeded(MuxStrategy::Transcode),
            Self::TranscodeAttempted(false) => Self::Failed,
            terminal => terminal,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Succeeded(_) | Self::Failed)
    }
}

pub struct Muxer {
    ffmpeg: PathBuf,
    encoder: EncoderConfig,
    runner: Arc<dyn CommandRunner>,
    emitter: Option<Arc<dyn ProgressEmitter>>,
}

impl Muxer {
    pub fn new(ffmpeg: PathBuf, encoder: EncoderConfig, runner: Arc<dyn CommandRunner>) -> Self {
        Self {
            ffmpeg,
            encoder,
            runner,
            emitter: None,
        }
    }

    pub fn with_emitter(mut self, emitter: Arc<dyn ProgressEmitter>) -> Self {
        self.emitter = Some(emitter);
        self
    }

    fn emit(&self, status: &str) {
        if let Some(emitter) = &self.emitter {
            emitter.emit(DownloadProgress::status(status));
        }
    }

    pub fn attempt(
        &self,
        strategy: MuxStrategy,
        video_path: &Path,
        audio_path: &Path,
        output_dir: &Path,
        stem: &str,
    ) -> MuxAttempt {
        let container = match strategy {
            MuxStrategy::Copy => self.encoder.copy_container.clone(),
            MuxStrategy::Transcode => TRANSCODE_CONTAINER.to_string(),
        };

        MuxAttempt {
            strategy,
            video_path: video_path.to_path_buf(),
            audio_path: audio_path.to_path_buf(),
            output_path: output_path(output_dir, stem, &format!(".{}", container)),
            output_container: container,
        }
    }

    /// ffmpeg command line for one attempt
    pub fn args(&self, attempt: &MuxAttempt) -> Vec<String> {
        let mut args = vec![
            "-y".to_string(),
            "-i".to_string(),
            attempt.video_path.to_string_lossy().to_string(),
            "-i".to_string(),
            attempt.audio_path.to_string_lossy().to_string(),
        ];

        match attempt.strategy {
            MuxStrategy::Copy => {
                args.extend(["-c".to_string(), "copy".to_string()]);
            }
            MuxStrategy::Transcode => {
                args.extend([
                    "-c:v".to_string(),
                    "libx264".to_string(),
                    "-crf".to_string(),
                    self.encoder.crf.to_string(),
                    "-preset".to_string(),
                    self.encoder.preset.clone(),
                    "-c:a".to_string(),
                    "aac".to_string(),
                    "-b:a".to_string(),
                    self.encoder.audio_bitrate.clone(),
                ]);
            }
        }

        args.extend([
            "-movflags".to_string(),
            "+faststart".to_string(),
            attempt.output_path.to_string_lossy().to_string(),
        ]);
        args
    }

    /// Mux `video_path` and `audio_path` into `<output_dir>/<stem>.<container>`.
    ///
    /// A nonzero exit from the copy tier moves on to the transcode tier. A
    /// spawn failure aborts immediately. Only the winning output file is left
    /// on disk; the input tracks are not touched.
    pub async fn mux(
        &self,
        video_path: &Path,
        audio_path: &Path,
        output_dir: &Path,
        stem: &str,
    ) -> Result<PathBuf, DownloadError> {
        let mut state = MuxState::NotStarted;
        let mut last_error = String::new();

        while !state.is_terminal() {
            let exit_ok = match state.required_run() {
                Some(strategy) => {
                    let attempt = self.attempt(strategy, video_path, audio_path, output_dir, stem);
                    match strategy {
                        MuxStrategy::Copy => self.emit("Mesclando com ffmpeg (sem re-encode)…"),
                        MuxStrategy::Transcode => {
                            self.emit("Cópia direta falhou. Re-encode para MP4…")
                        }
                    }

                    let output = self.runner.run(&self.ffmpeg, &self.args(&attempt)).await?;
                    if output.success {
                        info!("{:?} mux succeeded: {}", strategy, attempt.output_path.display());
                    } else {
                        last_error = tail_lines(&output.stderr, 5);
                        warn!("{:?} mux exited with {:?}", strategy, output.code);
                        debug!("ffmpeg stderr:\n{}", last_error);
                        remove_quietly(&attempt.output_path).await;
                    }
                    output.success
                }
                None => true,
            };

            state = state.next(exit_ok);
        }

        match state {
            MuxState::Succeeded(strategy) => {
                Ok(self.attempt(strategy, video_path, audio_path, output_dir, stem).output_path)
            }
            _ => Err(DownloadError::MuxFailed(if last_error.is_empty() {
                "ffmpeg exited with an error".to_string()
            } else {
                last_error
            })),
        }
    }
}
