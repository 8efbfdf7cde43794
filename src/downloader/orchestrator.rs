// Acquisition orchestrator - metadata -> selection -> download -> mux -> cleanup
//
// Everything runs sequentially. Status lines go to the ProgressEmitter;
// diagnostics go to tracing.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{info, warn};

use super::errors::DownloadError;
use super::format_selector::{FormatSelector, LanguagePreference};
use super::models::{
    AcquisitionOutcome, DownloadPlan, DownloadProgress, StreamDescriptor, VideoMetadata,
};
use super::muxer::Muxer;
use super::slug::slugify;
use super::traits::{ConfirmationPrompt, ProgressEmitter, StreamProvider};
use super::utils::{dotted_extension, output_path, remove_quietly};

const FALLBACK_QUESTION: &str =
    "Deseja continuar com o áudio padrão (geralmente inglês)? [s/N]: ";

pub struct Acquisition {
    provider: Arc<dyn StreamProvider>,
    prompt: Arc<dyn ConfirmationPrompt>,
    muxer: Muxer,
    emitter: Arc<dyn ProgressEmitter>,
    output_dir: PathBuf,
    language: LanguagePreference,
}

impl Acquisition {
    pub fn new(
        provider: Arc<dyn StreamProvider>,
        prompt: Arc<dyn ConfirmationPrompt>,
        muxer: Muxer,
        emitter: Arc<dyn ProgressEmitter>,
        output_dir: PathBuf,
    ) -> Self {
        Self {
            provider,
            prompt,
            muxer,
            emitter,
            output_dir,
            language: LanguagePreference::pt_br(),
        }
    }

    pub fn with_language(mut self, language: LanguagePreference) -> Self {
        self.language = language;
        self
    }

    fn emit(&self, status: impl Into<String>) {
        self.emitter.emit(DownloadProgress::status(status));
    }

    /// Download `url` into the output directory.
    ///
    /// Returns `Cancelled` when the user declines the non-preferred audio
    /// fallback; every other stop is an error.
    pub async fn run(&self, url: &str) -> Result<AcquisitionOutcome, DownloadError> {
        let url = url.trim();
        if url.is_empty() {
            return Err(DownloadError::InvalidUrl("empty URL".to_string()));
        }

        tokio::fs::create_dir_all(&self.output_dir).await?;

        info!("[{}] fetching metadata for {}", self.provider.name(), url);
        let metadata = self.provider.fetch_metadata(url).await?;
        let stem = file_stem(&metadata);

        self.emit(format!("Título: {}", metadata.title));
        self.emit(format!("Canal:  {}", metadata.author));

        let plan = FormatSelector::plan(&metadata, &self.language, || {
            self.emit(format!(
                "⚠️ Não encontrei faixa de áudio {} neste vídeo.",
                self.language.name
            ));
            self.prompt.ask(FALLBACK_QUESTION)
        })?;

        let Some(plan) = plan else {
            self.emit("Cancelado.");
            return Ok(AcquisitionOutcome::Cancelled);
        };

        let output = match plan {
            DownloadPlan::Progressive { stream } => {
                self.fetch_progressive(url, &stream, &stem).await?
            }
            DownloadPlan::Adaptive {
                video,
                audio,
                used_preferred_language,
            } => {
                self.fetch_and_mux(url, &video, &audio, used_preferred_language, &stem)
                    .await?
            }
        };

        self.emit(format!("✅ Concluído: {}", output.display()));
        Ok(AcquisitionOutcome::Completed(output))
    }

    async fn fetch_progressive(
        &self,
        url: &str,
        stream: &StreamDescriptor,
        stem: &str,
    ) -> Result<PathBuf, DownloadError> {
        self.emit(format!("Nada de adaptive. Baixando progressivo {}…", stream.quality_label()));
        let output = output_path(&self.output_dir, stem, ".mp4");
        self.provider.download(url, stream, &output).await?;
        Ok(output)
    }

    async fn fetch_and_mux(
        &self,
        url: &str,
        video: &StreamDescriptor,
        audio: &StreamDescriptor,
        used_preferred_language: bool,
        stem: &str,
    ) -> Result<PathBuf, DownloadError> {
        let video_tmp = output_path(
            &self.output_dir,
            stem,
            &format!(".video{}", dotted_extension(&video.extension, "mp4")),
        );
        let audio_tmp = output_path(
            &self.output_dir,
            stem,
            &format!(".audio{}", dotted_extension(&audio.extension, "m4a")),
        );

        self.emit(format!("Baixando VÍDEO em {}…", video.quality_label()));
        if let Err(e) = self.provider.download(url, video, &video_tmp).await {
            remove_quietly(&video_tmp).await;
            return Err(e);
        }

        let language = if used_preferred_language {
            self.language.name.as_str()
        } else {
            "padrão"
        };
        self.emit(format!("Baixando ÁUDIO ({})…", language));
        if let Err(e) = self.provider.download(url, audio, &audio_tmp).await {
            cleanup(&[video_tmp.as_path(), audio_tmp.as_path()]).await;
            return Err(e);
        }

        // Tracks stay on disk when both mux tiers fail so the user can retry by hand
        let output = match self.muxer.mux(&video_tmp, &audio_tmp, &self.output_dir, stem).await {
            Ok(output) => output,
            Err(e) => {
                warn!(
                    "Mux failed; keeping {} and {}",
                    video_tmp.display(),
                    audio_tmp.display()
                );
                return Err(e);
            }
        };

        cleanup(&[video_tmp.as_path(), audio_tmp.as_path()]).await;
        Ok(output)
    }
}

async fn cleanup(paths: &[&Path]) {
    for path in paths {
        remove_quietly(path).await;
    }
}

/// Slugified title, then slugified id, then "video"
pub fn file_stem(metadata: &VideoMetadata) -> String {
    [slugify(&metadata.title), slugify(&metadata.id)]
        .into_iter()
        .find(|s| !s.is_empty())
        .unwrap_or_else(|| "video".to_string())
}
