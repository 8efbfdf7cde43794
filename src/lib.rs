pub mod config;
pub mod downloader;

use std::sync::Arc;
use tracing::info;

use config::AppConfig;
use downloader::extractors::{ExtractorConfig, YtDlpProvider};
use downloader::prompt::{read_url, StdinPrompt};
use downloader::tools::ToolManager;
use downloader::traits::ConsoleEmitter;
use downloader::utils::TokioCommandRunner;
use downloader::{Acquisition, AcquisitionOutcome, DownloadError, Muxer};

/// Interactive entry point: ask for a URL and download it
pub async fn run() -> Result<AcquisitionOutcome, DownloadError> {
    let config = AppConfig::load()?;
    let url = read_url()?;

    // No network activity until both tools are known to exist
    let env = ToolManager::new(&config).check_environment()?;
    info!("Using ffmpeg at {} and {:?}", env.ffmpeg.display(), env.ytdlp);

    let emitter = Arc::new(ConsoleEmitter);
    let provider = YtDlpProvider::new(ExtractorConfig::from_app_config(env.ytdlp, &config))
        .with_emitter(emitter.clone());
    let muxer = Muxer::new(env.ffmpeg, config.encoder.clone(), Arc::new(TokioCommandRunner))
        .with_emitter(emitter.clone());

    Acquisition::new(
        Arc::new(provider),
        Arc::new(StdinPrompt),
        muxer,
        emitter,
        config.output_dir.clone(),
    )
    .with_language(config.language.clone())
    .run(&url)
    .await
}
