// yt-dlp StreamProvider - native binary or `python3 -m yt_dlp`
//
// Metadata comes from `--dump-json`; each stream is then fetched on its own
// with `-f <format_id>` so the muxing stays under our control.

use async_trait::async_trait;
use regex::Regex;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::Command as TokioCommand;
use tracing::{debug, info, warn};

use super::parse::parse_metadata;
use crate::config::AppConfig;
use crate::downloader::errors::DownloadError;
use crate::downloader::models::{DownloadProgress, StreamDescriptor, VideoMetadata};
use crate::downloader::traits::{ProgressEmitter, StreamProvider};
use crate::downloader::utils::{
    escape_output_template, join_pipe, read_lossy, run_output, tail_lines,
};

/// Percent step between two emitted progress lines
const PROGRESS_STEP: f32 = 10.0;

/// How yt-dlp is launched
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum YtDlpCommand {
    /// Standalone `yt-dlp` executable
    Binary(PathBuf),
    /// Python interpreter with the `yt_dlp` module installed
    PythonModule(PathBuf),
}

impl YtDlpCommand {
    pub fn program(&self) -> &Path {
        match self {
            Self::Binary(path) | Self::PythonModule(path) => path,
        }
    }

    /// Arguments that precede every yt-dlp option
    pub fn prefix_args(&self) -> Vec<String> {
        match self {
            Self::Binary(_) => Vec::new(),
            Self::PythonModule(_) => vec!["-m".to_string(), "yt_dlp".to_string()],
        }
    }
}

/// Options shared by metadata and download calls
#[derive(Debug, Clone)]
pub struct ExtractorConfig {
    pub command: YtDlpCommand,
    /// SOCKS5/HTTP proxy URL
    pub proxy: Option<String>,
    /// Path to cookies.txt file
    pub cookies_path: Option<PathBuf>,
    /// yt-dlp socket timeout in seconds
    pub socket_timeout_secs: u32,
}

impl ExtractorConfig {
    pub fn new(command: YtDlpCommand) -> Self {
        Self {
            command,
            proxy: None,
            cookies_path: None,
            socket_timeout_secs: 30,
        }
    }

    pub fn from_app_config(command: YtDlpCommand, config: &AppConfig) -> Self {
        Self::new(command)
            .with_proxy(config.proxy.clone())
            .with_cookies_path(config.cookies_path.clone())
            .with_timeout(config.socket_timeout_secs)
    }

    pub fn with_proxy(mut self, proxy: Option<String>) -> Self {
        self.proxy = proxy;
        self
    }

    pub fn with_cookies_path(mut self, path: Option<PathBuf>) -> Self {
        self.cookies_path = path;
        self
    }

    pub fn with_timeout(mut self, seconds: u32) -> Self {
        self.socket_timeout_secs = seconds;
        self
    }
}

pub struct YtDlpProvider {
    config: ExtractorConfig,
    emitter: Option<Arc<dyn ProgressEmitter>>,
}

impl YtDlpProvider {
    pub fn new(config: ExtractorConfig) -> Self {
        Self {
            config,
            emitter: None,
        }
    }

    /// Report download percentages through `emitter`
    pub fn with_emitter(mut self, emitter: Arc<dyn ProgressEmitter>) -> Self {
        self.emitter = Some(emitter);
        self
    }

    fn common_args(&self) -> Vec<String> {
        let mut args = self.config.command.prefix_args();
        args.extend([
            "--no-playlist".to_string(),
            "--no-warnings".to_string(),
            "--socket-timeout".to_string(),
            self.config.socket_timeout_secs.to_string(),
        ]);

        if let Some(path) = &self.config.cookies_path {
            args.push("--cookies".to_string());
            args.push(path.to_string_lossy().to_string());
        }

        if let Some(proxy) = &self.config.proxy {
            args.push("--proxy".to_string());
            args.push(proxy.clone());
        }

        args
    }

    pub fn metadata_args(&self, url: &str) -> Vec<String> {
        let mut args = self.common_args();
        args.push("--dump-json".to_string());
        args.push(url.to_string());
        args
    }

    pub fn download_args(&self, url: &str, format_id: &str, destination: &Path) -> Vec<String> {
        let mut args = self.common_args();
        args.extend([
            "-f".to_string(),
            format_id.to_string(),
            "-o".to_string(),
            escape_output_template(destination),
            "--newline".to_string(),
            "--force-overwrites".to_string(),
            "--no-part".to_string(),
            url.to_string(),
        ]);
        args
    }

    fn emit(&self, percent: f32, status: String) {
        if let Some(emitter) = &self.emitter {
            emitter.emit(DownloadProgress { percent, status });
        }
    }
}

#[async_trait]
impl StreamProvider for YtDlpProvider {
    fn name(&self) -> &'static str {
        match self.config.command {
            YtDlpCommand::Binary(_) => "cli-yt-dlp",
            YtDlpCommand::PythonModule(_) => "python-yt-dlp",
        }
    }

    async fn fetch_metadata(&self, url: &str) -> Result<VideoMetadata, DownloadError> {
        let program = self.config.command.program();
        let output = run_output(program, &self.metadata_args(url)).await?;

        if !output.success {
            warn!("[{}] metadata fetch failed: {}", self.name(), tail_lines(&output.stderr, 3));
            return Err(DownloadError::from(output.stderr));
        }

        let metadata = parse_metadata(output.stdout.as_bytes())?;
        info!(
            "[{}] {} streams for {} ({})",
            self.name(),
            metadata.streams.len(),
            metadata.id,
            metadata.title
        );
        Ok(metadata)
    }

    async fn download(
        &self,
        url: &str,
        stream: &StreamDescriptor,
        destination: &Path,
    ) -> Result<(), DownloadError> {
        let program = self.config.command.program();
        let args = self.download_args(url, &stream.id, destination);
        debug!("Running: {} {}", program.display(), args.join(" "));

        // An early return drops the child and kills yt-dlp with it
        let mut child = TokioCommand::new(program)
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| {
                DownloadError::ExecutionError(format!(
                    "Failed to start {}: {}",
                    program.display(),
                    e
                ))
            })?;

        let stdout = child.stdout.take().ok_or_else(|| {
            DownloadError::ExecutionError("Failed to capture yt-dlp stdout".to_string())
        })?;
        let stderr_pipe = child.stderr.take().ok_or_else(|| {
            DownloadError::ExecutionError("Failed to capture yt-dlp stderr".to_string())
        })?;
        let stderr_task = tokio::spawn(read_lossy(stderr_pipe));

        let mut lines = BufReader::new(stdout).split(b'\n');
        let mut next_report = 0.0_f32;
        while let Some(raw) = lines.next_segment().await? {
            let line = String::from_utf8_lossy(&raw);
            if let Some(percent) = parse_progress(&line) {
                if percent >= next_report {
                    self.emit(percent, format!("   {:>5.1}%", percent));
                    next_report = (percent / PROGRESS_STEP).floor() * PROGRESS_STEP + PROGRESS_STEP;
                }
            } else {
                debug!("[yt-dlp] {}", line.trim_end());
            }
        }

        let status = child.wait().await.map_err(|e| {
            DownloadError::ExecutionError(format!("Failed to wait for yt-dlp: {}", e))
        })?;
        let stderr = join_pipe(stderr_task, "stderr").await?;

        if !status.success() {
            return Err(DownloadError::from(stderr));
        }

        if !destination.exists() {
            return Err(DownloadError::ExecutionError(format!(
                "yt-dlp exited successfully but {} was not written",
                destination.display()
            )));
        }

        Ok(())
    }
}

/// Percentage from a yt-dlp `--newline` progress line like
/// `[download]  12.5% of ~ 310.04MiB at  374.36KiB/s ETA 11:59`
pub fn parse_progress(line: &str) -> Option<f32> {
    lazy_static::lazy_static! {
        static ref PROGRESS_RE: Regex = Regex::new(r"^\[download\]\s+(\d+(?:\.\d+)?)%").unwrap();
    }

    PROGRESS_RE
        .captures(line.trim_start())
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().parse().ok())
}
