// Seams between the pipeline and the outside world

use async_trait::async_trait;
use std::path::Path;

use super::errors::DownloadError;
use super::models::{DownloadProgress, StreamDescriptor, VideoMetadata};

/// Source of video metadata and stream bytes
#[async_trait]
pub trait StreamProvider: Send + Sync {
    /// Name of the provider (for logging)
    fn name(&self) -> &'static str;

    /// Fetch title, typed streams and raw formats for a URL
    async fn fetch_metadata(&self, url: &str) -> Result<VideoMetadata, DownloadError>;

    /// Download exactly one stream to `destination`
    async fn download(
        &self,
        url: &str,
        stream: &StreamDescriptor,
        destination: &Path,
    ) -> Result<(), DownloadError>;
}

/// Yes/no question put to the user
pub trait ConfirmationPrompt: Send + Sync {
    fn ask(&self, question: &str) -> bool;
}

/// Captured result of a finished process
#[derive(Debug, Clone)]
pub struct CommandOutput {
    pub success: bool,
    pub code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

/// Runs external programs to completion.
///
/// `Err` means the process could not be launched at all; a nonzero exit
/// comes back as `Ok` with `success == false`.
#[async_trait]
pub trait CommandRunner: Send + Sync {
    async fn run(&self, program: &Path, args: &[String]) -> Result<CommandOutput, DownloadError>;
}

/// Receives status lines for display
pub trait ProgressEmitter: Send + Sync {
    fn emit(&self, progress: DownloadProgress);
}

/// Prints status lines to stdout
pub struct ConsoleEmitter;

impl ProgressEmitter for ConsoleEmitter {
    fn emit(&self, progress: DownloadProgress) {
        println!("{}", progress.status);
    }
}
