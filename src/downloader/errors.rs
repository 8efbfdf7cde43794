// Error types for the acquisition pipeline

use thiserror::Error;

use super::extractors::BlockingReason;

#[derive(Debug, Error)]
pub enum DownloadError {
    /// ffmpeg, yt-dlp or python not found in system
    #[error("Tool not found: {0}")]
    ToolNotFound(String),

    /// Empty or malformed video URL
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    /// Failed to parse yt-dlp JSON output
    #[error("Parse error: {0}")]
    ParseError(String),

    /// Process could not be launched or waited on
    #[error("Execution error: {0}")]
    ExecutionError(String),

    /// The extractor ran but refused the video
    #[error("{message}")]
    Extraction {
        message: String,
        reason: Option<BlockingReason>,
    },

    /// Neither adaptive nor progressive video exists
    #[error("No video stream found")]
    NoVideoStream,

    /// No audio stream survived any fallback tier
    #[error("No audio track available to download")]
    NoAudioStream,

    /// Both mux tiers failed
    #[error("Mux failed: {0}")]
    MuxFailed(String),

    /// Invalid configuration file
    #[error("Config error: {0}")]
    Config(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Shown when the extractor failed without writing anything to stderr
const SILENT_FAILURE: &str = "yt-dlp exited with an error and no diagnostic output";

// Classify raw extractor stderr. Tools are located before the first run, so a
// missing file here is an extractor input (cookies, output dir), not a tool.
impl From<String> for DownloadError {
    fn from(s: String) -> Self {
        if s.trim().is_empty() {
            return Self::Extraction {
                message: SILENT_FAILURE.to_string(),
                reason: None,
            };
        }

        let lower = s.to_lowercase();

        if lower.contains("command not found") {
            return Self::ToolNotFound(s);
        }

        if lower.contains("unsupported url") || lower.contains("is not a valid url") {
            return Self::InvalidUrl(s);
        }

        let reason = super::extractors::diagnose_error(&s);
        let message = match reason.and_then(|r| r.suggestion()) {
            Some(hint) => format!("{}\n\n{}", s.trim(), hint),
            None => s.trim().to_string(),
        };

        Self::Extraction { message, reason }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unsupported_url_is_invalid_url() {
        let err = DownloadError::from("ERROR: Unsupported URL: https://example.com".to_string());
        assert!(matches!(err, DownloadError::InvalidUrl(_)));
    }

    #[test]
    fn test_private_video_is_diagnosed() {
        let err = DownloadError::from("ERROR: [youtube] abc: Private video".to_string());
        match err {
            DownloadError::Extraction { reason, message } => {
                assert_eq!(reason, Some(BlockingReason::PrivateVideo));
                assert!(message.contains("Private video"));
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_empty_stderr_still_has_a_message() {
        for stderr in ["", "  \n\t"] {
            let err = DownloadError::from(stderr.to_string());
            assert!(matches!(err, DownloadError::Extraction { reason: None, .. }));
            assert!(err.to_string().contains("yt-dlp exited with an error"));
        }
    }

    #[test]
    fn test_missing_cookies_file_is_not_a_missing_tool() {
        let err = DownloadError::from(
            "ERROR: [Errno 2] No such file or directory: '/home/u/cookies.txt'".to_string(),
        );
        match err {
            DownloadError::Extraction { message, .. } => assert!(message.contains("cookies.txt")),
            other => panic!("unexpected error: {:?}", other),
        }
    }
}
