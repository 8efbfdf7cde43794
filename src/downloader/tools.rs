use std::path::{Path, PathBuf};
use std::process::Command;
use tracing::debug;

use super::errors::DownloadError;
use super::extractors::YtDlpCommand;
use crate::config::AppConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToolType {
    Ffmpeg,
    YtDlp,
}

impl ToolType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ToolType::Ffmpeg => "ffmpeg",
            ToolType::YtDlp => "yt-dlp",
        }
    }

    fn version_arg(&self) -> &'static str {
        match self {
            ToolType::Ffmpeg => "-version", // ffmpeg uses a single dash
            ToolType::YtDlp => "--version",
        }
    }
}

#[derive(Debug, Clone)]
pub struct ToolInfo {
    pub name: String,
    pub tool_type: ToolType,
    pub version: Option<String>,
    pub path: Option<PathBuf>,
    pub is_available: bool,
}

/// Everything the pipeline needs from the environment
#[derive(Debug, Clone)]
pub struct Environment {
    pub ffmpeg: PathBuf,
    pub ytdlp: YtDlpCommand,
}

pub struct ToolManager {
    ffmpeg_override: Option<PathBuf>,
    ytdlp_override: Option<PathBuf>,
}

impl ToolManager {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            ffmpeg_override: config.ffmpeg_path.clone(),
            ytdlp_override: config.ytdlp_path.clone(),
        }
    }

    pub fn get_tool_info(&self, tool_type: ToolType) -> ToolInfo {
        let path = self.locate(tool_type);
        let version = path.as_deref().and_then(|p| get_version(p, tool_type));

        ToolInfo {
            name: tool_type.as_str().to_string(),
            tool_type,
            version,
            is_available: path.is_some(),
            path,
        }
    }

    /// Configured path if it exists, otherwise a PATH lookup
    fn locate(&self, tool_type: ToolType) -> Option<PathBuf> {
        let configured = match tool_type {
            ToolType::Ffmpeg => self.ffmpeg_override.as_ref(),
            ToolType::YtDlp => self.ytdlp_override.as_ref(),
        };

        if let Some(path) = configured {
            return which::which(path).ok();
        }

        which::which(tool_type.as_str()).ok()
    }

    /// Fails before any network activity when the encoder or extractor is missing
    pub fn check_environment(&self) -> Result<Environment, DownloadError> {
        let ffmpeg = self.get_tool_info(ToolType::Ffmpeg);
        let ffmpeg_path = ffmpeg.path.ok_or_else(|| {
            DownloadError::ToolNotFound(
                "ffmpeg not found in PATH. Install it and try again (ffmpeg -version).".to_string(),
            )
        })?;
        debug!(
            "ffmpeg: {} ({})",
            ffmpeg_path.display(),
            ffmpeg.version.as_deref().unwrap_or("unknown version")
        );

        let ytdlp = match self.locate(ToolType::YtDlp) {
            Some(path) => YtDlpCommand::Binary(path),
            None => {
                let python = python_cmd();
                if python_has_module(&python, "yt_dlp") {
                    YtDlpCommand::PythonModule(python)
                } else {
                    return Err(DownloadError::ToolNotFound(
                        "yt-dlp not found. Install it: pip3 install yt-dlp (or brew install yt-dlp)"
                            .to_string(),
                    ));
                }
            }
        };
        debug!("yt-dlp: {:?}", ytdlp);

        Ok(Environment {
            ffmpeg: ffmpeg_path,
            ytdlp,
        })
    }
}

/// First line of `<tool> --version`
fn get_version(path: &Path, tool_type: ToolType) -> Option<String> {
    match Command::new(path).arg(tool_type.version_arg()).output() {
        Ok(output) if output.status.success() => String::from_utf8_lossy(&output.stdout)
            .lines()
            .next()
            .map(|line| line.trim().to_string()),
        _ => None,
    }
}

fn python_cmd() -> PathBuf {
    // Allow overriding the interpreter (e.g. a venv) to avoid Homebrew PEP 668 limitations.
    std::env::var("YTDLP_PYTHON")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("python3"))
}

fn python_has_module(python: &Path, module: &str) -> bool {
    let code = format!("import {}", module);
    match Command::new(python).args(["-c", &code]).output() {
        Ok(out) => out.status.success(),
        Err(_) => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_configured_ffmpeg_is_tool_not_found() {
        let dir = tempfile::TempDir::new().unwrap();
        let config = AppConfig {
            ffmpeg_path: Some(dir.path().join("no-such-ffmpeg")),
            ..AppConfig::default()
        };

        let manager = ToolManager::new(&config);
        let info = manager.get_tool_info(ToolType::Ffmpeg);
        assert!(!info.is_available);
        assert!(info.version.is_none());

        let err = manager.check_environment().unwrap_err();
        match err {
            DownloadError::ToolNotFound(msg) => assert!(msg.contains("ffmpeg")),
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_tool_names() {
        assert_eq!(ToolType::Ffmpeg.as_str(), "ffmpeg");
        assert_eq!(ToolType::YtDlp.version_arg(), "--version");
    }
}
