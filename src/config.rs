//! Configuration management
//!
//! Defaults, an optional TOML file under the user's config directory, and
//! environment overrides, applied in that order.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::downloader::format_selector::LanguagePreference;
use crate::downloader::DownloadError;

const CONFIG_DIR_NAME: &str = "ytdl-ptbr";
const CONFIG_FILE_NAME: &str = "config.toml";

/// ffmpeg parameters for both mux tiers
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EncoderConfig {
    /// Container for the stream-copy tier; must accept any codec
    pub copy_container: String,
    /// libx264 constant rate factor for the transcode tier
    pub crf: u8,
    /// libx264 speed preset
    pub preset: String,
    /// AAC bitrate, ffmpeg syntax ("192k")
    pub audio_bitrate: String,
}

impl Default for EncoderConfig {
    fn default() -> Self {
        Self {
            copy_container: "mkv".to_string(),
            crf: 18,
            preset: "medium".to_string(),
            audio_bitrate: "192k".to_string(),
        }
    }
}

/// Application configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Destination folder for final files and temp tracks
    pub output_dir: PathBuf,
    /// Explicit ffmpeg binary; searched on PATH when unset
    pub ffmpeg_path: Option<PathBuf>,
    /// Explicit yt-dlp binary; searched on PATH when unset
    pub ytdlp_path: Option<PathBuf>,
    /// SOCKS5/HTTP proxy URL handed to yt-dlp
    pub proxy: Option<String>,
    /// cookies.txt handed to yt-dlp
    pub cookies_path: Option<PathBuf>,
    /// yt-dlp `--socket-timeout`
    pub socket_timeout_secs: u32,
    pub language: LanguagePreference,
    pub encoder: EncoderConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("downloads"),
            ffmpeg_path: None,
            ytdlp_path: None,
            proxy: None,
            cookies_path: None,
            socket_timeout_secs: 30,
            language: LanguagePreference::pt_br(),
            encoder: EncoderConfig::default(),
        }
    }
}

impl AppConfig {
    /// `<config_dir>/ytdl-ptbr/config.toml`
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join(CONFIG_DIR_NAME).join(CONFIG_FILE_NAME))
    }

    /// Defaults, then the config file if it exists, then the environment
    pub fn load() -> Result<Self, DownloadError> {
        let mut config = match Self::default_path() {
            Some(path) if path.exists() => Self::from_file(&path)?,
            _ => Self::default(),
        };
        config.apply_env_with(|key| std::env::var(key).ok());
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self, DownloadError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
            .map_err(|e| DownloadError::Config(format!("{}: {}", path.display(), e)))
    }

    pub fn from_toml(content: &str) -> Result<Self, DownloadError> {
        toml::from_str(content).map_err(|e| DownloadError::Config(e.to_string()))
    }

    /// Apply `YTDL_PTBR_*` overrides read through `lookup`
    pub fn apply_env_with<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(dir) = get("YTDL_PTBR_OUTPUT_DIR") {
            self.output_dir = PathBuf::from(dir);
        }
        if let Some(path) = get("YTDL_PTBR_FFMPEG") {
            self.ffmpeg_path = Some(PathBuf::from(path));
        }
        if let Some(path) = get("YTDL_PTBR_YTDLP") {
            self.ytdlp_path = Some(PathBuf::from(path));
        }
        if let Some(proxy) = get("YTDL_PTBR_PROXY") {
            self.proxy = Some(proxy);
        }
        if let Some(path) = get("YTDL_PTBR_COOKIES") {
            self.cookies_path = Some(PathBuf::from(path));
        }
    }
}
