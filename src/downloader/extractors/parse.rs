// yt-dlp `--dump-json` output -> VideoMetadata

use serde::Deserialize;

use crate::downloader::errors::DownloadError;
use crate::downloader::models::{AudioTrack, RawFormat, StreamDescriptor, StreamKind, VideoMetadata};

/// yt-dlp ranks the original track 10 and the default track 5
const DEFAULT_TRACK_PREFERENCE: i64 = 5;

#[derive(Debug, Deserialize)]
struct InfoJson {
    #[serde(default)]
    id: String,
    #[serde(default)]
    title: String,
    uploader: Option<String>,
    channel: Option<String>,
    formats: Option<Vec<FormatJson>>,
}

#[derive(Debug, Deserialize)]
struct FormatJson {
    format_id: String,
    #[serde(default)]
    ext: String,
    vcodec: Option<String>,
    acodec: Option<String>,
    height: Option<u32>,
    /// kbps
    abr: Option<f64>,
    /// kbps
    tbr: Option<f64>,
    language: Option<String>,
    language_preference: Option<i64>,
    format_note: Option<String>,
}

impl FormatJson {
    fn has_video(&self) -> bool {
        has_codec(&self.vcodec)
    }

    fn has_audio(&self) -> bool {
        has_codec(&self.acodec)
    }

    fn codecs(&self) -> String {
        [self.vcodec.as_deref(), self.acodec.as_deref()]
            .into_iter()
            .flatten()
            .filter(|c| *c != "none")
            .collect::<Vec<_>>()
            .join(", ")
    }

    fn mime_type(&self) -> String {
        let media = if self.has_video() { "video" } else { "audio" };
        format!("{}/{}; codecs=\"{}\"", media, self.ext, self.codecs())
    }

    fn audio_track(&self) -> Option<AudioTrack> {
        if !self.has_audio() || (self.language.is_none() && self.format_note.is_none()) {
            return None;
        }
        Some(AudioTrack {
            display_name: self.format_note.clone(),
            id: self.language.clone(),
            is_default: self.language_preference.map(|p| p >= DEFAULT_TRACK_PREFERENCE),
        })
    }

    fn descriptor(&self) -> StreamDescriptor {
        let (kind, is_adaptive) = match (self.has_video(), self.has_audio()) {
            (true, true) => (StreamKind::Video, false),
            (true, false) => (StreamKind::Video, true),
            _ => (StreamKind::Audio, true),
        };

        StreamDescriptor {
            id: self.format_id.clone(),
            kind,
            extension: self.ext.clone(),
            height: self.height,
            average_bitrate: kbps_to_bps(self.abr).or(kbps_to_bps(self.tbr)),
            is_adaptive,
            language_tag: self.language.clone(),
            audio_track_label: if self.has_audio() { self.format_note.clone() } else { None },
        }
    }

    fn raw(&self) -> RawFormat {
        RawFormat {
            id: self.format_id.clone(),
            mime_type: self.mime_type(),
            audio_track: self.audio_track(),
            average_bitrate: kbps_to_bps(self.abr),
            bitrate: kbps_to_bps(self.tbr),
        }
    }
}

fn has_codec(codec: &Option<String>) -> bool {
    codec
        .as_deref()
        .map_or(false, |c| !c.is_empty() && c != "none")
}

fn kbps_to_bps(kbps: Option<f64>) -> Option<u64> {
    kbps.filter(|k| k.is_finite() && *k > 0.0)
        .map(|k| (k * 1000.0).round() as u64)
}

/// Parse one info JSON document.
///
/// Formats carrying neither video nor audio (storyboards) are dropped.
pub fn parse_metadata(stdout: &[u8]) -> Result<VideoMetadata, DownloadError> {
    let info: InfoJson = serde_json::from_slice(stdout)
        .map_err(|e| DownloadError::ParseError(format!("Invalid JSON: {}", e)))?;

    let formats = info
        .formats
        .ok_or_else(|| DownloadError::ParseError("No formats array in JSON".to_string()))?;

    let media: Vec<&FormatJson> = formats
        .iter()
        .filter(|f| f.has_video() || f.has_audio())
        .collect();

    Ok(VideoMetadata {
        id: info.id,
        title: if info.title.is_empty() { "Unknown".to_string() } else { info.title },
        author: info
            .uploader
            .or(info.channel)
            .unwrap_or_else(|| "Unknown".to_string()),
        streams: media.iter().map(|f| f.descriptor()).collect(),
        raw_formats: media.iter().map(|f| f.raw()).collect(),
    })
}
