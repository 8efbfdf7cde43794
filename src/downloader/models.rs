// Common data models for the acquisition pipeline

use std::path::PathBuf;

/// Media carried by a stream. Progressive streams are `Video` with `is_adaptive == false`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamKind {
    Video,
    Audio,
}

/// Typed stream as exposed by the metadata provider
#[derive(Debug, Clone, PartialEq)]
pub struct StreamDescriptor {
    /// Format identifier (yt-dlp `format_id`, e.g. "137", "251-1")
    pub id: String,
    pub kind: StreamKind,
    /// Container extension without the dot (mp4, webm, m4a)
    pub extension: String,
    /// Vertical resolution in pixels
    pub height: Option<u32>,
    /// Average bitrate in bits per second
    pub average_bitrate: Option<u64>,
    /// Video-only or audio-only stream that needs muxing
    pub is_adaptive: bool,
    pub language_tag: Option<String>,
    pub audio_track_label: Option<String>,
}

impl StreamDescriptor {
    pub fn is_adaptive_video(&self) -> bool {
        self.is_adaptive && self.kind == StreamKind::Video
    }

    pub fn is_adaptive_audio(&self) -> bool {
        self.is_adaptive && self.kind == StreamKind::Audio
    }

    pub fn is_progressive(&self) -> bool {
        !self.is_adaptive
    }

    /// Human-readable resolution ("1080p") or bitrate ("128kbps")
    pub fn quality_label(&self) -> String {
        match (self.kind, self.height, self.average_bitrate) {
            (StreamKind::Video, Some(h), _) => format!("{}p", h),
            (StreamKind::Audio, _, Some(br)) => format!("{}kbps", br / 1000),
            _ => "?".to_string(),
        }
    }
}

/// Audio track block of one raw format.
///
/// Every field is optional because single-language videos carry none of them.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AudioTrack {
    /// e.g. "Portuguese (Brazil) original"
    pub display_name: Option<String>,
    /// e.g. "pt-BR"
    pub id: Option<String>,
    pub is_default: Option<bool>,
}

/// Low-level per-format metadata used by the language heuristic
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawFormat {
    pub id: String,
    /// e.g. `audio/webm; codecs="opus"`
    pub mime_type: String,
    pub audio_track: Option<AudioTrack>,
    /// Bits per second
    pub average_bitrate: Option<u64>,
    /// Bits per second
    pub bitrate: Option<u64>,
}

impl RawFormat {
    pub fn is_audio(&self) -> bool {
        self.mime_type.contains("audio")
    }
}

/// Snapshot of one video as returned by the provider
#[derive(Debug, Clone)]
pub struct VideoMetadata {
    pub id: String,
    pub title: String,
    pub author: String,
    pub streams: Vec<StreamDescriptor>,
    pub raw_formats: Vec<RawFormat>,
}

impl VideoMetadata {
    pub fn stream_by_id(&self, id: &str) -> Option<&StreamDescriptor> {
        self.streams.iter().find(|s| s.id == id)
    }
}

/// Language-matched audio format considered during selection
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AudioCandidate {
    pub id: String,
    pub bitrate: u64,
}

/// What to download, decided once per run
#[derive(Debug, Clone, PartialEq)]
pub enum DownloadPlan {
    /// Separate video and audio streams, muxed afterwards
    Adaptive {
        video: StreamDescriptor,
        audio: StreamDescriptor,
        used_preferred_language: bool,
    },
    /// Single stream with audio already muxed in; saved as the final file
    Progressive { stream: StreamDescriptor },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MuxStrategy {
    /// Byte-for-byte copy of both codecs
    Copy,
    /// Re-encode to H.264/AAC in MP4
    Transcode,
}

/// One encoder invocation
#[derive(Debug, Clone, PartialEq)]
pub struct MuxAttempt {
    pub strategy: MuxStrategy,
    pub video_path: PathBuf,
    pub audio_path: PathBuf,
    pub output_path: PathBuf,
    /// Extension of `output_path` (mkv, mp4)
    pub output_container: String,
}

/// Result of a run that did not fail
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AcquisitionOutcome {
    Completed(PathBuf),
    /// The user declined the non-preferred audio fallback
    Cancelled,
}

/// Status update shown to the user
#[derive(Debug, Clone)]
pub struct DownloadProgress {
    pub percent: f32,
    pub status: String,
}

impl DownloadProgress {
    pub fn status(status: impl Into<String>) -> Self {
        Self {
            percent: 0.0,
            status: status.into(),
        }
    }
}
