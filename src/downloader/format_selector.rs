// FormatSelector - picks the video stream and the audio track to download
//
// Handles:
// - Preferred-language audio detection over raw per-format metadata
// - Best adaptive video (highest resolution)
// - Best adaptive audio in any language (highest average bitrate)
// - Progressive MP4 fallback when no adaptive video exists
//
// Ties are always broken by provider order: the first stream listed wins.

use serde::{Deserialize, Serialize};
use std::cmp::Reverse;
use tracing::{debug, warn};

use super::errors::DownloadError;
use super::models::{
    AudioCandidate, AudioTrack, DownloadPlan, RawFormat, StreamDescriptor, VideoMetadata,
};

/// Free-text markers identifying the wanted audio language.
///
/// This is a heuristic over display names and track ids, not a language
/// code comparison; the provider does not expose a reliable ISO tag.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LanguagePreference {
    /// Shown in status lines ("PT-BR")
    pub name: String,
    /// Substrings searched in the lowercase composite label
    pub label_markers: Vec<String>,
    /// Substring searched in the lowercase track id alone
    pub id_marker: String,
}

impl LanguagePreference {
    /// Portuguese (Brazil)
    pub fn pt_br() -> Self {
        Self {
            name: "PT-BR".to_string(),
            label_markers: vec!["portugu".to_string(), "pt-br".to_string(), "brasil".to_string()],
            id_marker: "pt".to_string(),
        }
    }

    /// Any plain track id containing the id marker matches, so "opt1"
    /// counts as Portuguese. Kept deliberately; see DESIGN.md.
    pub fn matches(&self, track: &AudioTrack) -> bool {
        let label = composite_label(track);
        let id = track.id.as_deref().unwrap_or("").to_lowercase();

        self.label_markers
            .iter()
            .any(|marker| label.contains(&marker.to_lowercase()))
            || (!self.id_marker.is_empty() && id.contains(&self.id_marker.to_lowercase()))
    }
}

impl Default for LanguagePreference {
    fn default() -> Self {
        Self::pt_br()
    }
}

/// Lowercase "<display name> <id> <default flag>"; missing fields are empty
pub fn composite_label(track: &AudioTrack) -> String {
    let default_flag = match track.is_default {
        Some(true) => "true",
        Some(false) => "false",
        None => "",
    };

    [
        track.display_name.as_deref().unwrap_or(""),
        track.id.as_deref().unwrap_or(""),
        default_flag,
    ]
    .join(" ")
    .to_lowercase()
}

/// Stateless stream selection
pub struct FormatSelector;

impl FormatSelector {
    /// Audio formats whose track matches `preference`, best bitrate first.
    ///
    /// The sort is stable: equal bitrates keep their original order.
    pub fn preferred_audio_candidates(
        formats: &[RawFormat],
        preference: &LanguagePreference,
    ) -> Vec<AudioCandidate> {
        let mut candidates: Vec<AudioCandidate> = formats
            .iter()
            .filter(|f| f.is_audio())
            .filter(|f| f.audio_track.as_ref().map_or(false, |t| preference.matches(t)))
            .map(|f| AudioCandidate {
                id: f.id.clone(),
                bitrate: effective_bitrate(f),
            })
            .collect();

        candidates.sort_by_key(|c| Reverse(c.bitrate));
        candidates
    }

    /// Id of the best preferred-language audio format, if any matches
    pub fn select_preferred_audio(
        formats: &[RawFormat],
        preference: &LanguagePreference,
    ) -> Option<String> {
        Self::preferred_audio_candidates(formats, preference)
            .into_iter()
            .next()
            .map(|c| c.id)
    }

    /// Highest-resolution adaptive video stream
    pub fn select_adaptive_video(streams: &[StreamDescriptor]) -> Option<&StreamDescriptor> {
        first_by_desc(
            streams.iter().filter(|s| s.is_adaptive_video()),
            |s| s.height.unwrap_or(0),
        )
    }

    /// Highest-resolution progressive MP4 stream
    pub fn select_progressive(streams: &[StreamDescriptor]) -> Option<&StreamDescriptor> {
        first_by_desc(
            streams
                .iter()
                .filter(|s| s.is_progressive() && s.extension.eq_ignore_ascii_case("mp4")),
            |s| s.height.unwrap_or(0),
        )
    }

    /// Highest average-bitrate adaptive audio stream, any language
    pub fn select_best_audio(streams: &[StreamDescriptor]) -> Option<&StreamDescriptor> {
        first_by_desc(
            streams.iter().filter(|s| s.is_adaptive_audio()),
            |s| s.average_bitrate.unwrap_or(0),
        )
    }

    /// Decide what to download.
    ///
    /// `confirm_fallback` is called only when no audio track matches the
    /// preferred language; returning `false` yields `Ok(None)` (cancelled).
    pub fn plan<F>(
        metadata: &VideoMetadata,
        preference: &LanguagePreference,
        confirm_fallback: F,
    ) -> Result<Option<DownloadPlan>, DownloadError>
    where
        F: FnOnce() -> bool,
    {
        let Some(video) = Self::select_adaptive_video(&metadata.streams) else {
            let stream =
                Self::select_progressive(&metadata.streams).ok_or(DownloadError::NoVideoStream)?;
            debug!("No adaptive video, using progressive stream {}", stream.id);
            return Ok(Some(DownloadPlan::Progressive { stream: stream.clone() }));
        };

        let (audio, used_preferred_language) =
            match Self::select_preferred_audio(&metadata.raw_formats, preference) {
                Some(id) => match metadata.stream_by_id(&id).filter(|s| s.is_adaptive_audio()) {
                    Some(stream) => (Some(stream), true),
                    None => {
                        warn!(
                            "Preferred audio format {} missing from stream list, using best audio",
                            id
                        );
                        (Self::select_best_audio(&metadata.streams), false)
                    }
                },
                None => {
                    if !confirm_fallback() {
                        return Ok(None);
                    }
                    (Self::select_best_audio(&metadata.streams), false)
                }
            };

        let audio = audio.ok_or(DownloadError::NoAudioStream)?;

        Ok(Some(DownloadPlan::Adaptive {
            video: video.clone(),
            audio: audio.clone(),
            used_preferred_language,
        }))
    }
}

/// `averageBitrate`, then `bitrate`, then 0; a zero reading counts as missing
fn effective_bitrate(format: &RawFormat) -> u64 {
    format
        .average_bitrate
        .filter(|b| *b > 0)
        .or(format.bitrate.filter(|b| *b > 0))
        .unwrap_or(0)
}

/// First item with the greatest key; later items must be strictly greater to win
fn first_by_desc<'a, I, K, F>(items: I, key: F) -> Option<&'a StreamDescriptor>
where
    I: Iterator<Item = &'a StreamDescriptor>,
    K: Ord,
    F: Fn(&StreamDescriptor) -> K,
{
    let mut best: Option<(K, &'a StreamDescriptor)> = None;
    for item in items {
        let k = key(item);
        if best.as_ref().map_or(true, |(best_key, _)| k > *best_key) {
            best = Some((k, item));
        }
    }
    best.map(|(_, item)| item)
}
