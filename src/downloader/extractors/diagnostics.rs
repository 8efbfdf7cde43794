// Extractor diagnostics - turns yt-dlp stderr into a reason the user can act on

/// Why the extractor refused to hand over the video
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockingReason {
    /// DRM, Premium-only or paid content
    DrmProtected,
    MembersOnly,
    AgeRestricted,
    PrivateVideo,
    /// Deleted, removed or never existed
    VideoUnavailable,
    GeoBlocked,
    /// HTTP 429 or explicit throttling
    RateLimited,
    /// Captcha, "confirm you're not a bot", PO token demands
    BotDetection,
    Http403Forbidden,
    NetworkTimeout,
    Unknown,
}

impl BlockingReason {
    /// Short hint appended to the error message
    pub fn suggestion(&self) -> Option<&'static str> {
        match self {
            Self::DrmProtected => {
                Some("This video is DRM-protected and cannot be downloaded as a file.")
            }
            Self::MembersOnly => Some(
                "Channel membership required. Point `cookies_path` at a cookies.txt \
                 exported from a browser logged in as a member.",
            ),
            Self::AgeRestricted => Some(
                "Age-restricted video. Point `cookies_path` at a cookies.txt \
                 from a logged-in account.",
            ),
            Self::PrivateVideo => {
                Some("Private video. Cookies from an authorized account are required.")
            }
            Self::VideoUnavailable => Some("The video was removed or is no longer available."),
            Self::GeoBlocked => Some(
                "Not available in your country. \
                 Try setting `proxy` to a server in an allowed region.",
            ),
            Self::RateLimited => {
                Some("YouTube is rate-limiting this IP. Wait 10-15 minutes or use a proxy.")
            }
            Self::BotDetection | Self::Http403Forbidden => Some(
                "YouTube blocked the request. Update yt-dlp, use cookies or try a proxy.",
            ),
            Self::NetworkTimeout => {
                Some("Network timeout. Check the connection or raise `socket_timeout_secs`.")
            }
            Self::Unknown => None,
        }
    }
}

/// Analyze extractor stderr and return the most specific reason
pub fn diagnose_error(error: &str) -> Option<BlockingReason> {
    if error.trim().is_empty() {
        return None;
    }

    let lower = error.to_lowercase();
    let any = |needles: &[&str]| needles.iter().any(|n| lower.contains(n));

    // Order matters: "members only" messages often also mention "premium"
    let reason = if any(&[
        "members only",
        "members-only",
        "join this channel",
        "available to members",
    ]) {
        BlockingReason::MembersOnly
    } else if any(&[
        "drm",
        "widevine",
        "playready",
        "fairplay",
        "youtube premium",
        "requires purchase",
        "rental",
    ]) {
        BlockingReason::DrmProtected
    } else if any(&[
        "age-restricted",
        "sign in to confirm your age",
        "inappropriate for some users",
    ]) {
        BlockingReason::AgeRestricted
    } else if any(&["private video", "video is private"]) {
        BlockingReason::PrivateVideo
    } else if any(&[
        "video unavailable",
        "video has been removed",
        "no longer available",
        "video is unavailable",
    ]) {
        BlockingReason::VideoUnavailable
    } else if any(&["not available in your country", "blocked in your country", "geo restrict"]) {
        BlockingReason::GeoBlocked
    } else if any(&["429", "rate limit", "too many requests"]) {
        BlockingReason::RateLimited
    } else if any(&["not a bot", "captcha", "unusual traffic", "po token"]) {
        BlockingReason::BotDetection
    } else if any(&["403", "forbidden"]) {
        BlockingReason::Http403Forbidden
    } else if any(&["timeout", "timed out", "connection refused", "network is unreachable"]) {
        BlockingReason::NetworkTimeout
    } else {
        BlockingReason::Unknown
    };

    Some(reason)
}
