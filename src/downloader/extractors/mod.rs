// Metadata provider backed by yt-dlp
//
// Two launch modes share one implementation:
// - Binary: native `yt-dlp` executable found on PATH (or configured)
// - Python: `python3 -m yt_dlp` when only the module is installed
//
// `tools::ToolManager` decides which one is available.

mod diagnostics;
mod parse;
mod ytdlp;

pub use diagnostics::{diagnose_error, BlockingReason};
pub use parse::parse_metadata;
pub use ytdlp::{parse_progress, ExtractorConfig, YtDlpCommand, YtDlpProvider};
