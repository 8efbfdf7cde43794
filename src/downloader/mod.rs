// Downloader module - acquisition pipeline and its external collaborators

pub mod errors;
pub mod extractors;
pub mod format_selector;
pub mod models;
pub mod muxer;
pub mod orchestrator;
pub mod prompt;
pub mod slug;
pub mod tools;
pub mod traits;
pub mod utils;

pub use errors::DownloadError;
pub use format_selector::{FormatSelector, LanguagePreference};
pub use models::{
    AcquisitionOutcome, DownloadPlan, DownloadProgress, StreamDescriptor, StreamKind, VideoMetadata,
};
pub use muxer::Muxer;
pub use orchestrator::Acquisition;
pub use traits::{CommandRunner, ConfirmationPrompt, ProgressEmitter, StreamProvider};
