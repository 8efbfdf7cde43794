use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use ytdl_ptbr_lib::config::EncoderConfig;
use ytdl_ptbr_lib::downloader::models::{AudioTrack, RawFormat};
use ytdl_ptbr_lib::downloader::traits::CommandOutput;
use ytdl_ptbr_lib::downloader::{
    Acquisition, AcquisitionOutcome, CommandRunner, ConfirmationPrompt, DownloadError,
    DownloadProgress, Muxer, ProgressEmitter, StreamDescriptor, StreamKind, StreamProvider,
    VideoMetadata,
};

struct FakeProvider {
    metadata: VideoMetadata,
    downloads: Mutex<Vec<(String, PathBuf)>>,
}

impl FakeProvider {
    fn new(metadata: VideoMetadata) -> Self {
        Self {
            metadata,
            downloads: Mutex::new(Vec::new()),
        }
    }

    fn downloaded_ids(&self) -> Vec<String> {
        self.downloads.lock().unwrap().iter().map(|(id, _)| id.clone()).collect()
    }
}

#[async_trait]
impl StreamProvider for FakeProvider {
    fn name(&self) -> &'static str {
        "fake"
    }

    async fn fetch_metadata(&self, _url: &str) -> Result<VideoMetadata, DownloadError> {
        Ok(self.metadata.clone())
    }

    async fn download(
        &self,
        _url: &str,
        stream: &StreamDescriptor,
        destination: &Path,
    ) -> Result<(), DownloadError> {
        std::fs::write(destination, stream.id.as_bytes())?;
        self.downloads
            .lock()
            .unwrap()
            .push((stream.id.clone(), destination.to_path_buf()));
        Ok(())
    }
}

struct FakePrompt {
    answer: bool,
    asked: AtomicUsize,
}

impl FakePrompt {
    fn answering(answer: bool) -> Self {
        Self {
            answer,
            asked: AtomicUsize::new(0),
        }
    }
}

impl ConfirmationPrompt for FakePrompt {
    fn ask(&self, _question: &str) -> bool {
        self.asked.fetch_add(1, Ordering::SeqCst);
        self.answer
    }
}

/// Scripted ffmpeg: pops one exit status per call, always writes the output file
struct FakeFfmpeg {
    exits: Mutex<Vec<bool>>,
    calls: AtomicUsize,
}

impl FakeFfmpeg {
    fn new(exits: Vec<bool>) -> Self {
        Self {
            exits: Mutex::new(exits),
            calls: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl CommandRunner for FakeFfmpeg {
    async fn run(&self, _program: &Path, args: &[String]) -> Result<CommandOutput, DownloadError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let success = self.exits.lock().unwrap().remove(0);
        std::fs::write(args.last().unwrap(), b"muxed")?;
        Ok(CommandOutput {
            success,
            code: Some(if success { 0 } else { 1 }),
            stdout: String::new(),
            stderr: "Invalid data found when processing input".to_string(),
        })
    }
}

struct Silent;

impl ProgressEmitter for Silent {
    fn emit(&self, _progress: DownloadProgress) {}
}

fn stream(
    id: &str,
    kind: StreamKind,
    ext: &str,
    adaptive: bool,
    height: Option<u32>,
    abr: Option<u64>,
) -> StreamDescriptor {
    StreamDescriptor {
        id: id.to_string(),
        kind,
        extension: ext.to_string(),
        height,
        average_bitrate: abr,
        is_adaptive: adaptive,
        language_tag: None,
        audio_track_label: None,
    }
}

fn raw_audio(id: &str, display_name: &str, bitrate: u64) -> RawFormat {
    RawFormat {
        id: id.to_string(),
        mime_type: "audio/webm; codecs=\"opus\"".to_string(),
        audio_track: Some(AudioTrack {
            display_name: Some(display_name.to_string()),
            id: None,
            is_default: None,
        }),
        average_bitrate: Some(bitrate),
        bitrate: None,
    }
}

fn adaptive_metadata(with_pt_br: bool) -> VideoMetadata {
    let mut raw_formats = vec![raw_audio("251-0", "English original", 130_000)];
    if with_pt_br {
        raw_formats.push(raw_audio("251-1", "Portuguese (Brazil)", 128_000));
    }

    VideoMetadata {
        id: "abc123".to_string(),
        title: "Aula 01: Introdução".to_string(),
        author: "Canal".to_string(),
        streams: vec![
            stream("137", StreamKind::Video, "mp4", true, Some(1080), None),
            stream("248", StreamKind::Video, "webm", true, Some(720), None),
            stream("251-0", StreamKind::Audio, "webm", true, None, Some(130_000)),
            stream("251-1", StreamKind::Audio, "webm", true, None, Some(128_000)),
        ],
        raw_formats,
    }
}

fn acquisition(
    dir: &Path,
    provider: Arc<FakeProvider>,
    prompt: Arc<FakePrompt>,
    ffmpeg: Arc<FakeFfmpeg>,
) -> Acquisition {
    let muxer = Muxer::new(PathBuf::from("ffmpeg"), EncoderConfig::default(), ffmpeg);
    Acquisition::new(provider, prompt, muxer, Arc::new(Silent), dir.to_path_buf())
}

fn temp_files_left(dir: &Path) -> Vec<String> {
    std::fs::read_dir(dir)
        .unwrap()
        .filter_map(|e| e.ok())
        .map(|e| e.file_name().to_string_lossy().to_string())
        .filter(|name| name.contains(".video") || name.contains(".audio"))
        .collect()
}

#[tokio::test]
async fn preferred_track_is_copied_into_mkv() {
    let dir = tempfile::TempDir::new().unwrap();
    let out_dir = dir.path().join("downloads");
    let provider = Arc::new(FakeProvider::new(adaptive_metadata(true)));
    let prompt = Arc::new(FakePrompt::answering(false));
    let ffmpeg = Arc::new(FakeFfmpeg::new(vec![true]));

    let outcome = acquisition(&out_dir, provider.clone(), prompt.clone(), ffmpeg.clone())
        .run("https://www.youtube.com/watch?v=abc123")
        .await
        .unwrap();

    let expected = out_dir.join("Aula_01_Introdução.mkv");
    assert_eq!(outcome, AcquisitionOutcome::Completed(expected.clone()));
    assert!(expected.exists());
    assert_eq!(provider.downloaded_ids(), vec!["137", "251-1"]);
    assert_eq!(prompt.asked.load(Ordering::SeqCst), 0);
    assert_eq!(ffmpeg.calls.load(Ordering::SeqCst), 1);
    assert!(temp_files_left(&out_dir).is_empty());
}

#[tokio::test]
async fn temp_files_use_role_and_extension() {
    let dir = tempfile::TempDir::new().unwrap();
    let provider = Arc::new(FakeProvider::new(adaptive_metadata(true)));

    acquisition(
        dir.path(),
        provider.clone(),
        Arc::new(FakePrompt::answering(true)),
        Arc::new(FakeFfmpeg::new(vec![true])),
    )
    .run("https://youtu.be/abc123")
    .await
    .unwrap();

    let paths: Vec<PathBuf> = provider
        .downloads
        .lock()
        .unwrap()
        .iter()
        .map(|(_, p)| p.clone())
        .collect();
    assert_eq!(
        paths,
        vec![
            dir.path().join("Aula_01_Introdução.video.mp4"),
            dir.path().join("Aula_01_Introdução.audio.webm"),
        ]
    );
}

#[tokio::test]
async fn copy_failure_transcodes_to_mp4() {
    let dir = tempfile::TempDir::new().unwrap();
    let provider = Arc::new(FakeProvider::new(adaptive_metadata(true)));
    let ffmpeg = Arc::new(FakeFfmpeg::new(vec![false, true]));

    let outcome = acquisition(
        dir.path(),
        provider,
        Arc::new(FakePrompt::answering(false)),
        ffmpeg.clone(),
    )
    .run("https://youtu.be/abc123")
    .await
    .unwrap();

    let expected = dir.path().join("Aula_01_Introdução.mp4");
    assert_eq!(outcome, AcquisitionOutcome::Completed(expected.clone()));
    assert!(expected.exists());
    assert!(!dir.path().join("Aula_01_Introdução.mkv").exists());
    assert_eq!(ffmpeg.calls.load(Ordering::SeqCst), 2);
    assert!(temp_files_left(dir.path()).is_empty());
}

#[tokio::test]
async fn progressive_only_video_skips_mux() {
    let dir = tempfile::TempDir::new().unwrap();
    let metadata = VideoMetadata {
        id: "xyz".to_string(),
        title: "Clipe antigo".to_string(),
        author: "Canal".to_string(),
        streams: vec![
            stream("18", StreamKind::Video, "mp4", false, Some(360), None),
            stream("22", StreamKind::Video, "mp4", false, Some(720), None),
        ],
        raw_formats: Vec::new(),
    };
    let provider = Arc::new(FakeProvider::new(metadata));
    let prompt = Arc::new(FakePrompt::answering(false));
    let ffmpeg = Arc::new(FakeFfmpeg::new(Vec::new()));

    let outcome = acquisition(dir.path(), provider.clone(), prompt.clone(), ffmpeg.clone())
        .run("https://youtu.be/xyz")
        .await
        .unwrap();

    assert_eq!(outcome, AcquisitionOutcome::Completed(dir.path().join("Clipe_antigo.mp4")));
    assert_eq!(provider.downloaded_ids(), vec!["22"]);
    assert_eq!(ffmpeg.calls.load(Ordering::SeqCst), 0);
    assert_eq!(prompt.asked.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn declined_fallback_cancels_without_downloading() {
    let dir = tempfile::TempDir::new().unwrap();
    let provider = Arc::new(FakeProvider::new(adaptive_metadata(false)));
    let prompt = Arc::new(FakePrompt::answering(false));

    let outcome = acquisition(
        dir.path(),
        provider.clone(),
        prompt.clone(),
        Arc::new(FakeFfmpeg::new(Vec::new())),
    )
    .run("https://youtu.be/abc123")
    .await
    .unwrap();

    assert_eq!(outcome, AcquisitionOutcome::Cancelled);
    assert_eq!(prompt.asked.load(Ordering::SeqCst), 1);
    assert!(provider.downloaded_ids().is_empty());
}

#[tokio::test]
async fn accepted_fallback_uses_best_audio_of_any_language() {
    let dir = tempfile::TempDir::new().unwrap();
    let provider = Arc::new(FakeProvider::new(adaptive_metadata(false)));

    acquisition(
        dir.path(),
        provider.clone(),
        Arc::new(FakePrompt::answering(true)),
        Arc::new(FakeFfmpeg::new(vec![true])),
    )
    .run("https://youtu.be/abc123")
    .await
    .unwrap();

    assert_eq!(provider.downloaded_ids(), vec!["137", "251-0"]);
}

#[tokio::test]
async fn mux_failure_keeps_tracks_and_reports() {
    let dir = tempfile::TempDir::new().unwrap();
    let provider = Arc::new(FakeProvider::new(adaptive_metadata(true)));

    let err = acquisition(
        dir.path(),
        provider,
        Arc::new(FakePrompt::answering(true)),
        Arc::new(FakeFfmpeg::new(vec![false, false])),
    )
    .run("https://youtu.be/abc123")
    .await
    .unwrap_err();

    assert!(matches!(err, DownloadError::MuxFailed(_)));
    assert_eq!(temp_files_left(dir.path()).len(), 2);
}

#[tokio::test]
async fn empty_url_is_rejected_before_fetching() {
    let dir = tempfile::TempDir::new().unwrap();
    let err = acquisition(
        dir.path(),
        Arc::new(FakeProvider::new(adaptive_metadata(true))),
        Arc::new(FakePrompt::answering(true)),
        Arc::new(FakeFfmpeg::new(Vec::new())),
    )
    .run("   ")
    .await
    .unwrap_err();

    assert!(matches!(err, DownloadError::InvalidUrl(_)));
}

#[tokio::test]
async fn video_without_audio_streams_fails() {
    let dir = tempfile::TempDir::new().unwrap();
    let metadata = VideoMetadata {
        id: "mute".to_string(),
        title: "Sem som".to_string(),
        author: "Canal".to_string(),
        streams: vec![stream("137", StreamKind::Video, "mp4", true, Some(1080), None)],
        raw_formats: Vec::new(),
    };
    let provider = Arc::new(FakeProvider::new(metadata));

    let err = acquisition(
        dir.path(),
        provider.clone(),
        Arc::new(FakePrompt::answering(true)),
        Arc::new(FakeFfmpeg::new(Vec::new())),
    )
    .run("https://youtu.be/mute")
    .await
    .unwrap_err();

    assert!(matches!(err, DownloadError::NoAudioStream));
    assert!(provider.downloaded_ids().is_empty());
}
