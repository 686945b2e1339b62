//! Pipeline orchestrator for Skriv.
//!
//! Drives each URL through fetch → download → extract → transcribe →
//! write, in strict sequence and in input order. The transcript file's
//! existence is the durable "already processed" marker: no database, the
//! filesystem is the state store. One bad URL never aborts the batch;
//! its failure is classified by stage and folded into the summary.

use crate::artifact::write_transcript;
use crate::audio::AudioExtractor;
use crate::config::Settings;
use crate::download::Downloader;
use crate::error::SkrivError;
use crate::metadata::MetadataFetcher;
use crate::naming::{fallback_name, ArtifactPaths, FilenameDeriver};
use crate::transcription::Transcriber;
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{error, info, instrument, warn};

/// One URL to process, with its position in the batch.
#[derive(Debug, Clone)]
pub struct Job {
    pub url: String,
    pub index: usize,
}

/// Pipeline stage a job can fail in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Download,
    AudioExtraction,
    Transcription,
    Write,
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Stage::Download => write!(f, "download"),
            Stage::AudioExtraction => write!(f, "audio extraction"),
            Stage::Transcription => write!(f, "transcription"),
            Stage::Write => write!(f, "write"),
        }
    }
}

/// Terminal state of one job. Produced exactly once per job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobResult {
    Succeeded { message: String },
    Skipped { reason: String },
    Failed { stage: Stage, cause: String },
}

/// Counts accumulated over the batch. Skips count as successes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatchSummary {
    pub succeeded: usize,
    pub failed: usize,
}

impl BatchSummary {
    /// Fold one job result into the counts and emit its log line.
    fn record(&mut self, job: &Job, result: &JobResult) {
        match result {
            JobResult::Succeeded { message } => {
                self.succeeded += 1;
                info!("✓ {}: {}", job.url, message);
            }
            JobResult::Skipped { reason } => {
                self.succeeded += 1;
                info!("✓ {}: {}", job.url, reason);
            }
            JobResult::Failed { stage, cause } => {
                self.failed += 1;
                error!("✗ {}: {} failed: {}", job.url, stage, cause);
            }
        }
    }
}

/// The main orchestrator for the Skriv pipeline.
pub struct Orchestrator {
    settings: Settings,
    deriver: FilenameDeriver,
    fetcher: Arc<dyn MetadataFetcher>,
    downloader: Arc<dyn Downloader>,
    extractor: Arc<dyn AudioExtractor>,
    transcriber: Arc<dyn Transcriber>,
}

impl Orchestrator {
    /// Create an orchestrator with the default yt-dlp/ffmpeg collaborators.
    pub fn new(settings: Settings, transcriber: Arc<dyn Transcriber>) -> Self {
        let fetcher = Arc::new(crate::metadata::YtDlpMetadataFetcher::new(&settings));
        let downloader = Arc::new(crate::download::YtDlpDownloader::new(&settings));
        let extractor = Arc::new(crate::audio::FfmpegAudioExtractor::new(&settings));
        Self::with_components(settings, fetcher, downloader, extractor, transcriber)
    }

    /// Create an orchestrator with custom components.
    pub fn with_components(
        settings: Settings,
        fetcher: Arc<dyn MetadataFetcher>,
        downloader: Arc<dyn Downloader>,
        extractor: Arc<dyn AudioExtractor>,
        transcriber: Arc<dyn Transcriber>,
    ) -> Self {
        let deriver = FilenameDeriver::new(settings.pipeline.max_filename_length);
        Self {
            settings,
            deriver,
            fetcher,
            downloader,
            extractor,
            transcriber,
        }
    }

    /// Process every URL in order and return the batch summary.
    ///
    /// Jobs run strictly sequentially; each produces exactly one result.
    #[instrument(skip_all, fields(total = urls.len()))]
    pub async fn run(&self, urls: &[String]) -> BatchSummary {
        let mut summary = BatchSummary::default();
        // Base names handed out so far, for the collision fallback
        let mut seen_names: HashSet<String> = HashSet::new();

        for (index, url) in urls.iter().enumerate() {
            let job = Job {
                url: url.clone(),
                index,
            };
            info!("[{}/{}] Processing: {}", index + 1, urls.len(), job.url);

            let result = self.process_job(&job, &mut seen_names).await;
            summary.record(&job, &result);
        }

        summary
    }

    /// Run one job through the pipeline.
    ///
    /// The first failing stage aborts the job; partial artifacts from
    /// completed stages stay on disk for debugging and manual re-runs.
    #[instrument(skip(self, seen_names), fields(url = %job.url, index = job.index))]
    async fn process_job(&self, job: &Job, seen_names: &mut HashSet<String>) -> JobResult {
        // Metadata is best-effort and never fails the job
        let metadata = self.fetcher.fetch(&job.url).await;
        if metadata.is_none() {
            warn!("No metadata available, using index-based name");
        }

        let base_name = self.claim_base_name(metadata.as_ref(), job.index, seen_names);
        let paths = ArtifactPaths::new(&self.settings, &base_name);

        if paths.transcript.exists() {
            info!("Transcript already exists, skipping");
            return JobResult::Skipped {
                reason: "transcript already exists".to_string(),
            };
        }

        info!("Downloading video...");
        if let Err(e) = self.downloader.download(&job.url, &paths.video).await {
            return failed(Stage::Download, e);
        }

        info!("Extracting audio...");
        if let Err(e) = self.extractor.extract(&paths.video, &paths.audio).await {
            return failed(Stage::AudioExtraction, e);
        }

        info!("Transcribing...");
        let transcript = match self.transcriber.transcribe(&paths.audio).await {
            Ok(text) => text,
            Err(e) => return failed(Stage::Transcription, e),
        };

        if let Err(e) = write_transcript(
            &paths.transcript,
            &job.url,
            metadata.as_ref(),
            &transcript,
        ) {
            return failed(Stage::Write, e);
        }

        JobResult::Succeeded {
            message: format!("saved to {}", paths.transcript.display()),
        }
    }

    /// Derive the job's base name and register it for this batch.
    ///
    /// Sanitization can produce an empty string (pure-symbol titles) or a
    /// name another job already claimed; both would silently overwrite a
    /// different job's artifacts, so they fall back to `video_<index>`.
    /// A metadata-derived name from an earlier job can occupy even that
    /// (uploader "video", title matching the index), so the fallback is
    /// suffixed until it is free.
    fn claim_base_name(
        &self,
        metadata: Option<&crate::metadata::VideoMetadata>,
        index: usize,
        seen_names: &mut HashSet<String>,
    ) -> String {
        let derived = self.deriver.derive(metadata, index);
        let mut base_name = if derived.is_empty() || seen_names.contains(&derived) {
            warn!(
                "Base name {:?} is empty or already taken, falling back to index",
                derived
            );
            fallback_name(index)
        } else {
            derived
        };

        let mut attempt = 0;
        while seen_names.contains(&base_name) {
            attempt += 1;
            base_name = format!("{}_{}", fallback_name(index), attempt);
        }

        seen_names.insert(base_name.clone());
        base_name
    }
}

fn failed(stage: Stage, error: SkrivError) -> JobResult {
    JobResult::Failed {
        stage,
        cause: error.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::AudioExtractor;
    use crate::download::Downloader;
    use crate::error::Result;
    use crate::metadata::{MetadataFetcher, VideoMetadata};
    use async_trait::async_trait;
    use std::path::Path;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct StubFetcher {
        // One entry per expected call; later calls reuse the last entry
        responses: Vec<Option<VideoMetadata>>,
        calls: AtomicUsize,
    }

    #[async_trait]
    impl MetadataFetcher for StubFetcher {
        async fn fetch(&self, _url: &str) -> Option<VideoMetadata> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst);
            self.responses
                .get(call)
                .or_else(|| self.responses.last())
                .cloned()
                .flatten()
        }
    }

    struct StubDownloader {
        fail: bool,
        calls: AtomicUsize,
    }

    #[async_trait]
    impl Downloader for StubDownloader {
        async fn download(&self, _url: &str, output: &Path) -> Result<()> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                return Err(SkrivError::Download("simulated".to_string()));
            }
            std::fs::write(output, b"video")?;
            Ok(())
        }
    }

    struct StubExtractor {
        fail: bool,
        calls: AtomicUsize,
    }

    #[async_trait]
    impl AudioExtractor for StubExtractor {
        async fn extract(&self, _video: &Path, audio: &Path) -> Result<()> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                return Err(SkrivError::AudioExtraction("exit code 1".to_string()));
            }
            std::fs::write(audio, b"audio")?;
            Ok(())
        }
    }

    struct StubTranscriber {
        fail: bool,
        calls: AtomicUsize,
    }

    #[async_trait]
    impl Transcriber for StubTranscriber {
        async fn transcribe(&self, _audio_path: &Path) -> Result<String> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                return Err(SkrivError::Transcription("simulated".to_string()));
            }
            Ok("transcribed text".to_string())
        }

        fn model_name(&self) -> &str {
            "stub"
        }
    }

    struct Fixture {
        _dir: tempfile::TempDir,
        settings: Settings,
        fetcher: Arc<StubFetcher>,
        downloader: Arc<StubDownloader>,
        extractor: Arc<StubExtractor>,
        transcriber: Arc<StubTranscriber>,
    }

    impl Fixture {
        fn new(metadata: Option<VideoMetadata>) -> Self {
            Self::with_responses(vec![metadata])
        }

        fn with_responses(responses: Vec<Option<VideoMetadata>>) -> Self {
            let dir = tempfile::tempdir().unwrap();
            let mut settings = Settings::default();
            settings.pipeline.video_dir =
                dir.path().join("videos").to_string_lossy().into_owned();
            settings.pipeline.audio_dir =
                dir.path().join("audio").to_string_lossy().into_owned();
            settings.pipeline.transcript_dir =
                dir.path().join("transcripts").to_string_lossy().into_owned();
            settings.create_directories().unwrap();

            Self {
                _dir: dir,
                settings,
                fetcher: Arc::new(StubFetcher {
                    responses,
                    calls: AtomicUsize::new(0),
                }),
                downloader: Arc::new(StubDownloader {
                    fail: false,
                    calls: AtomicUsize::new(0),
                }),
                extractor: Arc::new(StubExtractor {
                    fail: false,
                    calls: AtomicUsize::new(0),
                }),
                transcriber: Arc::new(StubTranscriber {
                    fail: false,
                    calls: AtomicUsize::new(0),
                }),
            }
        }

        fn orchestrator(&self) -> Orchestrator {
            Orchestrator::with_components(
                self.settings.clone(),
                self.fetcher.clone(),
                self.downloader.clone(),
                self.extractor.clone(),
                self.transcriber.clone(),
            )
        }
    }

    fn sample_metadata() -> VideoMetadata {
        VideoMetadata {
            uploader: Some("alice".to_string()),
            title: Some("clip".to_string()),
            id: Some("abc".to_string()),
            view_count: Some(10),
            like_count: Some(2),
            duration_seconds: Some(30),
        }
    }

    #[tokio::test]
    async fn test_successful_job_writes_transcript() {
        let fixture = Fixture::new(Some(sample_metadata()));
        let summary = fixture
            .orchestrator()
            .run(&["https://example.com/v/1".to_string()])
            .await;

        assert_eq!(summary, BatchSummary { succeeded: 1, failed: 0 });
        let transcript = fixture
            .settings
            .transcript_dir()
            .join("alice_clip_abc.txt");
        let content = std::fs::read_to_string(transcript).unwrap();
        assert!(content.starts_with("URL: https://example.com/v/1\n"));
        assert!(content.contains("Creator: alice\n"));
        assert!(content.ends_with("transcribed text"));
    }

    #[tokio::test]
    async fn test_missing_metadata_falls_back_to_index_name_and_proceeds() {
        let fixture = Fixture::new(None);
        let summary = fixture
            .orchestrator()
            .run(&["https://example.com/v/1".to_string()])
            .await;

        assert_eq!(summary.succeeded, 1);
        let transcript = fixture.settings.transcript_dir().join("video_0.txt");
        let content = std::fs::read_to_string(transcript).unwrap();
        // No metadata block in the artifact
        assert!(!content.contains("Creator:"));
    }

    #[tokio::test]
    async fn test_existing_transcript_skips_all_stages() {
        let fixture = Fixture::new(Some(sample_metadata()));
        std::fs::write(
            fixture
                .settings
                .transcript_dir()
                .join("alice_clip_abc.txt"),
            "previous run",
        )
        .unwrap();

        let summary = fixture
            .orchestrator()
            .run(&["https://example.com/v/1".to_string()])
            .await;

        assert_eq!(summary, BatchSummary { succeeded: 1, failed: 0 });
        assert_eq!(fixture.downloader.calls.load(Ordering::SeqCst), 0);
        assert_eq!(fixture.extractor.calls.load(Ordering::SeqCst), 0);
        assert_eq!(fixture.transcriber.calls.load(Ordering::SeqCst), 0);

        // Content untouched
        let content = std::fs::read_to_string(
            fixture
                .settings
                .transcript_dir()
                .join("alice_clip_abc.txt"),
        )
        .unwrap();
        assert_eq!(content, "previous run");
    }

    #[tokio::test]
    async fn test_extraction_failure_keeps_video_and_continues() {
        let mut fixture = Fixture::new(None);
        fixture.extractor = Arc::new(StubExtractor {
            fail: true,
            calls: AtomicUsize::new(0),
        });

        let urls = vec![
            "https://example.com/v/1".to_string(),
            "https://example.com/v/2".to_string(),
        ];
        let summary = fixture.orchestrator().run(&urls).await;

        // Both jobs fail at extraction, but both are attempted
        assert_eq!(summary, BatchSummary { succeeded: 0, failed: 2 });
        assert_eq!(fixture.downloader.calls.load(Ordering::SeqCst), 2);
        assert_eq!(fixture.extractor.calls.load(Ordering::SeqCst), 2);
        assert_eq!(fixture.transcriber.calls.load(Ordering::SeqCst), 0);

        // Downloaded videos remain on disk for debugging
        assert!(fixture.settings.video_dir().join("video_0.mp4").exists());
        assert!(fixture.settings.video_dir().join("video_1.mp4").exists());
        assert!(!fixture
            .settings
            .transcript_dir()
            .join("video_0.txt")
            .exists());
    }

    #[tokio::test]
    async fn test_extraction_failure_is_classified_by_stage() {
        let mut fixture = Fixture::new(None);
        fixture.extractor = Arc::new(StubExtractor {
            fail: true,
            calls: AtomicUsize::new(0),
        });

        let orchestrator = fixture.orchestrator();
        let job = Job {
            url: "https://example.com/v/1".to_string(),
            index: 0,
        };
        let result = orchestrator
            .process_job(&job, &mut HashSet::new())
            .await;

        match result {
            JobResult::Failed { stage, .. } => {
                assert_eq!(stage, Stage::AudioExtraction);
                assert_eq!(stage.to_string(), "audio extraction");
            }
            other => panic!("Expected failure, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_download_failure_does_not_abort_batch() {
        let mut fixture = Fixture::new(None);
        fixture.downloader = Arc::new(StubDownloader {
            fail: true,
            calls: AtomicUsize::new(0),
        });

        let urls = vec![
            "https://example.com/v/1".to_string(),
            "https://example.com/v/2".to_string(),
            "https://example.com/v/3".to_string(),
        ];
        let summary = fixture.orchestrator().run(&urls).await;

        assert_eq!(summary.failed, 3);
        assert_eq!(fixture.downloader.calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_rerun_skips_every_completed_job() {
        let fixture = Fixture::new(Some(sample_metadata()));
        let urls = vec!["https://example.com/v/1".to_string()];

        let orchestrator = fixture.orchestrator();
        let first = orchestrator.run(&urls).await;
        assert_eq!(first, BatchSummary { succeeded: 1, failed: 0 });

        let transcript = fixture
            .settings
            .transcript_dir()
            .join("alice_clip_abc.txt");
        let content_before = std::fs::read_to_string(&transcript).unwrap();
        let downloads_before = fixture.downloader.calls.load(Ordering::SeqCst);

        let second = orchestrator.run(&urls).await;
        assert_eq!(second, BatchSummary { succeeded: 1, failed: 0 });
        assert_eq!(
            fixture.downloader.calls.load(Ordering::SeqCst),
            downloads_before
        );
        assert_eq!(std::fs::read_to_string(&transcript).unwrap(), content_before);
    }

    #[tokio::test]
    async fn test_colliding_base_names_fall_back_to_index() {
        // Same metadata for every URL would derive the same base name
        let fixture = Fixture::new(Some(sample_metadata()));
        let urls = vec![
            "https://example.com/v/1".to_string(),
            "https://example.com/v/2".to_string(),
        ];
        let summary = fixture.orchestrator().run(&urls).await;

        assert_eq!(summary, BatchSummary { succeeded: 2, failed: 0 });
        let dir = fixture.settings.transcript_dir();
        assert!(dir.join("alice_clip_abc.txt").exists());
        assert!(dir.join("video_1.txt").exists());
    }

    #[tokio::test]
    async fn test_fallback_name_occupied_by_earlier_job_gets_suffix() {
        // Job 0's metadata derives exactly "video_1", squatting on the
        // name job 1 would fall back to without metadata
        let squatter = VideoMetadata {
            uploader: Some("video".to_string()),
            title: Some("1".to_string()),
            id: Some("".to_string()),
            ..Default::default()
        };
        let fixture = Fixture::with_responses(vec![Some(squatter), None]);
        let urls = vec![
            "https://example.com/v/1".to_string(),
            "https://example.com/v/2".to_string(),
        ];
        let summary = fixture.orchestrator().run(&urls).await;

        assert_eq!(summary, BatchSummary { succeeded: 2, failed: 0 });
        let dir = fixture.settings.transcript_dir();
        assert!(dir.join("video_1.txt").exists());
        // Job 1 must not silently skip behind job 0's transcript
        assert!(dir.join("video_1_1.txt").exists());
        assert_eq!(fixture.downloader.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_pure_symbol_title_falls_back_to_index() {
        let metadata = VideoMetadata {
            uploader: Some("???".to_string()),
            title: Some("***".to_string()),
            id: Some("//".to_string()),
            ..Default::default()
        };
        let fixture = Fixture::new(Some(metadata));
        let summary = fixture
            .orchestrator()
            .run(&["https://example.com/v/1".to_string()])
            .await;

        assert_eq!(summary.succeeded, 1);
        assert!(fixture
            .settings
            .transcript_dir()
            .join("video_0.txt")
            .exists());
    }

    #[tokio::test]
    async fn test_transcription_failure_leaves_audio_on_disk() {
        let mut fixture = Fixture::new(None);
        fixture.transcriber = Arc::new(StubTranscriber {
            fail: true,
            calls: AtomicUsize::new(0),
        });

        let summary = fixture
            .orchestrator()
            .run(&["https://example.com/v/1".to_string()])
            .await;

        assert_eq!(summary.failed, 1);
        assert!(fixture.settings.video_dir().join("video_0.mp4").exists());
        assert!(fixture.settings.audio_dir().join("video_0.wav").exists());
    }
}
