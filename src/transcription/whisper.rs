//! Whisper-based transcription using whisper-rs.
//!
//! The model is loaded once per process and shared across all jobs in the
//! batch; each call runs inference on its own state. Requires the
//! `whisper` feature (and cmake to build whisper.cpp). Without the
//! feature a stub is compiled that fails at load time.

use crate::error::{Result, SkrivError};
use crate::transcription::Transcriber;
use async_trait::async_trait;
use std::path::Path;

#[cfg(feature = "whisper")]
use std::sync::{Arc, Mutex, Once};
#[cfg(feature = "whisper")]
use tracing::{debug, info};
#[cfg(feature = "whisper")]
use whisper_rs::{
    install_logging_hooks, FullParams, SamplingStrategy, WhisperContext,
    WhisperContextParameters,
};

/// Sample rate the Whisper model expects.
pub const SAMPLE_RATE: u32 = 16_000;

#[cfg(feature = "whisper")]
static LOGGING_HOOKS_INSTALLED: Once = Once::new();

/// Locally loaded Whisper model.
#[cfg(feature = "whisper")]
pub struct WhisperEngine {
    context: Arc<Mutex<WhisperContext>>,
    language: Option<String>,
    model_name: String,
}

/// Stub engine compiled without the `whisper` feature; fails at load time.
#[cfg(not(feature = "whisper"))]
pub struct WhisperEngine {
    model_name: String,
}

#[cfg(feature = "whisper")]
impl WhisperEngine {
    /// Load a ggml Whisper model from disk.
    ///
    /// `language` is a two-letter code, or "auto" for detection. Load
    /// failure is fatal to the whole run, so this happens at startup
    /// before any job is attempted.
    pub fn load(model_path: &Path, language: &str) -> Result<Self> {
        LOGGING_HOOKS_INSTALLED.call_once(|| {
            // Route whisper.cpp's stderr chatter through the log crate
            install_logging_hooks();
        });

        if !model_path.exists() {
            return Err(SkrivError::ModelLoad(format!(
                "Model file not found at {}. Download a ggml model, e.g.: \
                 https://huggingface.co/ggerganov/whisper.cpp",
                model_path.display()
            )));
        }

        let model_name = model_name_from_path(model_path);

        info!("Loading Whisper model from {}", model_path.display());
        let path_str = model_path.to_str().ok_or_else(|| {
            SkrivError::ModelLoad("Invalid UTF-8 in model path".to_string())
        })?;
        let context =
            WhisperContext::new_with_params(path_str, WhisperContextParameters::default())
                .map_err(|e| SkrivError::ModelLoad(e.to_string()))?;
        info!("Model loaded successfully");

        let language = match language {
            "auto" | "" => None,
            lang => Some(lang.to_string()),
        };

        Ok(Self {
            context: Arc::new(Mutex::new(context)),
            language,
            model_name,
        })
    }
}

#[cfg(not(feature = "whisper"))]
impl WhisperEngine {
    pub fn load(_model_path: &Path, _language: &str) -> Result<Self> {
        Err(SkrivError::ModelLoad(
            "Built without Whisper support. Rebuild with --features whisper.".to_string(),
        ))
    }
}

fn model_name_from_path(path: &Path) -> String {
    path.file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("unknown")
        .to_string()
}

#[cfg(feature = "whisper")]
#[async_trait]
impl Transcriber for WhisperEngine {
    async fn transcribe(&self, audio_path: &Path) -> Result<String> {
        debug!("Transcribing audio from {}", audio_path.display());

        let samples = read_wav_samples(audio_path)?;
        let context = self.context.clone();
        let language = self.language.clone();

        // Inference is CPU-bound and can run for minutes
        let text = tokio::task::spawn_blocking(move || -> Result<String> {
            let context = context
                .lock()
                .map_err(|e| SkrivError::Transcription(format!("Context lock poisoned: {}", e)))?;

            let mut state = context
                .create_state()
                .map_err(|e| SkrivError::Transcription(format!("Failed to create state: {}", e)))?;

            let mut params = FullParams::new(SamplingStrategy::Greedy { best_of: 1 });
            params.set_language(language.as_deref());
            params.set_print_special(false);
            params.set_print_progress(false);
            params.set_print_realtime(false);
            params.set_print_timestamps(false);

            state
                .full(params, &samples)
                .map_err(|e| SkrivError::Transcription(format!("Inference failed: {}", e)))?;

            let mut text = String::new();
            for segment in state.as_iter() {
                text.push_str(&segment.to_string());
            }
            Ok(text)
        })
        .await
        .map_err(|e| SkrivError::Transcription(format!("Inference task panicked: {}", e)))??;

        let text = text.trim().to_string();
        if text.is_empty() {
            return Err(SkrivError::Transcription(
                "Transcription returned empty text".to_string(),
            ));
        }

        debug!("Transcription complete ({} chars)", text.len());
        Ok(text)
    }

    fn model_name(&self) -> &str {
        &self.model_name
    }
}

#[cfg(not(feature = "whisper"))]
#[async_trait]
impl Transcriber for WhisperEngine {
    async fn transcribe(&self, _audio_path: &Path) -> Result<String> {
        Err(SkrivError::Transcription(
            "Built without Whisper support".to_string(),
        ))
    }

    fn model_name(&self) -> &str {
        &self.model_name
    }
}

/// Read a WAV file into normalized f32 samples at 16 kHz mono.
///
/// The extraction stage already produces 16 kHz mono, but downmix and
/// resample anyway so a hand-supplied WAV still works.
pub fn read_wav_samples(path: &Path) -> Result<Vec<f32>> {
    let mut reader = hound::WavReader::open(path)
        .map_err(|e| SkrivError::Transcription(format!("Failed to open WAV file: {}", e)))?;

    let spec = reader.spec();
    let raw: Vec<i16> = reader
        .samples::<i16>()
        .collect::<std::result::Result<Vec<_>, _>>()
        .map_err(|e| SkrivError::Transcription(format!("Failed to read WAV samples: {}", e)))?;

    let mono: Vec<i16> = if spec.channels > 1 {
        let channels = spec.channels as usize;
        raw.chunks_exact(channels)
            .map(|frame| {
                let sum: i32 = frame.iter().map(|&s| s as i32).sum();
                (sum / channels as i32) as i16
            })
            .collect()
    } else {
        raw
    };

    let resampled = if spec.sample_rate != SAMPLE_RATE {
        resample(&mono, spec.sample_rate, SAMPLE_RATE)
    } else {
        mono
    };

    Ok(resampled.iter().map(|&s| s as f32 / 32768.0).collect())
}

/// Nearest-neighbor resampling; adequate for speech input.
fn resample(samples: &[i16], from_rate: u32, to_rate: u32) -> Vec<i16> {
    if from_rate == to_rate || samples.is_empty() {
        return samples.to_vec();
    }
    let ratio = from_rate as f64 / to_rate as f64;
    let out_len = (samples.len() as f64 / ratio) as usize;
    (0..out_len)
        .map(|i| {
            let src = (i as f64 * ratio) as usize;
            samples[src.min(samples.len() - 1)]
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use hound::{SampleFormat, WavSpec, WavWriter};

    fn write_wav(path: &Path, sample_rate: u32, channels: u16, samples: &[i16]) {
        let spec = WavSpec {
            channels,
            sample_rate,
            bits_per_sample: 16,
            sample_format: SampleFormat::Int,
        };
        let mut writer = WavWriter::create(path, spec).unwrap();
        for &s in samples {
            writer.write_sample(s).unwrap();
        }
        writer.finalize().unwrap();
    }

    #[test]
    fn test_read_mono_16k() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("a.wav");
        write_wav(&path, SAMPLE_RATE, 1, &[0, 16384, -16384, 32767]);

        let samples = read_wav_samples(&path).unwrap();
        assert_eq!(samples.len(), 4);
        assert!((samples[1] - 0.5).abs() < 0.001);
        assert!((samples[2] + 0.5).abs() < 0.001);
    }

    #[test]
    fn test_stereo_is_downmixed() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("stereo.wav");
        write_wav(&path, SAMPLE_RATE, 2, &[1000, 3000, -2000, 2000]);

        let samples = read_wav_samples(&path).unwrap();
        assert_eq!(samples.len(), 2);
        assert!((samples[0] - 2000.0 / 32768.0).abs() < 0.001);
        assert!(samples[1].abs() < 0.001);
    }

    #[test]
    fn test_resample_halves_sample_count() {
        let samples: Vec<i16> = (0..3200).map(|i| i as i16).collect();
        let resampled = resample(&samples, 32_000, SAMPLE_RATE);
        assert_eq!(resampled.len(), 1600);
    }

    #[test]
    fn test_model_name_from_path() {
        assert_eq!(
            model_name_from_path(Path::new("models/ggml-base.bin")),
            "ggml-base"
        );
    }
}
