//! Transcription pipeline: download → decode → chunk → transcribe → concatenate.
//!
//! The pipeline runs each stage to completion on the calling task. Any
//! failure aborts the whole run and surfaces an error naming the stage it
//! happened in; there is no partial-result return and no per-chunk retry.
//! All intermediate artifacts live in a scoped temporary directory that is
//! removed on every exit path.

use crate::audio::{download_video, extract_wav, extract_video_id, probe_duration_ms};
use crate::chunking::{extract_chunk, plan_chunks};
use crate::config::TranscriptionSettings;
use crate::error::{Result, TranscripterError};
use crate::openai::create_client;
use async_openai::types::CreateTranscriptionRequestArgs;
use std::fmt;
use tracing::{info, instrument, warn};

/// Pipeline stage, used to tag progress and error context.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Downloading,
    Decoding,
    Chunking,
    Transcribing { index: usize, total: usize },
    Concatenating,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stage::Downloading => write!(f, "downloading"),
            Stage::Decoding => write!(f, "decoding"),
            Stage::Chunking => write!(f, "chunking"),
            Stage::Transcribing { index, total } => {
                write!(f, "transcribing chunk {} of {}", index + 1, total)
            }
            Stage::Concatenating => write!(f, "concatenating"),
        }
    }
}

/// Result of a successful pipeline run.
#[derive(Debug, Clone)]
pub struct TranscriptionOutcome {
    /// Concatenated, whitespace-trimmed transcript text.
    pub text: String,
    pub video_title: Option<String>,
    pub channel_name: Option<String>,
}

/// Whisper-backed transcription pipeline.
pub struct TranscriptionPipeline {
    client: async_openai::Client<async_openai::config::OpenAIConfig>,
    model: String,
    max_chunk_bytes: u64,
}

impl TranscriptionPipeline {
    pub fn new(settings: &TranscriptionSettings) -> Self {
        Self {
            client: create_client(),
            model: settings.model.clone(),
            max_chunk_bytes: settings.max_chunk_bytes,
        }
    }

    /// Run the full pipeline for one video URL.
    #[instrument(skip(self), fields(url = %url))]
    pub async fn run(&self, url: &str) -> Result<TranscriptionOutcome> {
        let video_id = extract_video_id(url).unwrap_or_else(|| "video".to_string());

        // Working directory scoped to this invocation; removed on drop.
        let work_dir = tempfile::tempdir()?;

        info!("[{}] {}", video_id, Stage::Downloading);
        let video = download_video(url, work_dir.path())
            .await
            .map_err(|e| stage_error(Stage::Downloading, e))?;

        info!("[{}] {}", video_id, Stage::Decoding);
        let wav_path = work_dir.path().join(format!("{video_id}.wav"));
        extract_wav(&video.path, &wav_path)
            .await
            .map_err(|e| stage_error(Stage::Decoding, e))?;

        info!("[{}] {}", video_id, Stage::Chunking);
        let duration_ms = probe_duration_ms(&wav_path)
            .await
            .map_err(|e| stage_error(Stage::Chunking, e))?;
        let total_bytes = std::fs::metadata(&wav_path)?.len();
        let spans = plan_chunks(duration_ms, total_bytes, self.max_chunk_bytes);
        info!("[{}] {} chunks planned", video_id, spans.len());

        // Chunks are transcribed strictly in order: the final text is formed
        // by concatenation, so order matters. Each chunk file is removed as
        // soon as its transcription succeeds.
        let total = spans.len();
        let mut parts: Vec<String> = Vec::with_capacity(total);

        for (index, span) in spans.into_iter().enumerate() {
            let stage = Stage::Transcribing { index, total };
            info!("[{}] {}", video_id, stage);

            let chunk_path = work_dir.path().join(format!("{video_id}_{index:04}.wav"));
            extract_chunk(&wav_path, &chunk_path, span)
                .await
                .map_err(|e| stage_error(stage, e))?;

            let text = self
                .transcribe_chunk(&chunk_path)
                .await
                .map_err(|e| stage_error(stage, e))?;
            parts.push(text);

            if let Err(e) = std::fs::remove_file(&chunk_path) {
                warn!("Failed to remove chunk file {:?}: {}", chunk_path, e);
            }
        }

        info!("[{}] {}", video_id, Stage::Concatenating);
        let text = parts.join(" ").trim().to_string();

        Ok(TranscriptionOutcome {
            text,
            video_title: video.title,
            channel_name: video.channel,
        })
    }

    /// Submit one chunk file to the Whisper API.
    async fn transcribe_chunk(&self, chunk_path: &std::path::Path) -> Result<String> {
        let file_bytes = tokio::fs::read(chunk_path).await?;

        let request = CreateTranscriptionRequestArgs::default()
            .file(async_openai::types::AudioInput::from_vec_u8(
                chunk_path
                    .file_name()
                    .and_then(|n| n.to_str())
                    .unwrap_or("audio.wav")
                    .to_string(),
                file_bytes,
            ))
            .model(&self.model)
            .build()
            .map_err(|e| TranscripterError::Transcription(format!("Failed to build request: {e}")))?;

        let response = self
            .client
            .audio()
            .transcribe(request)
            .await
            .map_err(|e| TranscripterError::OpenAI(format!("Whisper API error: {e}")))?;

        Ok(response.text)
    }
}

fn stage_error(stage: Stage, source: TranscripterError) -> TranscripterError {
    TranscripterError::Transcription(format!("{stage}: {source}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stage_display() {
        assert_eq!(Stage::Downloading.to_string(), "downloading");
        assert_eq!(
            Stage::Transcribing { index: 2, total: 5 }.to_string(),
            "transcribing chunk 3 of 5"
        );
    }

    #[test]
    fn test_stage_error_names_the_stage() {
        let err = stage_error(
            Stage::Decoding,
            TranscripterError::Audio("no audio track".to_string()),
        );
        assert!(err.to_string().contains("decoding"));
        assert!(err.to_string().contains("no audio track"));
    }
}
