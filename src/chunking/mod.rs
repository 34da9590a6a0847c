//! Byte-budget audio chunk planning.
//!
//! The Whisper API caps uploads at 25 MB, so long audio has to be cut into
//! smaller pieces before submission. Rather than decoding the stream to
//! measure each piece, the chunk duration is derived from the file's overall
//! bytes-per-millisecond ratio: a uniform-bitrate estimate that holds well
//! for the PCM WAV intermediate this service produces.

use crate::error::{Result, TranscripterError};
use std::path::Path;
use std::process::Stdio;
use tokio::process::Command;
use tracing::debug;

/// Floor for the computed chunk duration. A pathological size estimate
/// (tiny duration, huge file) could otherwise yield a zero-length chunk and
/// an unbounded number of segments.
const MIN_CHUNK_DURATION_MS: u64 = 1_000;

/// A contiguous time range `[start_ms, end_ms)` within an audio stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChunkSpan {
    pub start_ms: u64,
    pub end_ms: u64,
}

impl ChunkSpan {
    /// Length of the span in milliseconds.
    pub fn duration_ms(&self) -> u64 {
        self.end_ms - self.start_ms
    }
}

/// Plan chunk spans for an audio stream.
///
/// Given the decoded duration, the on-disk byte size, and the maximum byte
/// budget per chunk, produces contiguous, non-overlapping spans covering
/// `[0, duration_ms)`. Every span except possibly the last has exactly the
/// allowed chunk duration; the last is clipped to the total duration.
///
/// A zero-length input yields an empty plan.
pub fn plan_chunks(duration_ms: u64, total_bytes: u64, max_chunk_bytes: u64) -> Vec<ChunkSpan> {
    if duration_ms == 0 {
        return Vec::new();
    }

    let bytes_per_ms = total_bytes as f64 / duration_ms as f64;
    let chunk_duration_ms = if bytes_per_ms > 0.0 {
        (max_chunk_bytes as f64 / bytes_per_ms) as u64
    } else {
        // Empty file: a single span covers everything.
        duration_ms
    };
    let chunk_duration_ms = chunk_duration_ms.max(MIN_CHUNK_DURATION_MS);

    let mut spans = Vec::new();
    let mut start = 0u64;
    while start < duration_ms {
        let end = (start + chunk_duration_ms).min(duration_ms);
        spans.push(ChunkSpan { start_ms: start, end_ms: end });
        start = end;
    }

    debug!(
        "Planned {} chunks of up to {} ms for {} ms of audio",
        spans.len(),
        chunk_duration_ms,
        duration_ms
    );

    spans
}

/// Materialize one chunk span as an independent WAV file.
///
/// The caller owns the resulting file and is responsible for deleting it
/// after use.
pub async fn extract_chunk(source: &Path, dest: &Path, span: ChunkSpan) -> Result<()> {
    let start_secs = span.start_ms as f64 / 1000.0;
    let length_secs = span.duration_ms() as f64 / 1000.0;

    let result = Command::new("ffmpeg")
        .arg("-ss").arg(format!("{:.3}", start_secs))
        .arg("-i").arg(source)
        .arg("-t").arg(format!("{:.3}", length_secs))
        .arg("-c").arg("copy")
        .arg("-y")
        .arg("-loglevel").arg("error")
        .arg(dest)
        .stdout(Stdio::null())
        .stderr(Stdio::piped())
        .output()
        .await;

    match result {
        Ok(out) if out.status.success() => Ok(()),
        Ok(out) => {
            let err = String::from_utf8_lossy(&out.stderr);
            Err(TranscripterError::Audio(format!(
                "Chunk extraction failed: {err}"
            )))
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            Err(TranscripterError::ToolNotFound("ffmpeg".into()))
        }
        Err(e) => Err(TranscripterError::Audio(format!("ffmpeg error: {e}"))),
    }
}
