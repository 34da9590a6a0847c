//! Video download and audio extraction utilities.
//!
//! This module wraps the external yt-dlp, ffmpeg, and ffprobe tools for
//! downloading a video and decoding its audio track to a canonical WAV
//! intermediate.

use crate::error::{Result, TranscripterError};
use regex::Regex;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::process::Command;
use tracing::{debug, info, instrument};

/// A downloaded video with the metadata yt-dlp reported for it.
#[derive(Debug, Clone)]
pub struct DownloadedVideo {
    pub path: PathBuf,
    pub title: Option<String>,
    pub channel: Option<String>,
}

/// Extract the 11-character video id from a YouTube URL or bare id.
pub fn extract_video_id(input: &str) -> Option<String> {
    // Matches various YouTube URL formats and bare video IDs
    let re = Regex::new(
        r"(?x)
        (?:
            (?:https?://)?
            (?:www\.)?
            (?:youtube\.com/watch\?v=|youtu\.be/|youtube\.com/embed/|youtube\.com/v/)
            ([a-zA-Z0-9_-]{11})
        )
        |
        ^([a-zA-Z0-9_-]{11})$
    ",
    )
    .expect("Invalid regex");

    let caps = re.captures(input.trim())?;
    caps.get(1)
        .or_else(|| caps.get(2))
        .map(|m| m.as_str().to_string())
}

/// Download a video into `output_dir` using yt-dlp.
///
/// The file lands at `video.<ext>` inside the directory; title and channel
/// are parsed from yt-dlp's JSON output.
#[instrument(skip(output_dir))]
pub async fn download_video(url: &str, output_dir: &Path) -> Result<DownloadedVideo> {
    info!("Downloading video from {}", url);

    let template = output_dir.join("video.%(ext)s");

    let result = Command::new("yt-dlp")
        .arg("--format").arg("mp4/bestaudio/best")
        .arg("--output").arg(template.to_str().unwrap_or_default())
        .arg("--no-playlist")
        .arg("--no-warnings")
        .arg("--print-json")
        .arg(url)
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .output()
        .await;

    let output = match result {
        Ok(o) => o,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(TranscripterError::ToolNotFound("yt-dlp".into()));
        }
        Err(e) => {
            return Err(TranscripterError::VideoDownload(format!(
                "yt-dlp execution failed: {e}"
            )));
        }
    };

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(TranscripterError::VideoDownload(format!(
            "yt-dlp failed: {stderr}"
        )));
    }

    let (title, channel) = parse_metadata(&output.stdout);
    let path = find_video_file(output_dir)?;

    debug!("Downloaded {:?}", path);
    Ok(DownloadedVideo { path, title, channel })
}

/// Pull title and uploader out of yt-dlp's JSON dump.
fn parse_metadata(stdout: &[u8]) -> (Option<String>, Option<String>) {
    let json_str = String::from_utf8_lossy(stdout);
    match serde_json::from_str::<serde_json::Value>(json_str.trim()) {
        Ok(json) => {
            let title = json["title"].as_str().map(|s| s.to_string());
            let channel = json["channel"]
                .as_str()
                .or_else(|| json["uploader"].as_str())
                .map(|s| s.to_string());
            (title, channel)
        }
        Err(_) => (None, None),
    }
}

/// Locate the downloaded video file regardless of container extension.
fn find_video_file(dir: &Path) -> Result<PathBuf> {
    let entries = std::fs::read_dir(dir)
        .map_err(|e| TranscripterError::VideoDownload(format!("Cannot read directory: {e}")))?;

    for entry in entries.flatten() {
        let name = entry.file_name();
        if name.to_string_lossy().starts_with("video.") {
            return Ok(entry.path());
        }
    }

    Err(TranscripterError::VideoDownload(
        "Video file not found after download".into(),
    ))
}

/// Decode a video's audio track to 16 kHz mono PCM WAV using ffmpeg.
#[instrument(skip_all)]
pub async fn extract_wav(video: &Path, wav: &Path) -> Result<()> {
    debug!("Extracting audio from {:?}", video);

    let result = Command::new("ffmpeg")
        .arg("-i").arg(video)
        .arg("-vn")
        .arg("-acodec").arg("pcm_s16le")
        .arg("-ar").arg("16000")
        .arg("-ac").arg("1")
        .arg("-y")
        .arg("-loglevel").arg("error")
        .arg(wav)
        .stdout(Stdio::null())
        .stderr(Stdio::piped())
        .output()
        .await;

    match result {
        Ok(out) if out.status.success() => Ok(()),
        Ok(out) => {
            let err = String::from_utf8_lossy(&out.stderr);
            Err(TranscripterError::Audio(format!(
                "ffmpeg audio extraction failed: {err}"
            )))
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            Err(TranscripterError::ToolNotFound("ffmpeg".into()))
        }
        Err(e) => Err(TranscripterError::Audio(format!("ffmpeg error: {e}"))),
    }
}

/// Query the duration of an audio file in milliseconds using ffprobe.
pub async fn probe_duration_ms(path: &Path) -> Result<u64> {
    let result = Command::new("ffprobe")
        .arg("-v").arg("quiet")
        .arg("-print_format").arg("json")
        .arg("-show_format")
        .arg(path)
        .output()
        .await;

    let output = match result {
        Ok(o) => o,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(TranscripterError::ToolNotFound("ffprobe".into()));
        }
        Err(e) => {
            return Err(TranscripterError::Audio(format!("ffprobe failed: {e}")));
        }
    };

    if !output.status.success() {
        return Err(TranscripterError::Audio("ffprobe returned error".into()));
    }

    let json_str = String::from_utf8_lossy(&output.stdout);
    let parsed: serde_json::Value = serde_json::from_str(&json_str)
        .map_err(|_| TranscripterError::Audio("Invalid ffprobe output".into()))?;

    let seconds = parsed["format"]["duration"]
        .as_str()
        .and_then(|s| s.parse::<f64>().ok())
        .ok_or_else(|| TranscripterError::Audio("Could not determine audio duration".into()))?;

    Ok((seconds * 1000.0) as u64)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_video_id() {
        assert_eq!(
            extract_video_id("https://www.youtube.com/watch?v=dQw4w9WgXcQ"),
            Some("dQw4w9WgXcQ".to_string())
        );
        assert_eq!(
            extract_video_id("https://youtu.be/dQw4w9WgXcQ"),
            Some("dQw4w9WgXcQ".to_string())
        );
        assert_eq!(
            extract_video_id("dQw4w9WgXcQ"),
            Some("dQw4w9WgXcQ".to_string())
        );
        assert_eq!(extract_video_id("not-a-video-id"), None);
        assert_eq!(extract_video_id(""), None);
    }

    #[test]
    fn test_parse_metadata() {
        let json = br#"{"title": "Patch Notes Review", "uploader": "GameChannel"}"#;
        let (title, channel) = parse_metadata(json);
        assert_eq!(title.as_deref(), Some("Patch Notes Review"));
        assert_eq!(channel.as_deref(), Some("GameChannel"));

        let (title, channel) = parse_metadata(b"not json");
        assert!(title.is_none() && channel.is_none());
    }
}
