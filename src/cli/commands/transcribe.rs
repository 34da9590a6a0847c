//! Transcribe a YouTube video from the command line.

use crate::cli::Output;
use crate::config::Settings;
use crate::store::Store;
use crate::transcription::TranscriptionPipeline;

/// Run the transcription pipeline for one URL and store the transcript.
pub async fn run_transcribe(url: &str, settings: Settings) -> anyhow::Result<()> {
    let store = Store::new(&settings.database_path()?)?;
    let pipeline = TranscriptionPipeline::new(&settings.transcription);

    let spinner = Output::spinner("Transcribing...");
    let outcome = pipeline.run(url).await;
    spinner.finish_and_clear();

    let outcome = outcome?;

    let transcript_id = store.save_transcript(
        url,
        &outcome.text,
        outcome.video_title.as_deref(),
        outcome.channel_name.as_deref(),
    )?;

    if let Some(title) = &outcome.video_title {
        Output::kv("Title", title);
    }
    if let Some(channel) = &outcome.channel_name {
        Output::kv("Channel", channel);
    }
    Output::success(&format!("Stored transcript #{}", transcript_id));
    println!();
    println!("{}", outcome.text);

    Ok(())
}
