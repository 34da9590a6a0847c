//! Summarize transcript text from a file or stdin.

use crate::cli::Output;
use crate::config::Settings;
use crate::summarize::{Mode, Summarizer};
use std::io::Read;

/// Read transcript text from `input` ('-' for stdin) and print either a
/// summary or grouped key points.
pub async fn run_summarize(input: &str, keypoints: bool, settings: Settings) -> anyhow::Result<()> {
    let text = if input == "-" {
        let mut buf = String::new();
        std::io::stdin().read_to_string(&mut buf)?;
        buf
    } else {
        std::fs::read_to_string(input)?
    };

    let mode = if keypoints {
        Mode::KeyPoints
    } else {
        Mode::Summarize
    };

    let summarizer = Summarizer::new(&settings.summarize);

    let spinner = Output::spinner("Waiting for completion...");
    let result = summarizer.complete(&text, mode).await;
    spinner.finish_and_clear();

    println!("{}", result?);

    Ok(())
}
