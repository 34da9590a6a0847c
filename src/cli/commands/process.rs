//! Key-point extraction over scraped posts that haven't been processed yet.

use crate::cli::Output;
use crate::config::Settings;
use crate::store::{KeyPointsPayload, SourceType, Store};
use crate::summarize::{Mode, Summarizer};
use crate::topics;
use tracing::warn;

/// Run key-point extraction over up to `limit` unprocessed posts, oldest
/// scrape first. A failure on one post is reported and skipped; the run
/// continues with the rest.
pub async fn run_process_posts(limit: usize, settings: Settings) -> anyhow::Result<()> {
    let store = Store::new(&settings.database_path()?)?;
    let summarizer = Summarizer::new(&settings.summarize);

    let pending = store.unprocessed_posts(limit)?;
    if pending.is_empty() {
        Output::info("No unprocessed posts.");
        return Ok(());
    }

    let pb = Output::progress_bar(pending.len() as u64, "Processing posts");
    let mut processed = 0;
    let mut failed = 0;

    for post in &pending {
        let text = format!("{}\n\n{}", post.title, post.selftext);

        match summarizer.complete(&text, Mode::KeyPoints).await {
            Ok(key_points) => {
                store.mark_post_processed(&post.id, KeyPointsPayload::Text(key_points))?;

                // Re-derive topic associations from the post text so processed
                // posts stay queryable by topic.
                for topic in topics::match_topics([post.title.as_str(), post.selftext.as_str()]) {
                    let topic_id = store.save_topic(topic)?;
                    if let Err(e) =
                        store.associate_topic_to_source(topic_id, SourceType::RedditPost, &post.id)
                    {
                        warn!("Failed to associate topic {} to {}: {}", topic, post.id, e);
                    }
                }

                processed += 1;
            }
            Err(e) => {
                warn!("Key-point extraction failed for {}: {}", post.id, e);
                failed += 1;
            }
        }

        pb.inc(1);
    }

    pb.finish_and_clear();
    Output::success(&format!("Processed {} posts", processed));
    if failed > 0 {
        Output::warning(&format!("{} posts failed and remain unprocessed", failed));
    }

    Ok(())
}
