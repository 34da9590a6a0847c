//! Scrape the configured subreddit from the command line.

use crate::cli::Output;
use crate::config::Settings;
use crate::reddit::HttpRedditClient;
use crate::store::Store;

/// Run one scrape and print the filtered posts.
pub async fn run_scrape(
    post_limit: Option<usize>,
    comment_limit: Option<usize>,
    settings: Settings,
) -> anyhow::Result<()> {
    let store = Store::new(&settings.database_path()?)?;
    let client = HttpRedditClient::from_env()?;

    let post_limit = post_limit.unwrap_or(settings.scraper.post_limit);
    let comment_limit = comment_limit.unwrap_or(settings.scraper.comment_limit_per_post);

    let spinner = Output::spinner(&format!("Scraping r/{}...", settings.reddit.subreddit));
    let posts = crate::scrape::run_scrape(
        &client,
        &store,
        &settings.reddit.subreddit,
        post_limit,
        comment_limit,
        &settings.scraper,
    )
    .await;
    spinner.finish_and_clear();

    let posts = posts?;

    Output::header(&format!("{} topic-matched posts", posts.len()));
    for post in &posts {
        Output::list_item(&format!(
            "{} [{}] ({} comments)",
            post.title,
            post.key_points.as_deref().unwrap_or(""),
            post.comments.len()
        ));
    }

    Ok(())
}
