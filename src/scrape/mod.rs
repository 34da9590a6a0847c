//! Scrape pipeline: fetch → topic filter → persist.
//!
//! Fetches new posts from the configured subreddit, attaches up to a capped
//! number of top-level comments per post, filters the batch through the
//! topic vocabulary, and persists survivors with their topic associations.
//! Persistence is best-effort: a database failure is logged and the filtered
//! set is still returned to the caller.

use crate::config::ScraperSettings;
use crate::error::Result;
use crate::reddit::{RedditClient, ScrapedPost};
use crate::store::{SourceType, Store};
use crate::topics;
use tracing::{info, instrument, warn};

/// Run one scrape of the subreddit.
///
/// Overfetches beyond `post_limit` to compensate for posts the topic filter
/// later drops. A comment-fetch failure for one post is logged and that
/// post proceeds with whatever comments were retrieved.
#[instrument(skip(client, store, settings))]
pub async fn run_scrape(
    client: &dyn RedditClient,
    store: &Store,
    subreddit: &str,
    post_limit: usize,
    comment_limit_per_post: usize,
    settings: &ScraperSettings,
) -> Result<Vec<ScrapedPost>> {
    let fetch_limit = post_limit + settings.overfetch;
    info!(
        "Scraping r/{}: {} posts requested ({} fetched), {} comments per post",
        subreddit, post_limit, fetch_limit, comment_limit_per_post
    );

    let mut posts = client.fetch_new_posts(subreddit, fetch_limit).await?;

    for post in &mut posts {
        match client
            .fetch_top_comments(subreddit, &post.id, comment_limit_per_post)
            .await
        {
            Ok(comments) => post.comments = comments,
            Err(e) => {
                warn!("Comment fetch failed for post {}: {}", post.id, e);
            }
        }
    }

    let filtered = topics::filter_posts(posts);
    info!("{} posts survived the topic filter", filtered.len());

    persist_posts(store, &filtered);

    Ok(filtered)
}

/// Persist filtered posts and their topic associations.
///
/// Failures are logged and swallowed: persistence never turns a successful
/// fetch into an error for the caller.
fn persist_posts(store: &Store, posts: &[ScrapedPost]) {
    match store.save_post_batch(posts) {
        Ok((saved_posts, saved_comments)) => {
            info!("Persisted {} posts and {} comments", saved_posts, saved_comments);
        }
        Err(e) => {
            warn!("Failed to persist scraped posts: {}", e);
            return;
        }
    }

    for post in posts {
        let Some(key_points) = &post.key_points else {
            continue;
        };
        for topic in key_points.split(',').filter(|t| !t.is_empty()) {
            let topic_id = match store.save_topic(topic) {
                Ok(id) => id,
                Err(e) => {
                    warn!("Failed to save topic {}: {}", topic, e);
                    continue;
                }
            };
            if let Err(e) =
                store.associate_topic_to_source(topic_id, SourceType::RedditPost, &post.id)
            {
                warn!(
                    "Failed to associate topic {} with post {}: {}",
                    topic, post.id, e
                );
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::TranscripterError;
    use crate::reddit::{RedditClient, ScrapedComment, ScrapedPost};
    use async_trait::async_trait;

    /// Canned client: serves a fixed post list; comment fetches fail for
    /// ids listed in `broken_comment_ids`.
    struct FakeRedditClient {
        posts: Vec<ScrapedPost>,
        comments: Vec<ScrapedComment>,
        broken_comment_ids: Vec<String>,
    }

    #[async_trait]
    impl RedditClient for FakeRedditClient {
        async fn fetch_new_posts(
            &self,
            _subreddit: &str,
            limit: usize,
        ) -> crate::error::Result<Vec<ScrapedPost>> {
            Ok(self.posts.iter().take(limit).cloned().collect())
        }

        async fn fetch_top_comments(
            &self,
            _subreddit: &str,
            post_id: &str,
            limit: usize,
        ) -> crate::error::Result<Vec<ScrapedComment>> {
            if self.broken_comment_ids.iter().any(|id| id == post_id) {
                return Err(TranscripterError::Reddit("timeout".to_string()));
            }
            Ok(self.comments.iter().take(limit).cloned().collect())
        }
    }

    fn post(id: &str, title: &str) -> ScrapedPost {
        ScrapedPost {
            id: id.to_string(),
            title: title.to_string(),
            selftext: String::new(),
            url: format!("https://reddit.com/r/test/{id}"),
            created_utc: Some(1_700_000_000),
            key_points: None,
            comments: Vec::new(),
        }
    }

    fn comment(id: &str, body: &str) -> ScrapedComment {
        ScrapedComment {
            id: id.to_string(),
            body: body.to_string(),
            author: Some("tester".to_string()),
            score: 1,
            created_utc: None,
        }
    }

    fn test_store() -> (tempfile::TempDir, Store) {
        let dir = tempfile::tempdir().unwrap();
        let store = Store::new(&dir.path().join("scrape.db")).unwrap();
        (dir, store)
    }

    #[tokio::test]
    async fn test_scrape_filters_and_persists() {
        let client = FakeRedditClient {
            posts: vec![
                post("p1", "New PvP build guide"),
                post("p2", "Server maintenance tonight"),
            ],
            comments: vec![comment("c1", "solid guide")],
            broken_comment_ids: vec![],
        };
        let (_dir, store) = test_store();

        let result = run_scrape(
            &client,
            &store,
            "testsub",
            10,
            3,
            &ScraperSettings::default(),
        )
        .await
        .unwrap();

        assert_eq!(result.len(), 1);
        assert_eq!(result[0].id, "p1");
        assert_eq!(result[0].key_points.as_deref(), Some("build,guide,pvp"));

        // Survivor and its topic associations landed in the store.
        let pending = store.unprocessed_posts(10).unwrap();
        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].id, "p1");

        let a1 = store
            .associate_topic_to_source(
                store.save_topic("pvp").unwrap(),
                SourceType::RedditPost,
                "p1",
            )
            .unwrap();
        // Association already exists from the scrape; same id comes back.
        let a2 = store
            .associate_topic_to_source(
                store.save_topic("pvp").unwrap(),
                SourceType::RedditPost,
                "p1",
            )
            .unwrap();
        assert_eq!(a1, a2);
    }

    #[tokio::test]
    async fn test_comment_fetch_failure_does_not_abort_batch() {
        let client = FakeRedditClient {
            posts: vec![post("p1", "combat feels great")],
            comments: vec![],
            broken_comment_ids: vec!["p1".to_string()],
        };
        let (_dir, store) = test_store();

        let result = run_scrape(
            &client,
            &store,
            "testsub",
            5,
            3,
            &ScraperSettings::default(),
        )
        .await
        .unwrap();

        assert_eq!(result.len(), 1);
        assert!(result[0].comments.is_empty());
    }

    #[tokio::test]
    async fn test_overfetch_requests_more_than_target() {
        // Eight posts available; target of 2 with the default +5 overfetch
        // pulls seven, so filter drops can be compensated.
        let mut posts: Vec<ScrapedPost> = (0..8)
            .map(|i| post(&format!("p{i}"), "nothing relevant"))
            .collect();
        posts[6].title = "economy deep dive".to_string();

        let client = FakeRedditClient {
            posts,
            comments: vec![],
            broken_comment_ids: vec![],
        };
        let (_dir, store) = test_store();

        let result = run_scrape(
            &client,
            &store,
            "testsub",
            2,
            0,
            &ScraperSettings::default(),
        )
        .await
        .unwrap();

        assert_eq!(result.len(), 1);
        assert_eq!(result[0].id, "p6");
    }
}
