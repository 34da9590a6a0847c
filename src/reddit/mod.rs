//! Reddit API client abstraction.
//!
//! The scrape pipeline talks to Reddit through the [`RedditClient`] trait so
//! tests can substitute a canned client; [`HttpRedditClient`] is the real
//! OAuth-backed implementation.

mod http;

pub use http::HttpRedditClient;

use crate::error::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// A post fetched from a subreddit listing, plus whatever comments were
/// retrieved for it and the topic labels attached by the filter.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScrapedPost {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub selftext: String,
    pub url: String,
    pub created_utc: Option<i64>,
    /// Sorted, comma-joined matched topic labels; set by the topic filter.
    #[serde(default)]
    pub key_points: Option<String>,
    #[serde(default)]
    pub comments: Vec<ScrapedComment>,
}

/// A top-level comment fetched for a post.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScrapedComment {
    pub id: String,
    #[serde(default)]
    pub body: String,
    pub author: Option<String>,
    #[serde(default)]
    pub score: i64,
    pub created_utc: Option<i64>,
}

/// Read access to a subreddit.
#[async_trait]
pub trait RedditClient: Send + Sync {
    /// Fetch up to `limit` newest posts from the subreddit. Posts come back
    /// without comments.
    async fn fetch_new_posts(&self, subreddit: &str, limit: usize) -> Result<Vec<ScrapedPost>>;

    /// Fetch up to `limit` top-level comments for a post.
    async fn fetch_top_comments(
        &self,
        subreddit: &str,
        post_id: &str,
        limit: usize,
    ) -> Result<Vec<ScrapedComment>>;
}
