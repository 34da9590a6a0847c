//! OAuth-backed Reddit API client.
//!
//! Uses the client-credentials grant against `www.reddit.com/api/v1/access_token`
//! and the `oauth.reddit.com` read endpoints. Credentials come from the
//! `REDDIT_CLIENT_ID`, `REDDIT_CLIENT_SECRET`, and `REDDIT_USER_AGENT`
//! environment variables.

use super::{RedditClient, ScrapedComment, ScrapedPost};
use crate::error::{Result, TranscripterError};
use async_trait::async_trait;
use std::sync::Mutex;
use std::time::{Duration, Instant};
use tracing::{debug, instrument, warn};

const TOKEN_URL: &str = "https://www.reddit.com/api/v1/access_token";
const API_BASE: &str = "https://oauth.reddit.com";

/// Request timeout for Reddit API calls.
const REQUEST_TIMEOUT_SECS: u64 = 30;

struct CachedToken {
    value: String,
    expires_at: Instant,
}

/// reqwest-based Reddit client with a cached app-only OAuth token.
pub struct HttpRedditClient {
    http: reqwest::Client,
    client_id: String,
    client_secret: String,
    user_agent: String,
    token: Mutex<Option<CachedToken>>,
}

impl HttpRedditClient {
    /// Build a client from environment credentials.
    pub fn from_env() -> Result<Self> {
        let client_id = std::env::var("REDDIT_CLIENT_ID")
            .map_err(|_| TranscripterError::Config("REDDIT_CLIENT_ID is not set".to_string()))?;
        let client_secret = std::env::var("REDDIT_CLIENT_SECRET").map_err(|_| {
            TranscripterError::Config("REDDIT_CLIENT_SECRET is not set".to_string())
        })?;
        let user_agent = std::env::var("REDDIT_USER_AGENT")
            .unwrap_or_else(|_| "transcripter/0.1".to_string());

        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()?;

        Ok(Self {
            http,
            client_id,
            client_secret,
            user_agent,
            token: Mutex::new(None),
        })
    }

    /// Get a valid access token, refreshing the cached one if expired.
    async fn access_token(&self) -> Result<String> {
        {
            let cached = self.token.lock().unwrap_or_else(|e| e.into_inner());
            if let Some(token) = cached.as_ref() {
                if token.expires_at > Instant::now() {
                    return Ok(token.value.clone());
                }
            }
        }

        debug!("Requesting new Reddit access token");
        let response = self
            .http
            .post(TOKEN_URL)
            .basic_auth(&self.client_id, Some(&self.client_secret))
            .header("User-Agent", &self.user_agent)
            .form(&[("grant_type", "client_credentials")])
            .send()
            .await?
            .error_for_status()
            .map_err(|e| TranscripterError::Reddit(format!("Token request failed: {e}")))?;

        let body: serde_json::Value = response.json().await?;
        let value = body["access_token"]
            .as_str()
            .ok_or_else(|| TranscripterError::Reddit("No access token in response".to_string()))?
            .to_string();
        let expires_in = body["expires_in"].as_u64().unwrap_or(3600);

        let mut cached = self.token.lock().unwrap_or_else(|e| e.into_inner());
        *cached = Some(CachedToken {
            value: value.clone(),
            // Refresh a minute early to avoid using a token at its deadline.
            expires_at: Instant::now() + Duration::from_secs(expires_in.saturating_sub(60)),
        });

        Ok(value)
    }

    async fn get_json(&self, path: &str) -> Result<serde_json::Value> {
        let token = self.access_token().await?;

        let response = self
            .http
            .get(format!("{API_BASE}{path}"))
            .bearer_auth(token)
            .header("User-Agent", &self.user_agent)
            .send()
            .await?
            .error_for_status()
            .map_err(|e| TranscripterError::Reddit(format!("Request failed: {e}")))?;

        Ok(response.json().await?)
    }
}

#[async_trait]
impl RedditClient for HttpRedditClient {
    #[instrument(skip(self))]
    async fn fetch_new_posts(&self, subreddit: &str, limit: usize) -> Result<Vec<ScrapedPost>> {
        let body = self
            .get_json(&format!("/r/{subreddit}/new?limit={limit}"))
            .await?;

        let posts = parse_post_listing(&body);
        debug!("Fetched {} posts from r/{}", posts.len(), subreddit);
        Ok(posts)
    }

    #[instrument(skip(self))]
    async fn fetch_top_comments(
        &self,
        subreddit: &str,
        post_id: &str,
        limit: usize,
    ) -> Result<Vec<ScrapedComment>> {
        let body = self
            .get_json(&format!(
                "/r/{subreddit}/comments/{post_id}?limit={limit}&depth=1&sort=top"
            ))
            .await?;

        Ok(parse_comment_listing(&body, limit))
    }
}

/// Parse a `/new` listing into posts. Entries missing an id are dropped
/// with a warning rather than failing the whole listing.
fn parse_post_listing(body: &serde_json::Value) -> Vec<ScrapedPost> {
    let children = body["data"]["children"].as_array();
    let mut posts = Vec::new();

    for child in children.into_iter().flatten() {
        let data = &child["data"];
        let Some(id) = data["id"].as_str() else {
            warn!("Skipping listing entry without an id");
            continue;
        };

        posts.push(ScrapedPost {
            id: id.to_string(),
            title: data["title"].as_str().unwrap_or("N/A").to_string(),
            selftext: data["selftext"].as_str().unwrap_or_default().to_string(),
            url: data["url"].as_str().unwrap_or_default().to_string(),
            created_utc: data["created_utc"].as_f64().map(|t| t as i64),
            key_points: None,
            comments: Vec::new(),
        });
    }

    posts
}

/// Parse the comment tree response (the second listing of the pair) into
/// top-level comments, capped at `limit`.
fn parse_comment_listing(body: &serde_json::Value, limit: usize) -> Vec<ScrapedComment> {
    let children = body
        .get(1)
        .map(|listing| &listing["data"]["children"])
        .and_then(|c| c.as_array());

    let mut comments = Vec::new();
    for child in children.into_iter().flatten() {
        if comments.len() >= limit {
            break;
        }
        // "more" placeholders carry kind != t1 and no body
        if child["kind"].as_str() != Some("t1") {
            continue;
        }
        let data = &child["data"];
        let Some(id) = data["id"].as_str() else {
            continue;
        };

        comments.push(ScrapedComment {
            id: id.to_string(),
            body: data["body"].as_str().unwrap_or_default().to_string(),
            author: data["author"].as_str().map(|s| s.to_string()),
            score: data["score"].as_i64().unwrap_or(0),
            created_utc: data["created_utc"].as_f64().map(|t| t as i64),
        });
    }

    comments
}
