//! SQLite content store.
//!
//! One operation per entity kind, all upserts keyed on the entity's natural
//! unique key: insert if absent, on conflict overwrite only the mutable
//! fields, leaving the original creation timestamp and foreign keys from the
//! first insert untouched.
//!
//! Every operation opens its own short-lived connection; RAII closes it on
//! every exit path, so no connection outlives the call that made it. Batch
//! saves share one connection and one transaction across the batch.

pub mod schema;

use crate::error::{Result, TranscripterError};
use crate::reddit::{ScrapedComment, ScrapedPost};
use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::{debug, info, instrument, warn};

/// Kind of content a topic association points at. Values match the
/// `topic_associations.source_type` CHECK constraint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceType {
    RedditPost,
    Transcript,
    ExternalArticle,
}

impl SourceType {
    pub fn as_str(&self) -> &'static str {
        match self {
            SourceType::RedditPost => "reddit_post",
            SourceType::Transcript => "transcript",
            SourceType::ExternalArticle => "external_article",
        }
    }
}

impl FromStr for SourceType {
    type Err = TranscripterError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "reddit_post" => Ok(SourceType::RedditPost),
            "transcript" => Ok(SourceType::Transcript),
            "external_article" => Ok(SourceType::ExternalArticle),
            other => Err(TranscripterError::InvalidInput(format!(
                "Unknown source type: {other}"
            ))),
        }
    }
}

/// Build archetype. Values match the `builds.build_type` CHECK constraint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuildType {
    Pvp,
    Pve,
    Hybrid,
}

impl BuildType {
    pub fn as_str(&self) -> &'static str {
        match self {
            BuildType::Pvp => "pvp",
            BuildType::Pve => "pve",
            BuildType::Hybrid => "hybrid",
        }
    }
}

/// Key-points payload accepted by [`Store::mark_post_processed`]: either a
/// pre-serialized string or a structured value serialized before storage.
#[derive(Debug, Clone)]
pub enum KeyPointsPayload {
    Text(String),
    Structured(serde_json::Value),
}

impl KeyPointsPayload {
    fn into_storage(self) -> Result<String> {
        match self {
            KeyPointsPayload::Text(s) => Ok(s),
            KeyPointsPayload::Structured(v) => Ok(serde_json::to_string(&v)?),
        }
    }
}

/// An external article to persist.
#[derive(Debug, Clone)]
pub struct NewArticle {
    pub source: String,
    pub url: String,
    pub title: Option<String>,
    pub content: String,
}

/// A post awaiting key-point processing.
#[derive(Debug, Clone)]
pub struct UnprocessedPost {
    pub id: String,
    pub title: String,
    pub selftext: String,
}

/// Handle to the SQLite content store.
///
/// Cheap to clone; each operation opens its own connection against the
/// configured path.
#[derive(Debug, Clone)]
pub struct Store {
    path: PathBuf,
}

impl Store {
    /// Open the store, creating parent directories and initializing the
    /// schema if needed.
    #[instrument(skip_all)]
    pub fn new(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let store = Self {
            path: path.to_path_buf(),
        };

        let conn = store.connect()?;
        schema::initialize_all_tables(&conn)?;

        info!("Opened content store at {:?}", path);
        Ok(store)
    }

    fn connect(&self) -> Result<Connection> {
        let conn = Connection::open(&self.path)?;
        conn.execute_batch("PRAGMA journal_mode=WAL;")?;
        Ok(conn)
    }

    /// Save a batch of posts and their comments in a single transaction.
    ///
    /// Each post is upserted on `id`: title, selftext, url, key_points, and
    /// scraped_at are refreshed; `created_utc` and the processed marker are
    /// never touched on conflict. A failure on one post is logged and
    /// skipped, never fatal to the batch.
    ///
    /// Returns (posts affected, comments affected).
    #[instrument(skip(self, posts), fields(count = posts.len()))]
    pub fn save_post_batch(&self, posts: &[ScrapedPost]) -> Result<(usize, usize)> {
        if posts.is_empty() {
            debug!("No posts provided to save");
            return Ok((0, 0));
        }

        let mut conn = self.connect()?;
        let tx = conn.transaction()?;

        let mut posts_affected = 0;
        let mut comments_affected = 0;

        for post in posts {
            if post.id.is_empty() {
                warn!("Skipping post with missing id: {:.30}", post.title);
                continue;
            }

            let scraped_at = Utc::now().to_rfc3339();
            let result = tx.execute(
                r#"
                INSERT INTO reddit_posts (id, title, selftext, url, created_utc, scraped_at, processed, key_points)
                VALUES (?1, ?2, ?3, ?4, ?5, ?6, 0, ?7)
                ON CONFLICT(id) DO UPDATE SET
                    title = excluded.title,
                    selftext = excluded.selftext,
                    url = excluded.url,
                    key_points = excluded.key_points,
                    scraped_at = excluded.scraped_at
                "#,
                params![
                    post.id,
                    post.title,
                    post.selftext,
                    post.url,
                    post.created_utc,
                    scraped_at,
                    post.key_points,
                ],
            );

            match result {
                Ok(n) => {
                    if n > 0 {
                        posts_affected += 1;
                    }
                    comments_affected += save_comments(&tx, &post.comments, &post.id);
                }
                Err(e) => {
                    warn!("Failed to save post {}: {}", post.id, e);
                }
            }
        }

        tx.commit()?;
        info!(
            "Saved or updated {} posts and {} comments",
            posts_affected, comments_affected
        );
        Ok((posts_affected, comments_affected))
    }

    /// Upsert a transcript keyed on its video URL and return the row id.
    ///
    /// `created_at` advances only when the transcript text actually changed;
    /// re-saving identical content leaves it alone.
    #[instrument(skip(self, transcript_text))]
    pub fn save_transcript(
        &self,
        video_url: &str,
        transcript_text: &str,
        video_title: Option<&str>,
        channel_name: Option<&str>,
    ) -> Result<i64> {
        let conn = self.connect()?;

        conn.execute(
            r#"
            INSERT INTO transcripts (video_url, transcript_text, video_title, channel_name)
            VALUES (?1, ?2, ?3, ?4)
            ON CONFLICT(video_url) DO UPDATE SET
                transcript_text = excluded.transcript_text,
                video_title = excluded.video_title,
                channel_name = excluded.channel_name,
                created_at = CASE
                    WHEN excluded.transcript_text != transcripts.transcript_text THEN CURRENT_TIMESTAMP
                    ELSE transcripts.created_at
                END
            "#,
            params![video_url, transcript_text, video_title, channel_name],
        )?;

        let id: i64 = conn.query_row(
            "SELECT id FROM transcripts WHERE video_url = ?1",
            params![video_url],
            |row| row.get(0),
        )?;

        debug!("Saved transcript {} for {}", id, video_url);
        Ok(id)
    }

    /// Upsert an external article keyed on its URL and return the row id.
    /// source, title, content, and scraped_at are refreshed on conflict.
    #[instrument(skip(self, article), fields(url = %article.url))]
    pub fn save_external_article(&self, article: &NewArticle) -> Result<i64> {
        let conn = self.connect()?;

        conn.execute(
            r#"
            INSERT INTO external_articles (url, source, title, content)
            VALUES (?1, ?2, ?3, ?4)
            ON CONFLICT(url) DO UPDATE SET
                source = excluded.source,
                title = excluded.title,
                content = excluded.content,
                scraped_at = CURRENT_TIMESTAMP
            "#,
            params![article.url, article.source, article.title, article.content],
        )?;

        let id: i64 = conn.query_row(
            "SELECT id FROM external_articles WHERE url = ?1",
            params![article.url],
            |row| row.get(0),
        )?;

        Ok(id)
    }

    /// Save a topic if it doesn't exist and return its id.
    #[instrument(skip(self))]
    pub fn save_topic(&self, name: &str) -> Result<i64> {
        let conn = self.connect()?;

        conn.execute(
            "INSERT INTO topics (name) VALUES (?1) ON CONFLICT(name) DO NOTHING",
            params![name],
        )?;

        let id: i64 = conn.query_row(
            "SELECT id FROM topics WHERE name = ?1",
            params![name],
            |row| row.get(0),
        )?;

        Ok(id)
    }

    /// Associate a topic with a source item, returning the existing or new
    /// association id.
    ///
    /// Idempotent via a check-then-insert: an existing row for the
    /// (topic, source_type, source_id) triple is returned as-is. The check
    /// and insert are not atomic against concurrent callers, so a race can
    /// produce a duplicate row; single-threaded callers are unaffected.
    #[instrument(skip(self))]
    pub fn associate_topic_to_source(
        &self,
        topic_id: i64,
        source_type: SourceType,
        source_id: &str,
    ) -> Result<i64> {
        let conn = self.connect()?;

        let existing: Option<i64> = conn
            .query_row(
                r#"
                SELECT id FROM topic_associations
                WHERE topic_id = ?1 AND source_type = ?2 AND source_id = ?3
                "#,
                params![topic_id, source_type.as_str(), source_id],
                |row| row.get(0),
            )
            .optional()?;

        if let Some(id) = existing {
            debug!(
                "Association already exists for topic {} on {} {}",
                topic_id,
                source_type.as_str(),
                source_id
            );
            return Ok(id);
        }

        conn.execute(
            r#"
            INSERT INTO topic_associations (topic_id, source_type, source_id)
            VALUES (?1, ?2, ?3)
            "#,
            params![topic_id, source_type.as_str(), source_id],
        )?;

        Ok(conn.last_insert_rowid())
    }

    /// Return up to `limit` posts whose processed marker is unset, oldest
    /// scrape first (FIFO processing order).
    #[instrument(skip(self))]
    pub fn unprocessed_posts(&self, limit: usize) -> Result<Vec<UnprocessedPost>> {
        let conn = self.connect()?;

        let mut stmt = conn.prepare(
            r#"
            SELECT id, title, selftext FROM reddit_posts
            WHERE processed_at IS NULL
            ORDER BY scraped_at ASC
            LIMIT ?1
            "#,
        )?;

        let posts = stmt.query_map(params![limit], |row| {
            Ok(UnprocessedPost {
                id: row.get(0)?,
                title: row.get(1)?,
                selftext: row.get::<_, Option<String>>(2)?.unwrap_or_default(),
            })
        })?;

        let result: Vec<UnprocessedPost> = posts.filter_map(|p| p.ok()).collect();
        Ok(result)
    }

    /// Set the processed marker on a post and persist its key-points
    /// payload, serializing structured values before storage.
    #[instrument(skip(self, key_points))]
    pub fn mark_post_processed(&self, post_id: &str, key_points: KeyPointsPayload) -> Result<()> {
        let conn = self.connect()?;
        let payload = key_points.into_storage()?;

        conn.execute(
            r#"
            UPDATE reddit_posts
            SET processed = 1, processed_at = CURRENT_TIMESTAMP, key_points = ?1
            WHERE id = ?2
            "#,
            params![payload, post_id],
        )?;

        Ok(())
    }

    /// Save a new build and return its id.
    #[instrument(skip(self, description))]
    pub fn save_build(
        &self,
        name: &str,
        description: Option<&str>,
        build_type: BuildType,
    ) -> Result<i64> {
        let conn = self.connect()?;

        conn.execute(
            "INSERT INTO builds (name, description, build_type) VALUES (?1, ?2, ?3)",
            params![name, description, build_type.as_str()],
        )?;

        Ok(conn.last_insert_rowid())
    }

    /// Save an equipment row for a build and return its id.
    pub fn save_build_equipment(&self, build_id: i64, slot: &str, item_name: &str) -> Result<i64> {
        let conn = self.connect()?;

        conn.execute(
            "INSERT INTO build_equipment (build_id, slot, item_name) VALUES (?1, ?2, ?3)",
            params![build_id, slot, item_name],
        )?;

        Ok(conn.last_insert_rowid())
    }

    /// Save a skill row for a build and return its id.
    pub fn save_build_skill(
        &self,
        build_id: i64,
        skill_name: &str,
        rotation_order: Option<i64>,
    ) -> Result<i64> {
        let conn = self.connect()?;

        conn.execute(
            "INSERT INTO build_skills (build_id, skill_name, rotation_order) VALUES (?1, ?2, ?3)",
            params![build_id, skill_name, rotation_order],
        )?;

        Ok(conn.last_insert_rowid())
    }

    /// Save a trait row for a build and return its id.
    pub fn save_build_trait(
        &self,
        build_id: i64,
        trait_name: &str,
        points_allocated: i64,
    ) -> Result<i64> {
        let conn = self.connect()?;

        conn.execute(
            "INSERT INTO build_traits (build_id, trait_name, points_allocated) VALUES (?1, ?2, ?3)",
            params![build_id, trait_name, points_allocated],
        )?;

        Ok(conn.last_insert_rowid())
    }
}

/// Upsert comment rows for a post on the given connection.
///
/// Comments are upserted on `id`: body, author, and score are refreshed;
/// `post_id` and `created_utc` are never touched on conflict. Comments
/// missing an identifier are skipped with a warning, and a failure on one
/// comment never aborts the rest. Returns the number of rows affected.
/// Commit is the caller's responsibility.
pub fn save_comments(
    conn: &Connection,
    comments: &[ScrapedComment],
    parent_post_id: &str,
) -> usize {
    let mut affected = 0;

    for comment in comments {
        if comment.id.is_empty() {
            warn!("Skipping comment with missing id for post {}", parent_post_id);
            continue;
        }

        let result = conn.execute(
            r#"
            INSERT INTO reddit_comments (id, post_id, body, author, score, created_utc)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            ON CONFLICT(id) DO UPDATE SET
                body = excluded.body,
                author = excluded.author,
                score = excluded.score
            "#,
            params![
                comment.id,
                parent_post_id,
                comment.body,
                comment.author,
                comment.score,
                comment.created_utc,
            ],
        );

        match result {
            Ok(n) if n > 0 => affected += 1,
            Ok(_) => {}
            Err(e) => {
                warn!(
                    "Failed to save comment {} for post {}: {}",
                    comment.id, parent_post_id, e
                );
            }
        }
    }

    affected
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reddit::{ScrapedComment, ScrapedPost};
    use tempfile::TempDir;

    fn test_store() -> (TempDir, Store) {
        let dir = tempfile::tempdir().unwrap();
        let store = Store::new(&dir.path().join("test.db")).unwrap();
        (dir, store)
    }

    fn sample_post(id: &str) -> ScrapedPost {
        ScrapedPost {
            id: id.to_string(),
            title: "New PvP build guide".to_string(),
            selftext: "full writeup inside".to_string(),
            url: format!("https://reddit.com/r/test/{id}"),
            created_utc: Some(1_700_000_000),
            key_points: Some("build,guide,pvp".to_string()),
            comments: vec![ScrapedComment {
                id: format!("t1_{id}"),
                body: "great combat section".to_string(),
                author: Some("tester".to_string()),
                score: 5,
                created_utc: Some(1_700_000_100),
            }],
        }
    }

    #[test]
    fn test_schema_init_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("test.db");
        Store::new(&path).unwrap();
        // Reopening runs table creation again against the existing file.
        Store::new(&path).unwrap();
    }

    #[test]
    fn test_post_upsert_is_idempotent() {
        let (_dir, store) = test_store();

        let post = sample_post("t3_one");
        let (p1, c1) = store.save_post_batch(std::slice::from_ref(&post)).unwrap();
        assert_eq!((p1, c1), (1, 1));

        let (p2, c2) = store.save_post_batch(std::slice::from_ref(&post)).unwrap();
        assert_eq!((p2, c2), (1, 1));

        let conn = store.connect().unwrap();
        let count: i64 = conn
            .query_row("SELECT COUNT(*) FROM reddit_posts", [], |r| r.get(0))
            .unwrap();
        assert_eq!(count, 1);
        let comment_count: i64 = conn
            .query_row("SELECT COUNT(*) FROM reddit_comments", [], |r| r.get(0))
            .unwrap();
        assert_eq!(comment_count, 1);
    }

    #[test]
    fn test_created_utc_is_immutable_on_rescrape() {
        let (_dir, store) = test_store();

        let mut post = sample_post("t3_two");
        store.save_post_batch(std::slice::from_ref(&post)).unwrap();

        post.created_utc = Some(1_800_000_000);
        post.title = "edited title".to_string();
        store.save_post_batch(std::slice::from_ref(&post)).unwrap();

        let conn = store.connect().unwrap();
        let (title, created_utc): (String, i64) = conn
            .query_row(
                "SELECT title, created_utc FROM reddit_posts WHERE id = 't3_two'",
                [],
                |r| Ok((r.get(0)?, r.get(1)?)),
            )
            .unwrap();
        assert_eq!(title, "edited title");
        assert_eq!(created_utc, 1_700_000_000);
    }

    #[test]
    fn test_scraped_at_advances_on_rescrape() {
        let (_dir, store) = test_store();

        let post = sample_post("t3_three");
        store.save_post_batch(std::slice::from_ref(&post)).unwrap();

        let conn = store.connect().unwrap();
        let first: String = conn
            .query_row(
                "SELECT scraped_at FROM reddit_posts WHERE id = 't3_three'",
                [],
                |r| r.get(0),
            )
            .unwrap();
        drop(conn);

        store.save_post_batch(std::slice::from_ref(&post)).unwrap();

        let conn = store.connect().unwrap();
        let second: String = conn
            .query_row(
                "SELECT scraped_at FROM reddit_posts WHERE id = 't3_three'",
                [],
                |r| r.get(0),
            )
            .unwrap();
        assert!(second >= first);
    }

    #[test]
    fn test_comment_missing_id_is_skipped() {
        let (_dir, store) = test_store();

        let mut post = sample_post("t3_four");
        post.comments.push(ScrapedComment {
            id: String::new(),
            body: "no id".to_string(),
            author: None,
            score: 0,
            created_utc: None,
        });

        let (_, comments) = store.save_post_batch(std::slice::from_ref(&post)).unwrap();
        assert_eq!(comments, 1);
    }

    #[test]
    fn test_transcript_upsert_keeps_created_at_for_same_text() {
        let (_dir, store) = test_store();

        let id1 = store
            .save_transcript("https://youtu.be/abc", "hello world", Some("Video"), None)
            .unwrap();
        let conn = store.connect().unwrap();
        let created: String = conn
            .query_row("SELECT created_at FROM transcripts WHERE id = ?1", [id1], |r| {
                r.get(0)
            })
            .unwrap();
        drop(conn);

        let id2 = store
            .save_transcript("https://youtu.be/abc", "hello world", Some("Video"), None)
            .unwrap();
        assert_eq!(id1, id2);

        let conn = store.connect().unwrap();
        let created_again: String = conn
            .query_row("SELECT created_at FROM transcripts WHERE id = ?1", [id2], |r| {
                r.get(0)
            })
            .unwrap();
        assert_eq!(created, created_again);
    }

    #[test]
    fn test_external_article_upsert_refreshes_content() {
        let (_dir, store) = test_store();

        let mut article = NewArticle {
            source: "wiki".to_string(),
            url: "https://wiki.example/page".to_string(),
            title: Some("Page".to_string()),
            content: "v1".to_string(),
        };
        let id1 = store.save_external_article(&article).unwrap();

        article.content = "v2".to_string();
        let id2 = store.save_external_article(&article).unwrap();
        assert_eq!(id1, id2);

        let conn = store.connect().unwrap();
        let content: String = conn
            .query_row(
                "SELECT content FROM external_articles WHERE id = ?1",
                [id1],
                |r| r.get(0),
            )
            .unwrap();
        assert_eq!(content, "v2");
    }

    #[test]
    fn test_topic_association_is_idempotent() {
        let (_dir, store) = test_store();

        let topic_id = store.save_topic("combat").unwrap();
        let a1 = store
            .associate_topic_to_source(topic_id, SourceType::RedditPost, "t3_five")
            .unwrap();
        let a2 = store
            .associate_topic_to_source(topic_id, SourceType::RedditPost, "t3_five")
            .unwrap();
        assert_eq!(a1, a2);

        // Same topic, different source kind: a distinct association.
        let a3 = store
            .associate_topic_to_source(topic_id, SourceType::Transcript, "t3_five")
            .unwrap();
        assert_ne!(a1, a3);
    }

    #[test]
    fn test_save_topic_returns_same_id() {
        let (_dir, store) = test_store();
        let id1 = store.save_topic("economy").unwrap();
        let id2 = store.save_topic("economy").unwrap();
        assert_eq!(id1, id2);
    }

    #[test]
    fn test_unprocessed_fifo_and_mark_processed() {
        let (_dir, store) = test_store();

        store
            .save_post_batch(&[sample_post("t3_a")])
            .unwrap();
        std::thread::sleep(std::time::Duration::from_millis(5));
        store
            .save_post_batch(&[sample_post("t3_b")])
            .unwrap();

        let pending = store.unprocessed_posts(10).unwrap();
        assert_eq!(pending.len(), 2);
        assert_eq!(pending[0].id, "t3_a");
        assert_eq!(pending[1].id, "t3_b");

        store
            .mark_post_processed(
                "t3_a",
                KeyPointsPayload::Structured(serde_json::json!({"combat": ["dodge timing"]})),
            )
            .unwrap();

        let pending = store.unprocessed_posts(10).unwrap();
        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].id, "t3_b");

        let conn = store.connect().unwrap();
        let key_points: String = conn
            .query_row(
                "SELECT key_points FROM reddit_posts WHERE id = 't3_a'",
                [],
                |r| r.get(0),
            )
            .unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&key_points).unwrap();
        assert_eq!(parsed["combat"][0], "dodge timing");
    }

    #[test]
    fn test_unprocessed_respects_limit() {
        let (_dir, store) = test_store();
        for i in 0..5 {
            store.save_post_batch(&[sample_post(&format!("t3_{i}"))]).unwrap();
        }
        assert_eq!(store.unprocessed_posts(3).unwrap().len(), 3);
    }

    #[test]
    fn test_build_with_children() {
        let (_dir, store) = test_store();

        let build_id = store
            .save_build("Berserker bleed", Some("bleed-stack opener"), BuildType::Pvp)
            .unwrap();
        let eq = store
            .save_build_equipment(build_id, "weapon", "Greatsword of Ruin")
            .unwrap();
        let skill = store
            .save_build_skill(build_id, "Rending Slash", Some(1))
            .unwrap();
        let tr = store.save_build_trait(build_id, "Bloodlust", 5).unwrap();
        assert!(eq > 0 && skill > 0 && tr > 0);

        let conn = store.connect().unwrap();
        let (slot, item): (String, String) = conn
            .query_row(
                "SELECT slot, item_name FROM build_equipment WHERE build_id = ?1",
                [build_id],
                |r| Ok((r.get(0)?, r.get(1)?)),
            )
            .unwrap();
        assert_eq!(slot, "weapon");
        assert_eq!(item, "Greatsword of Ruin");
    }

    #[test]
    fn test_source_type_roundtrip() {
        for st in [
            SourceType::RedditPost,
            SourceType::Transcript,
            SourceType::ExternalArticle,
        ] {
            assert_eq!(st.as_str().parse::<SourceType>().unwrap(), st);
        }
        assert!("article".parse::<SourceType>().is_err());
    }
}
