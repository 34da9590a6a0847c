//! Relational schema for the content store.
//!
//! Nine tables covering scraped Reddit content, video transcripts, external
//! articles, the topic vocabulary with its many-to-many associations, and
//! game build metadata. Creation is idempotent and never destructive: every
//! statement is `CREATE ... IF NOT EXISTS`, so startup can run it
//! unconditionally against an existing database.

use crate::error::Result;
use rusqlite::Connection;
use tracing::info;

/// Create all tables and indexes if they do not already exist.
pub fn initialize_all_tables(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS reddit_posts (
            id TEXT PRIMARY KEY,
            title TEXT NOT NULL,
            selftext TEXT,
            url TEXT UNIQUE,
            created_utc INTEGER,
            scraped_at TEXT DEFAULT CURRENT_TIMESTAMP,
            processed INTEGER NOT NULL DEFAULT 0,
            processed_at TEXT,
            key_points TEXT
        );

        CREATE TABLE IF NOT EXISTS reddit_comments (
            id TEXT PRIMARY KEY,
            post_id TEXT NOT NULL,
            body TEXT,
            author TEXT,
            score INTEGER,
            created_utc INTEGER,
            FOREIGN KEY(post_id) REFERENCES reddit_posts(id)
        );

        CREATE INDEX IF NOT EXISTS idx_reddit_comments_post_id ON reddit_comments(post_id);

        CREATE TABLE IF NOT EXISTS transcripts (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            video_url TEXT UNIQUE NOT NULL,
            video_title TEXT,
            channel_name TEXT,
            transcript_text TEXT NOT NULL,
            created_at TEXT DEFAULT CURRENT_TIMESTAMP,
            processed_at TEXT,
            key_points TEXT
        );

        CREATE TABLE IF NOT EXISTS external_articles (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            source TEXT NOT NULL,
            url TEXT UNIQUE NOT NULL,
            title TEXT,
            content TEXT NOT NULL,
            scraped_at TEXT DEFAULT CURRENT_TIMESTAMP,
            key_points TEXT
        );

        CREATE TABLE IF NOT EXISTS topics (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT UNIQUE NOT NULL,
            created_at TEXT DEFAULT CURRENT_TIMESTAMP
        );

        CREATE TABLE IF NOT EXISTS topic_associations (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            topic_id INTEGER NOT NULL,
            source_type TEXT NOT NULL CHECK(source_type IN ('reddit_post', 'transcript', 'external_article')),
            source_id TEXT NOT NULL,
            FOREIGN KEY(topic_id) REFERENCES topics(id)
        );

        CREATE TABLE IF NOT EXISTS builds (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL,
            description TEXT,
            build_type TEXT CHECK(build_type IN ('pvp', 'pve', 'hybrid')),
            created_at TEXT DEFAULT CURRENT_TIMESTAMP
        );

        CREATE TABLE IF NOT EXISTS build_equipment (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            build_id INTEGER NOT NULL,
            slot TEXT NOT NULL,
            item_name TEXT NOT NULL,
            FOREIGN KEY(build_id) REFERENCES builds(id)
        );

        CREATE TABLE IF NOT EXISTS build_skills (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            build_id INTEGER NOT NULL,
            skill_name TEXT NOT NULL,
            rotation_order INTEGER,
            FOREIGN KEY(build_id) REFERENCES builds(id)
        );

        CREATE TABLE IF NOT EXISTS build_traits (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            build_id INTEGER NOT NULL,
            trait_name TEXT NOT NULL,
            points_allocated INTEGER NOT NULL,
            FOREIGN KEY(build_id) REFERENCES builds(id)
        );
        "#,
    )?;

    info!("All database tables initialized");
    Ok(())
}
