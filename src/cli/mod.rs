//! CLI module for Transcripter.

pub mod commands;
mod output;

pub use output::Output;

use clap::{Parser, Subcommand};

/// Transcripter - game-community intelligence backend
///
/// Transcribes YouTube videos, summarizes transcripts, and scrapes a
/// subreddit into a SQLite knowledge base.
#[derive(Parser, Debug)]
#[command(name = "transcripter")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Increase verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Path to configuration file
    #[arg(short, long, global = true)]
    pub config: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Initialize configuration and create the database schema
    Init,

    /// Start the HTTP API server
    Serve {
        /// Host to bind to
        #[arg(long, default_value = "127.0.0.1")]
        host: String,

        /// Port to bind to
        #[arg(short, long, default_value = "5000")]
        port: u16,
    },

    /// Transcribe a YouTube video and store the transcript
    Transcribe {
        /// YouTube video URL
        url: String,
    },

    /// Scrape the configured subreddit and persist topic-matched posts
    Scrape {
        /// Number of posts to target
        #[arg(long)]
        post_limit: Option<usize>,

        /// Top-level comments to fetch per post
        #[arg(long)]
        comment_limit: Option<usize>,
    },

    /// Summarize transcript text from a file (or stdin with '-')
    Summarize {
        /// Input file path, or '-' for stdin
        input: String,

        /// Extract grouped key points instead of a summary
        #[arg(long)]
        keypoints: bool,
    },

    /// Run key-point extraction over unprocessed scraped posts
    ProcessPosts {
        /// Maximum posts to process in this run
        #[arg(short, long, default_value = "10")]
        limit: usize,
    },
}
