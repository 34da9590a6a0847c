//! CLI command implementations.

mod init;
mod process;
mod scrape;
mod serve;
mod summarize;
mod transcribe;

pub use init::run_init;
pub use process::run_process_posts;
pub use scrape::run_scrape;
pub use serve::run_serve;
pub use summarize::run_summarize;
pub use transcribe::run_transcribe;
