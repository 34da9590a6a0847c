//! Keyword topic filter for scraped posts.
//!
//! Scans post titles, bodies, and comment bodies against a fixed vocabulary
//! of game topics. Matching is a naive case-insensitive substring scan, so a
//! keyword like "modes" also matches inside longer words. That imprecision
//! is accepted: recall matters more than precision for this filter, and the
//! downstream key-point extraction re-reads the full text anyway.

use crate::reddit::ScrapedPost;
use std::collections::BTreeSet;
use tracing::debug;

/// Fixed vocabulary of topics the community cares about. Lowercase.
pub const TOPIC_VOCABULARY: &[&str] = &[
    "gameplay", "combat", "economy", "skills", "quests", "modes", "features",
    "build", "guide", "pvp", "pve",
];

/// Compute the sorted set of vocabulary topics occurring in the given texts.
pub fn match_topics<'a, I>(texts: I) -> BTreeSet<&'static str>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut matched = BTreeSet::new();
    for text in texts {
        let lowered = text.to_lowercase();
        for topic in TOPIC_VOCABULARY {
            if lowered.contains(topic) {
                matched.insert(*topic);
            }
        }
    }
    matched
}

/// Compute the matched topics for a single post (title, selftext, and every
/// comment body).
pub fn match_post_topics(post: &ScrapedPost) -> BTreeSet<&'static str> {
    let texts = std::iter::once(post.title.as_str())
        .chain(std::iter::once(post.selftext.as_str()))
        .chain(post.comments.iter().map(|c| c.body.as_str()));
    match_topics(texts)
}

/// Filter posts by topic match.
///
/// Posts matching at least one vocabulary topic get their `key_points` set
/// to the sorted, comma-joined topic labels and are kept; the rest are
/// dropped. The label string is deterministic regardless of comment order.
pub fn filter_posts(posts: Vec<ScrapedPost>) -> Vec<ScrapedPost> {
    let total = posts.len();
    let filtered: Vec<ScrapedPost> = posts
        .into_iter()
        .filter_map(|mut post| {
            let matched = match_post_topics(&post);
            if matched.is_empty() {
                return None;
            }
            post.key_points = Some(join_topics(&matched));
            Some(post)
        })
        .collect();

    debug!("Topic filter kept {} of {} posts", filtered.len(), total);
    filtered
}

/// Join a topic set into the stored `key_points` representation.
pub fn join_topics(topics: &BTreeSet<&'static str>) -> String {
    topics.iter().copied().collect::<Vec<_>>().join(",")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reddit::{ScrapedComment, ScrapedPost};

    fn post(title: &str, selftext: &str, comments: &[&str]) -> ScrapedPost {
        ScrapedPost {
            id: "t3_abc".to_string(),
            title: title.to_string(),
            selftext: selftext.to_string(),
            url: "https://reddit.com/r/test/abc".to_string(),
            created_utc: Some(1_700_000_000),
            key_points: None,
            comments: comments
                .iter()
                .enumerate()
                .map(|(i, body)| ScrapedComment {
                    id: format!("t1_{i}"),
                    body: body.to_string(),
                    author: Some("tester".to_string()),
                    score: 1,
                    created_utc: Some(1_700_000_100),
                })
                .collect(),
        }
    }

    #[test]
    fn test_title_match_produces_sorted_key_points() {
        let posts = filter_posts(vec![post("New PvP build guide", "", &[])]);
        assert_eq!(posts.len(), 1);
        assert_eq!(posts[0].key_points.as_deref(), Some("build,guide,pvp"));
    }

    #[test]
    fn test_non_matching_post_is_dropped() {
        let posts = filter_posts(vec![post("Server maintenance tonight", "back at 9pm", &[])]);
        assert!(posts.is_empty());
    }

    #[test]
    fn test_comment_bodies_are_scanned() {
        let posts = filter_posts(vec![post(
            "Question",
            "",
            &["the economy is in shambles", "try a different build"],
        )]);
        assert_eq!(posts.len(), 1);
        assert_eq!(posts[0].key_points.as_deref(), Some("build,economy"));
    }

    #[test]
    fn test_matching_is_case_insensitive_substring() {
        // "skills" matches inside "SKILLSET"; accepted naive behavior.
        let matched = match_topics(["My SKILLSET is lacking"]);
        assert!(matched.contains("skills"));
    }

    #[test]
    fn test_comment_order_does_not_change_result() {
        let a = post("hm", "", &["combat is fun", "quests are long"]);
        let b = post("hm", "", &["quests are long", "combat is fun"]);
        assert_eq!(
            join_topics(&match_post_topics(&a)),
            join_topics(&match_post_topics(&b))
        );
    }

    #[test]
    fn test_filter_is_idempotent() {
        let once = filter_posts(vec![post("combat tips", "", &[])]);
        let twice = filter_posts(once.clone());
        assert_eq!(
            once[0].key_points, twice[0].key_points
        );
    }
}
