//! Query refinement
//!
//! The site's search is strict about what it matches, so a query is turned
//! into a short list of candidates, from most to least specific, that are
//! tried one after another until one returns results.

use regex::Regex;
use std::sync::LazyLock;

static SEASON_WORDS: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)Season \d+").unwrap());
static ORDINAL_SEASON: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\d+(?:st|nd|rd|th) Season").unwrap());

/// Normalized queries shorter than this fall back to the original
const MIN_QUERY_LEN: usize = 3;

/// Per-call search inputs
#[derive(Debug, Clone, Copy, Default)]
pub struct SearchContext<'a> {
    pub query: &'a str,
    /// Free text the user added on top of the media title
    pub user_query: Option<&'a str>,
    pub episode_number: Option<i32>,
    pub batch: bool,
}

impl<'a> SearchContext<'a> {
    pub fn new(query: &'a str) -> Self {
        Self {
            query,
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CandidateKind {
    /// First word plus user text and episode marker
    Refined,
    FirstWord,
    /// The whole normalized query
    FullQuery,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    pub query: String,
    pub kind: CandidateKind,
}

/// Drop "Season N" / "Nth Season" and collapse whitespace.
///
/// If that leaves fewer than three characters the original query is kept.
pub fn clean_query(query: &str) -> String {
    let cleaned = SEASON_WORDS.replace(query, "");
    let cleaned = ORDINAL_SEASON.replace(&cleaned, "");
    let cleaned = cleaned.split_whitespace().collect::<Vec<_>>().join(" ");

    if cleaned.chars().count() < MIN_QUERY_LEN {
        query.to_string()
    } else {
        cleaned
    }
}

/// " E07"-style marker body, only for single-episode requests
pub fn episode_marker(episode_number: Option<i32>, batch: bool) -> Option<String> {
    match episode_number {
        Some(ep) if !batch && ep > 0 => Some(format!("E{:02}", ep)),
        _ => None,
    }
}

/// First word + trimmed user text + episode marker
pub fn refined_query(first_word: &str, ctx: &SearchContext<'_>) -> String {
    let user = ctx.user_query.map(str::trim).filter(|u| !u.is_empty());
    let marker = episode_marker(ctx.episode_number, ctx.batch);

    [Some(first_word), user, marker.as_deref()]
        .into_iter()
        .flatten()
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Candidates in the order they should be tried, skipped ones already removed
pub fn candidates(ctx: &SearchContext<'_>) -> Vec<Candidate> {
    let cleaned = clean_query(ctx.query);
    let first_word = cleaned.split_whitespace().next().unwrap_or("").to_string();
    let refined = refined_query(&first_word, ctx);

    let producers: [(CandidateKind, Box<dyn Fn() -> Option<String> + '_>); 3] = [
        (
            CandidateKind::Refined,
            Box::new(|| (refined != first_word).then(|| refined.clone())),
        ),
        (
            CandidateKind::FirstWord,
            Box::new(|| (first_word.chars().count() >= MIN_QUERY_LEN).then(|| first_word.clone())),
        ),
        (
            CandidateKind::FullQuery,
            Box::new(|| (cleaned != first_word).then(|| cleaned.clone())),
        ),
    ];

    producers
        .iter()
        .filter_map(|(kind, produce)| {
            produce().map(|query| Candidate { query, kind: *kind })
        })
        .collect()
}
