//! Search result post-processing and candidate ranking.

use reelid_models::{FeedbackMap, FilmCandidate, FrameAnalysis, SearchResult};
use tracing::debug;

use crate::keywords::first_year_in;
use crate::scorer;

/// Candidates kept per pass.
pub const MAX_CANDIDATES: usize = 5;

const CATALOG_PATH: &str = "themoviedb.org/movie/";

const TITLE_SUFFIXES: [&str; 5] = [
    " | TMDB",
    " | IMDb",
    " — The Movie Database (TMDB)",
    " — IMDb",
    " — Wikipedia",
];

/// Catalog id from a film page link, e.g. `105` from
/// `https://www.themoviedb.org/movie/105-back-to-the-future`.
pub fn extract_catalog_id(link: &str) -> Option<String> {
    let (_, rest) = link.split_once(CATALOG_PATH)?;
    let id: String = rest.chars().take_while(|c| c.is_ascii_digit()).collect();
    (!id.is_empty()).then_some(id)
}

/// Page title without the site name.
pub fn clean_title(title: &str) -> String {
    let mut cleaned = title.split(" - ").next().unwrap_or(title);
    for suffix in TITLE_SUFFIXES {
        if let Some(stripped) = cleaned.strip_suffix(suffix) {
            cleaned = stripped;
        }
    }
    cleaned.trim().to_string()
}

/// First year between 1900 and 2030 in title then snippet, or 0.
pub fn extract_year(title: &str, snippet: &str) -> i32 {
    first_year_in(&format!("{title} {snippet}"), 1900..=2030).unwrap_or(0)
}

/// Unscored candidate for a search result that links to a catalog page.
pub fn candidate_from_result(result: &SearchResult, source: &str) -> Option<FilmCandidate> {
    let catalog_id = extract_catalog_id(&result.link)?;
    Some(FilmCandidate {
        title: clean_title(&result.title),
        year: extract_year(&result.title, &result.snippet),
        catalog_id,
        score: 0.0,
        matched_on: Vec::new(),
        source: source.to_string(),
        snippet: result.snippet.clone(),
    })
}

/// Score search results and keep the best [`MAX_CANDIDATES`].
///
/// Results without a catalog id are skipped. Ties keep search order.
pub fn rank_candidates(
    results: &[SearchResult],
    analysis: &FrameAnalysis,
    feedback: &FeedbackMap,
    source: &str,
) -> Vec<FilmCandidate> {
    let mut candidates: Vec<FilmCandidate> = results
        .iter()
        .filter_map(|result| {
            let candidate = candidate_from_result(result, source);
            if candidate.is_none() {
                debug!(link = %result.link, "Skipping result without catalog id");
            }
            candidate
        })
        .map(|mut candidate| {
            let evaluated = scorer::evaluate(&candidate, analysis, feedback);
            candidate.score = evaluated.score;
            candidate.matched_on = evaluated.matched_on;
            candidate
        })
        .collect();

    candidates.sort_by(|a, b| b.score.total_cmp(&a.score));
    candidates.truncate(MAX_CANDIDATES);
    candidates
}
