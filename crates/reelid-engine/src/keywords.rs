//! Keyword, era and genre extraction, and search query building.

use std::sync::LazyLock;

use regex::Regex;

use reelid_models::{FeedbackMap, FrameAnalysis};

/// Appended to every query to keep results on the film catalog.
pub const SEARCH_SUFFIX: &str = "movie site:themoviedb.org";

/// Caption keywords used per query.
pub const MAX_KEYWORDS: usize = 8;

/// Genre vocabulary, used both for chips and for scoring.
pub const GENRES: [&str; 12] = [
    "action",
    "comedy",
    "drama",
    "horror",
    "sci-fi",
    "thriller",
    "romance",
    "adventure",
    "fantasy",
    "mystery",
    "crime",
    "animation",
];

/// Labels worth offering as object chips.
pub const SIGNIFICANT_OBJECTS: [&str; 8] = [
    "car",
    "gun",
    "explosion",
    "spaceship",
    "robot",
    "monster",
    "castle",
    "sword",
];

/// Minimum label confidence for an object chip.
pub const OBJECT_CONFIDENCE_THRESHOLD: f64 = 0.7;

const DECADES: [&str; 11] = [
    "1920s", "1930s", "1940s", "1950s", "1960s", "1970s", "1980s", "1990s", "2000s", "2010s",
    "2020s",
];

/// Captioning models refuse in a handful of stock phrasings; none of it is
/// useful search input.
const SKIP_PHRASES: [&str; 11] = [
    "i'm unable to identify",
    "unable to identify",
    "unable identify",
    "cannot identify",
    "can't identify",
    "i cannot",
    "specific movies",
    "specific movie",
    "recognize people",
    "however provide",
    "however give",
];

const STOP_WORDS: [&str; 34] = [
    "the", "a", "an", "and", "or", "but", "in", "on", "at", "to", "for", "of", "with", "is",
    "are", "was", "were", "been", "be", "this", "that", "from", "have", "has", "had", "will",
    "would", "could", "should", "images", "image", "frame", "scene", "provide",
];

const TRIM_CHARS: &[char] = &['.', ',', '!', '?', ';', ':', '\'', '"', '*'];

static YEAR_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b(?:19|20)\d{2}\b").unwrap());

/// Era years may be glued to other words in captions ("circa1985").
static ERA_YEAR_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?:19|20)\d{2}").unwrap());

/// Era found in a frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DetectedEra {
    /// Decade token such as `1980s`, also the chip value
    pub token: String,
    /// First year of the decade
    pub decade: i32,
}

impl DetectedEra {
    fn from_year(year: i32) -> Self {
        let decade = year - year.rem_euclid(10);
        Self {
            token: format!("{decade}s"),
            decade,
        }
    }
}

/// Scan caption and label names for a decade.
///
/// Literal decade tokens win over bare years. A bare year is normalized to
/// its decade, so `1985` yields `1980s`.
pub fn detect_era(analysis: &FrameAnalysis) -> Option<DetectedEra> {
    let text = analysis.searchable_text();

    if let Some(token) = DECADES.iter().find(|d| text.contains(*d)) {
        let decade = token.trim_end_matches('s').parse().ok()?;
        return Some(DetectedEra {
            token: (*token).to_string(),
            decade,
        });
    }

    ERA_YEAR_PATTERN
        .find(&text)
        .and_then(|m| m.as_str().parse().ok())
        .map(DetectedEra::from_year)
}

/// First four-digit year in `text` that falls in `range`.
pub(crate) fn first_year_in(text: &str, range: std::ops::RangeInclusive<i32>) -> Option<i32> {
    YEAR_PATTERN
        .find_iter(text)
        .filter_map(|m| m.as_str().parse().ok())
        .find(|year| range.contains(year))
}

/// Genres mentioned in caption or labels, in order of first mention.
pub fn detect_genres(analysis: &FrameAnalysis) -> Vec<&'static str> {
    let text = analysis.searchable_text();
    let mut found: Vec<(usize, &'static str)> = GENRES
        .iter()
        .filter_map(|genre| text.find(genre).map(|pos| (pos, *genre)))
        .collect();
    found.sort_by_key(|(pos, _)| *pos);
    found.into_iter().map(|(_, genre)| genre).collect()
}

/// Genres mentioned in free text, in vocabulary order.
pub(crate) fn genres_in(text: &str) -> impl Iterator<Item = &'static str> + '_ {
    GENRES.iter().copied().filter(move |genre| text.contains(genre))
}

/// Confident labels from the significant-object vocabulary, lowercased.
pub fn significant_objects(analysis: &FrameAnalysis) -> Vec<String> {
    let mut objects: Vec<String> = Vec::new();
    for label in &analysis.labels {
        let name = label.name.to_lowercase();
        if label.confidence > OBJECT_CONFIDENCE_THRESHOLD
            && SIGNIFICANT_OBJECTS.contains(&name.as_str())
            && !objects.contains(&name)
        {
            objects.push(name);
        }
    }
    objects
}

/// Search keywords from a caption, in caption order.
pub fn extract_keywords(caption: &str) -> Vec<String> {
    let mut text = caption.to_lowercase();
    for phrase in SKIP_PHRASES {
        text = text.replace(phrase, "");
    }

    text.split_whitespace()
        .map(|word| word.trim_matches(TRIM_CHARS))
        .filter(|word| word.chars().count() > 4 && !STOP_WORDS.contains(word))
        .map(str::to_string)
        .collect()
}

/// Build the web search query for one pass.
///
/// Parts in order: caption keywords, detected era, first genre, then every
/// selected feedback chip. Duplicates keep their first position.
pub fn build_search_query(analysis: &FrameAnalysis, feedback: &FeedbackMap) -> String {
    let mut parts: Vec<String> = extract_keywords(&analysis.caption)
        .into_iter()
        .take(MAX_KEYWORDS)
        .collect();

    if let Some(era) = detect_era(analysis) {
        parts.push(era.token);
    }
    if let Some(genre) = detect_genres(analysis).first() {
        parts.push((*genre).to_string());
    }
    parts.extend(
        feedback
            .iter()
            .filter(|(_, selected)| **selected)
            .map(|(chip, _)| chip.clone()),
    );

    let mut unique: Vec<String> = Vec::with_capacity(parts.len());
    for part in parts {
        if !unique.contains(&part) {
            unique.push(part);
        }
    }

    if unique.is_empty() {
        SEARCH_SUFFIX.to_string()
    } else {
        format!("{} {}", unique.join(" "), SEARCH_SUFFIX)
    }
}
