//! Candidate scoring.
//!
//! A candidate's score is a weighted sum of independent signals, each of
//! which also credits a match reason to the candidate:
//!
//! | Signal | Weight | Reasons |
//! |---|---|---|
//! | title/snippet overlap with the caption | 0.5 | none |
//! | 1 to 5 faces in the frame | 0.3 | `actor` |
//! | candidate year within a decade of the detected era | 0.1 | `decade`, era token |
//! | genre named in both snippet and frame | 0.1 | `genre`, each shared genre |
//!
//! Every selected feedback chip equal to a credited reason adds
//! [`FEEDBACK_BONUS`]. The result is clamped to 1.0.

use reelid_models::{FeedbackMap, FilmCandidate, FrameAnalysis};

use crate::keywords::{detect_era, genres_in};

pub const TEXT_WEIGHT: f64 = 0.5;
pub const ACTOR_WEIGHT: f64 = 0.3;
pub const DECADE_WEIGHT: f64 = 0.1;
pub const GENRE_WEIGHT: f64 = 0.1;
pub const FEEDBACK_BONUS: f64 = 0.2;

pub const REASON_ACTOR: &str = "actor";
pub const REASON_DECADE: &str = "decade";
pub const REASON_GENRE: &str = "genre";

const TITLE_WORD_CREDIT: f64 = 0.2;
const CAPTION_WORD_CREDIT: f64 = 0.1;
const MAX_ACTOR_FACES: usize = 5;
const TRIM_CHARS: &[char] = &['.', ',', '!', '?', ';', ':', '\'', '"', '*', '(', ')'];

/// Outcome of scoring one candidate.
#[derive(Debug, Clone, PartialEq)]
pub struct CandidateScore {
    pub score: f64,
    pub matched_on: Vec<String>,
}

/// Score a candidate against a frame and the session's feedback.
///
/// Reasons already on `candidate.matched_on` are ignored; scoring always
/// starts fresh.
pub fn evaluate(
    candidate: &FilmCandidate,
    analysis: &FrameAnalysis,
    feedback: &FeedbackMap,
) -> CandidateScore {
    let mut score = TEXT_WEIGHT * text_similarity(&candidate.title, &candidate.snippet, &analysis.caption);
    let mut matched_on: Vec<String> = Vec::new();

    // Face count stands in for actor recognition until real identity matching exists.
    if actor_match(analysis) {
        score += ACTOR_WEIGHT;
        matched_on.push(REASON_ACTOR.to_string());
    }

    if let Some(era) = detect_era(analysis) {
        if candidate.year > 0 && decade_of(candidate.year).abs_diff(era.decade) <= 10 {
            score += DECADE_WEIGHT;
            matched_on.push(REASON_DECADE.to_string());
            matched_on.push(era.token);
        }
    }

    let frame_text = analysis.searchable_text();
    let snippet = candidate.snippet.to_lowercase();
    let shared: Vec<&str> = genres_in(&snippet)
        .filter(|genre| frame_text.contains(genre))
        .collect();
    if !shared.is_empty() {
        score += GENRE_WEIGHT;
        matched_on.push(REASON_GENRE.to_string());
        matched_on.extend(shared.into_iter().map(str::to_string));
    }

    for (chip, selected) in feedback {
        if *selected && matched_on.contains(chip) {
            score += FEEDBACK_BONUS;
        }
    }

    CandidateScore {
        score: score.min(1.0),
        matched_on,
    }
}

/// Score only.
pub fn score(candidate: &FilmCandidate, analysis: &FrameAnalysis, feedback: &FeedbackMap) -> f64 {
    evaluate(candidate, analysis, feedback).score
}

/// Unweighted text overlap in [0, 1].
///
/// Title words longer than 3 characters found in caption or snippet earn
/// 0.2 each. Caption words longer than 5 characters found in the snippet
/// earn 0.1 each.
pub fn text_similarity(title: &str, snippet: &str, caption: &str) -> f64 {
    let title = title.to_lowercase();
    let snippet = snippet.to_lowercase();
    let caption = caption.to_lowercase();

    let mut similarity = 0.0;

    for word in words(&title) {
        if word.chars().count() > 3 && (caption.contains(word) || snippet.contains(word)) {
            similarity += TITLE_WORD_CREDIT;
        }
    }
    for word in words(&caption) {
        if word.chars().count() > 5 && snippet.contains(word) {
            similarity += CAPTION_WORD_CREDIT;
        }
    }

    f64::min(similarity, 1.0)
}

fn words(text: &str) -> impl Iterator<Item = &str> {
    text.split_whitespace()
        .map(|w| w.trim_matches(TRIM_CHARS))
        .filter(|w| !w.is_empty())
}

fn actor_match(analysis: &FrameAnalysis) -> bool {
    (1..=MAX_ACTOR_FACES).contains(&analysis.face_count())
}

fn decade_of(year: i32) -> i32 {
    year - year.rem_euclid(10)
}

#[cfg(test)]
mod tests {
    use super::*;
    use reelid_models::{BoundingBox, FaceDetection, Label};

    fn candidate(title: &str, year: i32, snippet: &str) -> FilmCandidate {
        FilmCandidate {
            title: title.to_string(),
            year,
            catalog_id: "105".to_string(),
            score: 0.0,
            matched_on: Vec::new(),
            source: "google".to_string(),
            snippet: snippet.to_string(),
        }
    }

    fn face() -> FaceDetection {
        FaceDetection {
            bounding_box: BoundingBox { x: 0, y: 0, width: 10, height: 10 },
            confidence: 0.9,
        }
    }

    fn desert_analysis() -> FrameAnalysis {
        FrameAnalysis::with_caption("A spaceship flies over a desert city in 1985, genre sci-fi action")
    }

    #[test]
    fn test_reference_example() {
        let result = evaluate(
            &candidate("Back to the Future", 1985, "1985 sci-fi adventure comedy"),
            &desert_analysis(),
            &FeedbackMap::new(),
        );

        // 0.5 * 0.1 (sci-fi) + decade + genre
        assert!((result.score - 0.25).abs() < 1e-9, "score was {}", result.score);
        assert_eq!(result.matched_on, vec!["decade", "1980s", "genre", "sci-fi"]);
    }

    #[test]
    fn test_feedback_bonus_applies_to_credited_reason() {
        let analysis = FrameAnalysis::with_caption("an action scene on a highway");
        let with_action = candidate("Speed", 1994, "action thriller on a bus");
        let without_action = candidate("Amelie", 2001, "romantic comedy in paris");

        let mut feedback = FeedbackMap::new();
        let base_with = score(&with_action, &analysis, &feedback);
        let base_without = score(&without_action, &analysis, &feedback);

        feedback.insert("action".to_string(), true);
        assert!((score(&with_action, &analysis, &feedback) - (base_with + 0.2)).abs() < 1e-9);
        assert_eq!(score(&without_action, &analysis, &feedback), base_without);
    }

    #[test]
    fn test_deselected_feedback_has_no_effect() {
        let analysis = FrameAnalysis::with_caption("an action scene");
        let c = candidate("Speed", 1994, "action thriller");
        let mut feedback = FeedbackMap::new();
        feedback.insert("action".to_string(), false);
        assert_eq!(score(&c, &analysis, &feedback), score(&c, &analysis, &FeedbackMap::new()));
    }

    #[test]
    fn test_actor_heuristic_counts_faces() {
        let mut analysis = FrameAnalysis::with_caption("two people talking");
        let c = candidate("Heat", 1995, "");

        assert!(!evaluate(&c, &analysis, &FeedbackMap::new()).matched_on.contains(&"actor".to_string()));

        analysis.faces = vec![face(); 2];
        let result = evaluate(&c, &analysis, &FeedbackMap::new());
        assert!(result.matched_on.contains(&"actor".to_string()));
        assert!((result.score - ACTOR_WEIGHT).abs() < 1e-9);

        analysis.faces = vec![face(); 6];
        assert_eq!(score(&c, &analysis, &FeedbackMap::new()), 0.0);
    }

    #[test]
    fn test_decade_tolerance() {
        let analysis = FrameAnalysis::with_caption("a 1980s arcade");
        let feedback = FeedbackMap::new();
        assert!(evaluate(&candidate("X", 1979, ""), &analysis, &feedback).matched_on.contains(&"decade".to_string()));
        assert!(evaluate(&candidate("X", 1992, ""), &analysis, &feedback).matched_on.contains(&"decade".to_string()));
        assert!(evaluate(&candidate("X", 2001, ""), &analysis, &feedback).matched_on.is_empty());
        assert!(evaluate(&candidate("X", 0, ""), &analysis, &feedback).matched_on.is_empty());
    }

    #[test]
    fn test_score_is_clamped() {
        let analysis = FrameAnalysis {
            faces: vec![face()],
            labels: vec![Label::new("action", 0.9)],
            ..FrameAnalysis::with_caption(
                "future future future marty mcfly delorean hoverboard skateboard 1985 action comedy",
            )
        };
        let c = candidate(
            "Back Future Marty McFly Delorean Hoverboard",
            1985,
            "delorean hoverboard skateboard action comedy",
        );
        let mut feedback = FeedbackMap::new();
        for key in ["actor", "decade", "1980s", "genre", "action", "comedy"] {
            feedback.insert(key.to_string(), true);
        }

        assert_eq!(score(&c, &analysis, &feedback), 1.0);
    }

    #[test]
    fn test_text_similarity() {
        assert_eq!(text_similarity("Alien", "", "a dark spaceship"), 0.0);
        assert!((text_similarity("Alien", "", "an alien hatches") - 0.2).abs() < 1e-9);
        assert!((text_similarity("It", "desert planet", "a desert planet") - 0.2).abs() < 1e-9);
    }

    #[test]
    fn test_scoring_is_deterministic() {
        let c = candidate("Dune", 2021, "sci-fi desert epic");
        let analysis = desert_analysis();
        let feedback = FeedbackMap::new();
        assert_eq!(evaluate(&c, &analysis, &feedback), evaluate(&c, &analysis, &feedback));
    }
}
