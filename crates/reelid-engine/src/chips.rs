//! Refinement chip extraction.

use reelid_models::{Chip, ChipKind, FeedbackMap, FrameAnalysis};

use crate::keywords::{detect_era, detect_genres, significant_objects};

/// Chips for one frame: at most one era chip, then genres, then objects.
///
/// `selected` mirrors the feedback map. Values are unique.
pub fn extract_chips(analysis: &FrameAnalysis, feedback: &FeedbackMap) -> Vec<Chip> {
    let mut chips: Vec<Chip> = Vec::new();
    let mut push = |value: String, label: String, kind: ChipKind| {
        if chips.iter().any(|c| c.value == value) {
            return;
        }
        chips.push(Chip {
            selected: feedback.get(&value).copied().unwrap_or(false),
            value,
            label,
            kind,
        });
    };

    if let Some(era) = detect_era(analysis) {
        let label = format!("Era: {}", era.token);
        push(era.token, label, ChipKind::Decade);
    }
    for genre in detect_genres(analysis) {
        push(genre.to_string(), title_case(genre), ChipKind::Genre);
    }
    for object in significant_objects(analysis) {
        let label = title_case(&object);
        push(object, label, ChipKind::Object);
    }

    chips
}

/// Uppercase the first letter of every word, `sci-fi` becomes `Sci-Fi`.
fn title_case(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    let mut at_word_start = true;
    for c in value.chars() {
        if at_word_start {
            out.extend(c.to_uppercase());
        } else {
            out.push(c);
        }
        at_word_start = !c.is_alphanumeric();
    }
    out
}
