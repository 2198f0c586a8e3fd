//! Film candidates and refinement chips.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A scored guess at the source film.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct FilmCandidate {
    /// Title with source-site suffixes removed
    pub title: String,
    /// Release year, 0 when undetermined
    pub year: i32,
    /// Film catalog id
    pub catalog_id: String,
    /// Score in [0, 1]
    pub score: f64,
    /// Match reasons, category tags followed by the matched values
    pub matched_on: Vec<String>,
    /// Where the candidate came from
    pub source: String,
    /// Originating search snippet
    pub snippet: String,
}

impl FilmCandidate {
    /// Whether a match reason was credited to this candidate.
    pub fn matched(&self, reason: &str) -> bool {
        self.matched_on.iter().any(|m| m == reason)
    }
}

/// Chip category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum ChipKind {
    Decade,
    Genre,
    Object,
    Actor,
}

impl ChipKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChipKind::Decade => "decade",
            ChipKind::Genre => "genre",
            ChipKind::Object => "object",
            ChipKind::Actor => "actor",
        }
    }
}

impl fmt::Display for ChipKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// User-toggleable refinement tag.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct Chip {
    /// Canonical token, also the feedback key
    pub value: String,
    /// Display label
    pub label: String,
    /// Mirrors the session's feedback map
    pub selected: bool,
    #[serde(rename = "type")]
    pub kind: ChipKind,
}
