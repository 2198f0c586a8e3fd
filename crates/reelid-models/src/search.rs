//! Web search result model.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// One ranked web search hit.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize, JsonSchema)]
pub struct SearchResult {
    pub title: String,
    pub link: String,
    #[serde(default)]
    pub snippet: String,
}

impl SearchResult {
    pub fn new(
        title: impl Into<String>,
        link: impl Into<String>,
        snippet: impl Into<String>,
    ) -> Self {
        Self {
            title: title.into(),
            link: link.into(),
            snippet: snippet.into(),
        }
    }
}
