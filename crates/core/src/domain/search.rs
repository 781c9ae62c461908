use serde::{Deserialize, Serialize};

pub const MAX_SEARCH_RESULTS: usize = 3;

/// A single web hit. The provider's response shape isn't guaranteed, so every field is optional.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchResult {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub body: Option<String>,
    #[serde(default)]
    pub link: Option<String>,
}

impl SearchResult {
    pub fn display_title(&self) -> &str {
        self.title.as_deref().unwrap_or("Untitled")
    }

    pub fn display_body(&self) -> &str {
        self.body.as_deref().unwrap_or("No description available")
    }
}
