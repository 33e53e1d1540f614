use serde::{Deserialize, Serialize};

/// A fetched page as handed to the feature pipeline.
///
/// `html` is `None` when the fetch layer decided the response was not an
/// HTML document (PDF, images, JSON and so on). The URL is always encoded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageSnapshot {
    pub url: String,
    #[serde(default)]
    pub html: Option<String>,
}

impl PageSnapshot {
    pub fn new(url: String, html: Option<String>) -> Self {
        Self { url, html }
    }

    pub fn url_only(url: String) -> Self {
        Self { url, html: None }
    }

    pub fn has_html(&self) -> bool {
        self.html.is_some()
    }
}
