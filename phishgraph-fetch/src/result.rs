use phishgraph_core::PageSnapshot;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// What the response body turned out to be.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentKind {
    Html,
    Pdf,
    Other,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FetchResult {
    pub requested_url: String,
    pub status_code: u16,
    pub content_type: Option<String>,
    pub content_length: Option<u64>,
    pub response_time: Duration,
    pub redirected: bool,
    pub kind: ContentKind,
    /// Final URL after redirects; `html` only for [`ContentKind::Html`].
    pub page: PageSnapshot,
}

impl FetchResult {
    pub fn new(requested_url: String, final_url: String) -> Self {
        Self {
            redirected: requested_url != final_url,
            requested_url,
            status_code: 0,
            content_type: None,
            content_length: None,
            response_time: Duration::from_secs(0),
            kind: ContentKind::Other,
            page: PageSnapshot::url_only(final_url),
        }
    }

    pub fn is_html(&self) -> bool {
        self.kind == ContentKind::Html
    }

    pub fn into_page(self) -> PageSnapshot {
        self.page
    }
}
