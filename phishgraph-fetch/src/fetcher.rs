use crate::error::{FetchError, Result};
use crate::result::{ContentKind, FetchResult};
use reqwest::Client;
use std::time::{Duration, Instant};
use tracing::debug;
use url::Url;

pub const DEFAULT_TIMEOUT_SECS: u64 = 20;
const MAX_REDIRECTS: usize = 10;

/// Fetches single pages for the feature pipeline.
///
/// One pooled client is shared by every request made through the fetcher,
/// clones are cheap.
#[derive(Debug, Clone)]
pub struct Fetcher {
    client: Client,
    timeout_secs: u64,
}

impl Fetcher {
    pub fn new() -> Result<Self> {
        Self::with_timeout(DEFAULT_TIMEOUT_SECS)
    }

    pub fn with_timeout(timeout_secs: u64) -> Result<Self> {
        let client = Client::builder()
            .user_agent(concat!("phishgraph/", env!("CARGO_PKG_VERSION")))
            .timeout(Duration::from_secs(timeout_secs))
            .connect_timeout(Duration::from_secs(timeout_secs.div_ceil(2)))
            .pool_max_idle_per_host(50)
            .pool_idle_timeout(Duration::from_secs(90))
            .tcp_keepalive(Duration::from_secs(60))
            .redirect(reqwest::redirect::Policy::limited(MAX_REDIRECTS))
            .build()?;

        Ok(Self {
            client,
            timeout_secs,
        })
    }

    pub fn timeout_secs(&self) -> u64 {
        self.timeout_secs
    }

    /// GET `url` and classify the body.
    ///
    /// Bare hosts are given an `http://` scheme first. Non-2xx answers are
    /// errors; non-HTML bodies come back with `page.html == None`.
    pub async fn fetch(&self, url: &str) -> Result<FetchResult> {
        let target = normalize_url(url)
            .and_then(|u| Url::parse(&u).ok())
            .ok_or_else(|| FetchError::InvalidUrl(url.trim().to_string()))?;
        debug!("Fetching {}", target);

        let start = Instant::now();
        let response = self.client.get(target.clone()).send().await?;
        let response_time = start.elapsed();

        let status = response.status();
        let final_url = response.url().to_string();
        if !status.is_success() {
            return Err(FetchError::Status {
                url: final_url,
                status: status.as_u16(),
            });
        }

        let content_type = response
            .headers()
            .get("content-type")
            .and_then(|v| v.to_str().ok())
            .map(|s| s.to_string());
        let content_length = response.content_length();

        // reqwest decodes by the charset in the content type
        let (kind, html) = match classify(content_type.as_deref()) {
            Some(ContentKind::Html) | None => {
                let body = response.text().await?;
                let kind = sniff(content_type.is_some(), &body);
                (kind, (kind == ContentKind::Html).then_some(body))
            }
            Some(kind) => (kind, None),
        };

        let mut result = FetchResult::new(target.to_string(), final_url);
        result.status_code = status.as_u16();
        result.content_type = content_type;
        result.content_length = content_length;
        result.response_time = response_time;
        result.kind = kind;
        result.page.html = html;

        debug!(
            "Fetched {} ({:?}, {} bytes, {:?})",
            result.page.url,
            kind,
            result.page.html.as_ref().map_or(0, |html| html.len()),
            response_time
        );
        Ok(result)
    }
}

/// Turn a line from a URL list into a fetchable URL.
pub fn normalize_url(line: &str) -> Option<String> {
    let line = line.trim();
    if line.is_empty() {
        return None;
    }

    if line.starts_with("http://") || line.starts_with("https://") {
        return Url::parse(line).ok().map(|_| line.to_string());
    }

    let with_scheme = format!("http://{}", line);
    Url::parse(&with_scheme)
        .ok()
        .filter(|u| u.host_str().is_some_and(|h| !h.is_empty()))
        .map(|_| with_scheme)
}

/// Kind announced by the content type, `None` when there is no header.
fn classify(content_type: Option<&str>) -> Option<ContentKind> {
    let ct = content_type?.to_ascii_lowercase();
    Some(if ct.contains("application/pdf") {
        ContentKind::Pdf
    } else if ct.contains("text/html") || ct.contains("application/xhtml") {
        ContentKind::Html
    } else {
        ContentKind::Other
    })
}

/// Second look at a decoded body that was announced as HTML (or not
/// announced at all).
fn sniff(announced_html: bool, body: &str) -> ContentKind {
    let start = body.trim_start();
    if start.starts_with("%PDF-") {
        ContentKind::Pdf
    } else if announced_html || start.starts_with('<') {
        ContentKind::Html
    } else {
        ContentKind::Other
    }
}
