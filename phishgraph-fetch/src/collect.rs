// Batch collection of pages for dataset building

use crate::error::{FetchError, Result};
use crate::fetcher::Fetcher;
use futures::stream::{self, StreamExt};
use phishgraph_core::PageSnapshot;
use std::sync::Arc;
use tracing::{info, warn};

/// Called after every batch with the running totals.
pub type ProgressCallback = Arc<dyn Fn(CollectProgress) + Send + Sync>;

/// Options for a collection run
pub struct CollectOptions {
    pub urls: Vec<String>,
    /// Requests in flight at once.
    pub concurrency: usize,
    /// URLs per batch; every batch is flushed once.
    pub batch_size: usize,
    /// Stop starting new batches once this many HTML pages were fetched.
    pub limit: Option<usize>,
    pub progress_callback: Option<ProgressCallback>,
}

impl CollectOptions {
    pub fn new(urls: Vec<String>) -> Self {
        Self {
            urls,
            concurrency: 32,
            batch_size: 1000,
            limit: None,
            progress_callback: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CollectProgress {
    pub batch: usize,
    pub processed: usize,
    pub fetched: usize,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CollectStats {
    pub batches: usize,
    pub processed: usize,
    pub fetched: usize,
    pub failed: usize,
}

/// Fetch `options.urls` batch by batch.
///
/// Pages that came back as HTML are handed to `on_batch` once per batch, in
/// completion order. Failed and non-HTML URLs are counted and skipped. An
/// error from `on_batch` aborts the run.
pub async fn collect<F>(
    fetcher: &Fetcher,
    options: CollectOptions,
    mut on_batch: F,
) -> Result<CollectStats>
where
    F: FnMut(Vec<PageSnapshot>) -> Result<()>,
{
    let CollectOptions {
        urls,
        concurrency,
        batch_size,
        limit,
        progress_callback,
    } = options;

    if concurrency == 0 || batch_size == 0 {
        return Err(FetchError::Other(
            "concurrency and batch size must be at least 1".to_string(),
        ));
    }

    info!(
        "Collecting {} URLs in batches of {} with {} workers",
        urls.len(),
        batch_size,
        concurrency
    );

    let mut stats = CollectStats::default();

    for batch in urls.chunks(batch_size) {
        if let Some(limit) = limit
            && stats.fetched >= limit
        {
            break;
        }

        let outcomes: Vec<_> = stream::iter(batch)
            .map(|url| async move { (url, fetcher.fetch(url).await) })
            .buffer_unordered(concurrency)
            .collect()
            .await;

        let mut pages = Vec::new();
        for (url, outcome) in outcomes {
            match outcome {
                Ok(result) if result.is_html() => pages.push(result.into_page()),
                Ok(result) => {
                    stats.failed += 1;
                    warn!("Skipping {}: not an HTML page ({:?})", url, result.kind);
                }
                Err(e) => {
                    stats.failed += 1;
                    warn!("Fetch error for {}: {}", url, e);
                }
            }
        }

        stats.batches += 1;
        stats.processed += batch.len();
        stats.fetched += pages.len();

        if !pages.is_empty() {
            on_batch(pages)?;
        }

        info!(
            "Processed batch {}: total processed {}, accessible {}",
            stats.batches, stats.processed, stats.fetched
        );

        if let Some(ref callback) = progress_callback {
            callback(CollectProgress {
                batch: stats.batches,
                processed: stats.processed,
                fetched: stats.fetched,
            });
        }
    }

    Ok(stats)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex as StdMutex;
    use wiremock::{
        Mock, MockServer, ResponseTemplate,
        matchers::{method, path},
    };

    async fn mount_pages(mock_server: &MockServer, count: usize) {
        for i in 0..count {
            Mock::given(method("GET"))
                .and(path(format!("/page{}", i)))
                .respond_with(
                    ResponseTemplate::new(200)
                        .insert_header("content-type", "text/html")
                        .set_body_bytes(format!("<html><body>{}</body></html>", i).into_bytes()),
                )
                .mount(mock_server)
                .await;
        }
    }

    fn page_urls(mock_server: &MockServer, count: usize) -> Vec<String> {
        (0..count)
            .map(|i| format!("{}/page{}", mock_server.uri(), i))
            .collect()
    }

    #[tokio::test]
    async fn test_collect_flushes_each_batch() {
        let mock_server = MockServer::start().await;
        mount_pages(&mock_server, 7).await;

        let fetcher = Fetcher::with_timeout(5).unwrap();
        let mut options = CollectOptions::new(page_urls(&mock_server, 7));
        options.batch_size = 3;
        options.concurrency = 4;

        let mut flushed: Vec<usize> = Vec::new();
        let stats = collect(&fetcher, options, |pages| {
            flushed.push(pages.len());
            Ok(())
        })
        .await
        .unwrap();

        assert_eq!(flushed, vec![3, 3, 1]);
        assert_eq!(stats.batches, 3);
        assert_eq!(stats.processed, 7);
        assert_eq!(stats.fetched, 7);
        assert_eq!(stats.failed, 0);
    }

    #[tokio::test]
    async fn test_collect_skips_failures() {
        let mock_server = MockServer::start().await;
        mount_pages(&mock_server, 2).await;

        Mock::given(method("GET"))
            .and(path("/data.json"))
            .respond_with(
                ResponseTemplate::new(200)
                    .insert_header("content-type", "application/json")
                    .set_body_bytes(b"{}"),
            )
            .mount(&mock_server)
            .await;

        let mut urls = page_urls(&mock_server, 2);
        urls.push(format!("{}/missing", mock_server.uri()));
        urls.push(format!("{}/data.json", mock_server.uri()));

        let fetcher = Fetcher::with_timeout(5).unwrap();
        let mut collected = Vec::new();
        let stats = collect(&fetcher, CollectOptions::new(urls), |pages| {
            collected.extend(pages);
            Ok(())
        })
        .await
        .unwrap();

        assert_eq!(stats.processed, 4);
        assert_eq!(stats.fetched, 2);
        assert_eq!(stats.failed, 2);
        assert!(collected.iter().all(|p| p.html.is_some()));
    }

    #[tokio::test]
    async fn test_collect_honours_limit() {
        let mock_server = MockServer::start().await;
        mount_pages(&mock_server, 10).await;

        let fetcher = Fetcher::with_timeout(5).unwrap();
        let mut options = CollectOptions::new(page_urls(&mock_server, 10));
        options.batch_size = 2;
        options.limit = Some(3);

        let progress: Arc<StdMutex<Vec<CollectProgress>>> = Arc::new(StdMutex::new(Vec::new()));
        let progress_clone = progress.clone();
        options.progress_callback = Some(Arc::new(move |p| {
            progress_clone.lock().unwrap().push(p);
        }));

        let stats = collect(&fetcher, options, |_| Ok(())).await.unwrap();

        // Batches are never split, so the run stops after the batch that crosses the limit
        assert_eq!(stats.batches, 2);
        assert_eq!(stats.fetched, 4);
        assert_eq!(progress.lock().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_collect_sink_error_aborts() {
        let mock_server = MockServer::start().await;
        mount_pages(&mock_server, 4).await;

        let fetcher = Fetcher::with_timeout(5).unwrap();
        let mut options = CollectOptions::new(page_urls(&mock_server, 4));
        options.batch_size = 2;

        let mut calls = 0;
        let result = collect(&fetcher, options, |_| {
            calls += 1;
            Err(FetchError::Other("disk full".to_string()))
        })
        .await;

        assert!(result.is_err());
        assert_eq!(calls, 1);
    }

    #[tokio::test]
    async fn test_collect_rejects_zero_batch() {
        let fetcher = Fetcher::with_timeout(5).unwrap();
        let mut options = CollectOptions::new(vec!["http://example.com".to_string()]);
        options.batch_size = 0;
        assert!(collect(&fetcher, options, |_| Ok(())).await.is_err());
    }
}
