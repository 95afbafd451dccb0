//! Page aggregation.
//!
//! Paged upstream listings arrive as a lazy stream of pages. A tool picks
//! one [`Aggregation`] policy when it is registered; the policy decides how
//! much of the stream is consumed and what the tool returns.

use futures_util::{Stream, TryStreamExt};
use serde_json::{Value, json};
use tracing::{debug, warn};

use crate::client::Page;

/// How a tool turns a page stream into one response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Aggregation {
    /// Pull one page and return its `data` unchanged.
    SinglePage,
    /// Pull pages until the stream ends and return `{"items": [...]}`.
    ///
    /// `max_pages` stops the drain early; `None` drains everything.
    AllPages { max_pages: Option<usize> },
}

/// Consume `pages` according to `policy`.
///
/// Items keep upstream order: page order first, then order within a page.
/// The first error ends the aggregation and is returned as-is.
pub async fn aggregate<S, E>(pages: S, policy: Aggregation) -> Result<Value, E>
where
    S: Stream<Item = Result<Page, E>>,
{
    let mut pages = std::pin::pin!(pages);

    match policy {
        Aggregation::SinglePage => Ok(pages
            .try_next()
            .await?
            .map(|page| page.data)
            .unwrap_or(Value::Null)),
        Aggregation::AllPages { max_pages } => {
            let mut items = Vec::new();
            let mut pulled = 0usize;

            while let Some(page) = pages.try_next().await? {
                items.extend(page.into_items());
                pulled += 1;

                if max_pages.is_some_and(|max| pulled >= max) {
                    warn!(pages = pulled, items = items.len(), "page cap reached, stopping aggregation");
                    break;
                }
            }

            debug!(pages = pulled, items = items.len(), "aggregated pages");
            Ok(json!({ "items": items }))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures_util::stream::{self, StreamExt};
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn page(items: Value) -> Result<Page, String> {
        Ok(Page::new(json!({ "items": items, "pagination": null })))
    }

    fn counted(
        pages: Vec<Result<Page, String>>,
    ) -> (impl Stream<Item = Result<Page, String>>, Arc<AtomicUsize>) {
        let pulls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&pulls);
        let stream = stream::iter(pages).inspect(move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
        });
        (stream, pulls)
    }

    #[tokio::test]
    async fn test_all_pages_preserves_order() {
        let (pages, pulls) = counted(vec![
            page(json!(["a", "b"])),
            page(json!(["c"])),
            page(json!([])),
        ]);

        let result = aggregate(pages, Aggregation::AllPages { max_pages: None })
            .await
            .unwrap();

        assert_eq!(result, json!({ "items": ["a", "b", "c"] }));
        assert_eq!(pulls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_all_pages_empty_stream() {
        let (pages, _) = counted(vec![]);
        let result = aggregate(pages, Aggregation::AllPages { max_pages: None })
            .await
            .unwrap();
        assert_eq!(result, json!({ "items": [] }));
    }

    #[tokio::test]
    async fn test_single_page_returns_data_unchanged() {
        let first = json!({ "items": [1, 2], "pagination": { "has_more": true, "page_number": 0 } });
        let (pages, pulls) = counted(vec![Ok(Page::new(first.clone())), page(json!([3]))]);

        let result = aggregate(pages, Aggregation::SinglePage).await.unwrap();

        assert_eq!(result, first);
        assert_eq!(pulls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_error_aborts_aggregation() {
        let (pages, pulls) = counted(vec![
            page(json!(["a"])),
            Err("upstream down".to_string()),
            page(json!(["b"])),
        ]);

        let err = aggregate(pages, Aggregation::AllPages { max_pages: None })
            .await
            .unwrap_err();

        assert_eq!(err, "upstream down");
        assert_eq!(pulls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_page_cap_stops_pulling() {
        let (pages, pulls) = counted(vec![
            page(json!([1])),
            page(json!([2])),
            page(json!([3])),
        ]);

        let result = aggregate(pages, Aggregation::AllPages { max_pages: Some(2) })
            .await
            .unwrap();

        assert_eq!(result, json!({ "items": [1, 2] }));
        assert_eq!(pulls.load(Ordering::SeqCst), 2);
    }
}
