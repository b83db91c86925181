//! Sequential paginated fetching

use std::future::Future;

use crate::error::Result;
use crate::types::Pager;

/// Fetch every page of a query.
///
/// Starts at page 1 with the given sort key and keeps asking for the next
/// page until one comes back empty. Pages are requested one at a time since
/// each request's cursor follows from the previous one.
pub async fn fetch_all<T, F, Fut>(mut pager: Pager, sort_key: &str, mut query: F) -> Result<Vec<T>>
where
    F: FnMut(Pager) -> Fut,
    Fut: Future<Output = Result<Vec<T>>>,
{
    pager.sort_by = Some(sort_key.to_string());
    pager.page = 1;

    let mut results = Vec::new();
    loop {
        let page = query(pager.clone()).await?;
        tracing::debug!("Page {} returned {} result(s)", pager.page, page.len());
        if page.is_empty() {
            break;
        }
        results.extend(page);
        pager.page += 1;
    }

    Ok(results)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[tokio::test]
    async fn test_three_pages() {
        let sizes = [50usize, 50, 0];
        let calls = Arc::new(AtomicUsize::new(0));
        let seen = calls.clone();

        let results = fetch_all(Pager::new(7), "_docid", move |pager| {
            let n = seen.fetch_add(1, Ordering::SeqCst);
            let size = sizes[n];
            async move {
                assert_eq!(pager.page as usize, n + 1);
                assert_eq!(pager.sort_by.as_deref(), Some("_docid"));
                Ok((0..size).map(|i| (pager.page, i)).collect::<Vec<_>>())
            }
        })
        .await
        .unwrap();

        assert_eq!(results.len(), 100);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
        assert_eq!(results[0], (1, 0));
        assert_eq!(results[99], (2, 49));
    }

    #[tokio::test]
    async fn test_error_stops_loop() {
        let calls = Arc::new(AtomicUsize::new(0));
        let seen = calls.clone();
        let result: Result<Vec<u32>> = fetch_all(Pager::default(), "_docid", move |pager| {
            seen.fetch_add(1, Ordering::SeqCst);
            async move {
                if pager.page == 2 {
                    Err(Error::submission(Some(503), "down"))
                } else {
                    Ok(vec![1])
                }
            }
        })
        .await;

        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }
}
