//! Runs searches off the render loop, one at a time.

use crate::event::{AppEvent, EventSink};
use crate::search::{SearchBackend, SearchError, SearchRequest, SearchResult};
use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{error, info, warn};

type SearchFuture = Pin<Box<dyn Future<Output = Result<SearchResult, SearchError>> + Send>>;
type SearchFn = dyn Fn(SearchRequest) -> SearchFuture + Send + Sync;

/// Owns the search backend and delivers exactly one outcome event per
/// accepted request.
pub struct SearchDispatcher {
    search: Arc<SearchFn>,
    sink: EventSink,
    in_flight: Arc<AtomicBool>,
}

impl SearchDispatcher {
    pub fn new<B: SearchBackend>(backend: B, sink: EventSink) -> Self {
        let backend = Arc::new(backend);
        let search: Arc<SearchFn> = Arc::new(move |request: SearchRequest| -> SearchFuture {
            let backend = Arc::clone(&backend);
            Box::pin(async move { backend.search(&request).await })
        });

        Self {
            search,
            sink,
            in_flight: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Whether a search is currently running
    pub fn is_busy(&self) -> bool {
        self.in_flight.load(Ordering::Acquire)
    }

    /// Start a search in the background.
    ///
    /// Returns false (and does nothing) if a search is already in flight.
    /// Otherwise exactly one of [`AppEvent::SearchCompleted`] or
    /// [`AppEvent::SearchFailed`] is sent when it finishes.
    pub fn submit(&self, request: SearchRequest) -> bool {
        if self
            .in_flight
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            warn!(query = %request.query, "Search already in flight, refusing");
            return false;
        }

        info!(query = %request.query, site = %request.params.site, "Dispatching search");
        let search = Arc::clone(&self.search);
        let sink = self.sink.clone();
        let in_flight = Arc::clone(&self.in_flight);

        tokio::spawn(async move {
            // A backend panic surfaces as a JoinError here when panics
            // unwind. Release builds abort on panic instead.
            let outcome = match tokio::spawn(search(request)).await {
                Ok(outcome) => outcome,
                Err(join_err) => Err(SearchError::Backend(format!(
                    "search task aborted: {}",
                    join_err
                ))),
            };
            in_flight.store(false, Ordering::Release);

            let event = match outcome {
                Ok(result) => {
                    info!(items = result.items.len(), "Search completed");
                    AppEvent::SearchCompleted(result)
                }
                Err(err) => {
                    error!(error = %err, "Search failed");
                    AppEvent::SearchFailed(err)
                }
            };
            sink.send(event);
        });

        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event;
    use crate::search::{ResultItem, SearchParams};
    use std::sync::atomic::AtomicUsize;
    use std::time::Duration;

    struct SlowBackend {
        calls: Arc<AtomicUsize>,
        fail: bool,
    }

    impl SearchBackend for SlowBackend {
        async fn search(&self, request: &SearchRequest) -> Result<SearchResult, SearchError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            tokio::time::sleep(Duration::from_secs(1)).await;
            if self.fail {
                return Err(SearchError::Backend("network down".to_string()));
            }
            Ok(SearchResult::new(vec![ResultItem {
                id: 1,
                title: request.query.clone(),
                ..Default::default()
            }]))
        }
    }

    fn request(query: &str) -> SearchRequest {
        SearchRequest {
            query: query.to_string(),
            params: SearchParams::default(),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_delivers_single_outcome() {
        let (sink, mut rx) = event::channel();
        let calls = Arc::new(AtomicUsize::new(0));
        let dispatcher = SearchDispatcher::new(
            SlowBackend {
                calls: Arc::clone(&calls),
                fail: false,
            },
            sink,
        );

        assert!(dispatcher.submit(request("lifetimes")));
        match rx.recv().await {
            Some(AppEvent::SearchCompleted(result)) => assert_eq!(result.items[0].title, "lifetimes"),
            other => panic!("unexpected event: {:?}", other),
        }
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(!dispatcher.is_busy());

        // No duplicate outcome follows
        drop(dispatcher);
        assert!(rx.recv().await.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_refuses_second_search_while_in_flight() {
        let (sink, mut rx) = event::channel();
        let calls = Arc::new(AtomicUsize::new(0));
        let dispatcher = SearchDispatcher::new(
            SlowBackend {
                calls: Arc::clone(&calls),
                fail: false,
            },
            sink,
        );

        assert!(dispatcher.submit(request("first")));
        assert!(dispatcher.is_busy());
        assert!(!dispatcher.submit(request("second")));

        assert!(matches!(rx.recv().await, Some(AppEvent::SearchCompleted(_))));
        assert_eq!(calls.load(Ordering::SeqCst), 1);

        // Free again once the outcome is delivered
        assert!(dispatcher.submit(request("third")));
        assert!(matches!(rx.recv().await, Some(AppEvent::SearchCompleted(_))));
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_backend_failure_is_a_failure_event() {
        let (sink, mut rx) = event::channel();
        let dispatcher = SearchDispatcher::new(
            SlowBackend {
                calls: Arc::new(AtomicUsize::new(0)),
                fail: true,
            },
            sink,
        );

        assert!(dispatcher.submit(request("anything")));
        match rx.recv().await {
            Some(AppEvent::SearchFailed(err)) => assert!(err.to_string().contains("network down")),
            other => panic!("unexpected event: {:?}", other),
        }
    }
}
