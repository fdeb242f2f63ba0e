//! Debounced search input.
//!
//! A keystroke schedules a search after a fixed quiescence window; another keystroke inside
//! the window replaces the pending search. Once a search has been sent it is never cancelled.
//! If it returns after a newer one was issued, the store discards it.

use crate::constants::SEARCH_DEBOUNCE;
use crate::page::PageRequest;
use crate::query::ListQuery;
use crate::store::{ListStore, Resource};
use std::sync::{Arc, Mutex, PoisonError};
use tokio::task::JoinHandle;

pub struct SearchDebouncer<R: Resource> {
    store: Arc<ListStore<R>>,
    page_size: u32,
    pending: Mutex<Option<JoinHandle<()>>>,
}

impl<R: Resource> SearchDebouncer<R> {
    pub fn new(store: Arc<ListStore<R>>, page_size: u32) -> Self {
        Self {
            store,
            page_size,
            pending: Mutex::new(None),
        }
    }

    /// Record new search-box contents.
    ///
    /// After the quiescence window the store is searched from page 0, or listed in full
    /// when the box is blank. Must be called from within a tokio runtime.
    pub fn input(&self, text: &str) {
        let query: ListQuery<R::Status> = ListQuery::from_search_input(text);
        let page = PageRequest::first(self.page_size);
        let store = Arc::clone(&self.store);

        let timer = tokio::spawn(async move {
            tokio::time::sleep(SEARCH_DEBOUNCE).await;
            // Detached so that a later keystroke cannot abort a request already on the wire.
            tokio::spawn(async move {
                store.fetch(query, page).await;
            });
        });

        let previous = self
            .pending
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .replace(timer);
        if let Some(previous) = previous {
            previous.abort();
        }
    }

    /// Drop any search that has not been sent yet.
    pub fn cancel(&self) {
        if let Some(pending) = self
            .pending
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
        {
            pending.abort();
        }
    }
}

impl<R: Resource> Drop for SearchDebouncer<R> {
    fn drop(&mut self) {
        self.cancel();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::service::Service;
    use crate::test_support::ScriptedTransport;
    use serde_json::json;
    use std::time::Duration;

    #[tokio::test(start_paused = true)]
    async fn only_last_keystroke_in_window_is_searched() {
        let transport = ScriptedTransport::new();
        let store = Arc::new(ListStore::<Service>::new(transport.client()));
        transport.push_ok(json!({ "status": 200, "data": [] }));
        let debouncer = SearchDebouncer::new(store.clone(), 10);

        debouncer.input("x");
        tokio::time::sleep(Duration::from_millis(200)).await;
        debouncer.input("xr");
        tokio::time::sleep(Duration::from_millis(200)).await;
        debouncer.input("xray");
        tokio::time::sleep(Duration::from_millis(499)).await;
        assert_eq!(transport.request_count(), 0);

        tokio::time::sleep(Duration::from_millis(2)).await;
        transport.wait_for_requests(1).await;

        let requests = transport.requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].path, "services/search");
        assert_eq!(requests[0].query_value("name"), Some("xray"));
        assert_eq!(requests[0].query_value("page"), Some("0"));
    }

    #[tokio::test(start_paused = true)]
    async fn blank_input_lists_everything() {
        let transport = ScriptedTransport::new();
        let store = Arc::new(ListStore::<Service>::new(transport.client()));
        transport.push_ok(json!({ "status": 200, "data": [] }));
        let debouncer = SearchDebouncer::new(store, 25);

        debouncer.input("  ");
        tokio::time::sleep(SEARCH_DEBOUNCE + Duration::from_millis(1)).await;
        transport.wait_for_requests(1).await;

        let request = &transport.requests()[0];
        assert_eq!(request.path, "services");
        assert_eq!(request.query_value("size"), Some("25"));
    }

    #[tokio::test(start_paused = true)]
    async fn keystroke_after_send_does_not_cancel_request() {
        let transport = ScriptedTransport::new();
        let store = Arc::new(ListStore::<Service>::new(transport.client()));
        let gate = transport.push_gated();
        transport.push_ok(json!({ "status": 200, "data": [] }));
        let debouncer = SearchDebouncer::new(store.clone(), 10);

        debouncer.input("xr");
        tokio::time::sleep(SEARCH_DEBOUNCE + Duration::from_millis(1)).await;
        transport.wait_for_requests(1).await;
        assert!(store.is_loading());

        debouncer.input("xray");
        gate.send(crate::test_support::ok_body(json!({
            "status": 200,
            "data": [{ "id": "s1", "name": "X-Ray", "charge": 500 }],
        })))
        .unwrap();

        // The first request still completes even though a new keystroke arrived.
        while store.is_loading() {
            tokio::task::yield_now().await;
        }
        assert_eq!(store.snapshot().items.len(), 1);

        tokio::time::sleep(SEARCH_DEBOUNCE + Duration::from_millis(1)).await;
        transport.wait_for_requests(2).await;
        assert_eq!(transport.requests()[1].query_value("name"), Some("xray"));
    }
}
