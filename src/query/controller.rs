// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Mutex;
use tracing::{debug, warn};

use crate::connectivity::SharedConnectivity;
use crate::observer::SharedObserver;

use super::debounce::Debouncer;
use super::fetcher::PagedFetcher;
use super::state::{FetchParams, QueryState};

/// Quiescence window applied to search input by default
pub const DEFAULT_SEARCH_DEBOUNCE: Duration = Duration::from_millis(1000);

/// Options for a list query controller
#[derive(Debug, Clone)]
pub struct QueryOptions {
    /// Delay after the last search keystroke before the fetch is issued
    pub search_debounce: Duration,
    /// Sort selected when the controller is created
    pub initial_sort: Option<String>,
}

impl Default for QueryOptions {
    fn default() -> Self {
        Self {
            search_debounce: DEFAULT_SEARCH_DEBOUNCE,
            initial_sort: None,
        }
    }
}

struct Shared<F: PagedFetcher> {
    fetcher: F,
    connectivity: SharedConnectivity,
    observer: SharedObserver<F::Item>,
    parent_id: String,
    state: Mutex<QueryState<F::Item>>,
}

/// Pagination, filter, sort and search state for one remote list
///
/// Every operation returns the state it leaves behind and reports each
/// intermediate state to the observer. Operations may overlap at their
/// fetch: a response that arrives after a newer reset is discarded, and a
/// failed or offline fetch puts back the state the operation started from.
pub struct ListQueryController<F: PagedFetcher> {
    shared: Arc<Shared<F>>,
    search: Debouncer,
}

impl<F: PagedFetcher> ListQueryController<F> {
    pub fn new(
        fetcher: F,
        parent_id: impl Into<String>,
        connectivity: SharedConnectivity,
        observer: SharedObserver<F::Item>,
        options: QueryOptions,
    ) -> Self {
        let mut state = QueryState::new();
        state.sort_key = options.initial_sort;

        Self {
            shared: Arc::new(Shared {
                fetcher,
                connectivity,
                observer,
                parent_id: parent_id.into(),
                state: Mutex::new(state),
            }),
            search: Debouncer::new(options.search_debounce),
        }
    }

    /// Id of the record whose collection this controller lists
    pub fn parent_id(&self) -> &str {
        &self.shared.parent_id
    }

    /// Snapshot of the current state
    pub async fn state(&self) -> QueryState<F::Item> {
        self.shared.state.lock().await.clone()
    }

    /// Select a filter and load its first page
    ///
    /// An empty key clears the selection and collapses the list to an empty,
    /// closed result set without touching the network.
    pub async fn set_filter(&self, key: &str) -> QueryState<F::Item> {
        self.search.cancel();

        if key.is_empty() {
            let mut state = self.shared.state.lock().await;
            state.filter_key = None;
            state.close();
            return self.shared.emit(&state);
        }

        let (generation, snapshot, params) = {
            let mut state = self.shared.state.lock().await;
            let snapshot = state.clone();
            state.reset();
            state.filter_key = Some(key.to_string());
            state.is_loading = true;
            self.shared.emit(&state);
            (
                state.generation(),
                snapshot,
                state.params(&self.shared.parent_id, 1),
            )
        };

        self.shared.fetch(generation, params, snapshot).await
    }

    /// Select a sort and reload the first page of the current filter
    ///
    /// An empty key only clears the sort selection; the loaded items stay,
    /// since the filter decides what is shown. Without a filter the sort is
    /// recorded for the next load.
    pub async fn set_sort(&self, key: &str) -> QueryState<F::Item> {
        if key.is_empty() {
            let mut state = self.shared.state.lock().await;
            if state.sort_key.take().is_none() {
                return state.clone();
            }
            return self.shared.emit(&state);
        }

        let (generation, snapshot, params) = {
            let mut state = self.shared.state.lock().await;
            if !state.is_paginated() {
                state.sort_key = Some(key.to_string());
                return self.shared.emit(&state);
            }

            self.search.cancel();
            let snapshot = state.clone();
            state.reset();
            state.sort_key = Some(key.to_string());
            state.is_loading = true;
            self.shared.emit(&state);
            (
                state.generation(),
                snapshot,
                state.params(&self.shared.parent_id, 1),
            )
        };

        self.shared.fetch(generation, params, snapshot).await
    }

    /// Fetch the next page and append it
    ///
    /// Does nothing unless a filter is selected, more results exist and no
    /// other load is in flight. When the first page never arrived, it is
    /// requested again instead.
    pub async fn load_more(&self) -> QueryState<F::Item> {
        let (generation, snapshot, params) = {
            let mut state = self.shared.state.lock().await;
            if !state.is_paginated() || state.end_of_results || state.is_busy() {
                debug!(
                    parent_id = %self.shared.parent_id,
                    end_of_results = state.end_of_results,
                    "ignoring load more"
                );
                return state.clone();
            }

            let snapshot = state.clone();
            state.is_loading_more = true;
            self.shared.emit(&state);
            let next_page = state.next_page();
            (
                state.generation(),
                snapshot,
                state.params(&self.shared.parent_id, next_page),
            )
        };

        self.shared.fetch(generation, params, snapshot).await
    }

    /// Update the search text
    ///
    /// The list is cleared right away; the fetch itself runs once no further
    /// search input arrived for the quiescence window. Must be called from
    /// within a tokio runtime.
    pub async fn set_search_text(&self, text: &str) -> QueryState<F::Item> {
        let (generation, state) = {
            let mut state = self.shared.state.lock().await;
            state.reset();
            state.search_text = text.to_string();
            state.is_loading_more = true;
            (state.generation(), self.shared.emit(&state))
        };

        let shared = self.shared.clone();
        self.search.schedule(async move {
            shared.run_search(generation).await;
        });

        state
    }

    /// Wait for a scheduled search to complete and return the resulting state
    pub async fn wait_for_search(&self) -> QueryState<F::Item> {
        self.search.flush().await;
        self.state().await
    }

    /// Whether a search is waiting for its quiescence window or in flight
    pub fn has_pending_search(&self) -> bool {
        self.search.is_pending()
    }

    /// Drop a scheduled search; its fetch never reaches the backend
    pub fn cancel_search(&self) -> bool {
        self.search.cancel()
    }
}

impl<F: PagedFetcher> Shared<F> {
    fn emit(&self, state: &QueryState<F::Item>) -> QueryState<F::Item> {
        self.observer.state_changed(state);
        state.clone()
    }

    async fn run_search(&self, generation: u64) {
        let (snapshot, params) = {
            let mut state = self.state.lock().await;
            if state.generation() != generation {
                return;
            }
            if !state.is_paginated() {
                state.close();
                self.emit(&state);
                return;
            }
            (state.clone(), state.params(&self.parent_id, 1))
        };

        self.fetch(generation, params, snapshot).await;
    }

    async fn fetch(
        &self,
        generation: u64,
        params: FetchParams,
        snapshot: QueryState<F::Item>,
    ) -> QueryState<F::Item> {
        if self.connectivity.is_offline().await {
            warn!(parent_id = %self.parent_id, "offline, not loading results");
            return self.abandon(generation, snapshot).await;
        }

        debug!(
            parent_id = %self.parent_id,
            page = params.page,
            filter = ?params.filter_key,
            sort = ?params.sort_key,
            search = ?params.search_text,
            "fetching page"
        );

        match self.fetcher.fetch_page(&params).await {
            Ok(page) => {
                let mut state = self.state.lock().await;
                if state.generation() != generation {
                    debug!(
                        parent_id = %self.parent_id,
                        page = params.page,
                        "discarding page from an outdated query"
                    );
                    return state.clone();
                }
                state.apply_page(params.page, page);
                self.emit(&state)
            }
            Err(e) => {
                warn!(parent_id = %self.parent_id, page = params.page, error = %e, "failed to load results");
                self.abandon(generation, snapshot).await
            }
        }
    }

    async fn abandon(
        &self,
        generation: u64,
        snapshot: QueryState<F::Item>,
    ) -> QueryState<F::Item> {
        let mut state = self.state.lock().await;
        if state.generation() != generation {
            return state.clone();
        }
        state.restore(snapshot);
        self.emit(&state)
    }
}
