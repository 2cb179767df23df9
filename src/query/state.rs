use serde::Serialize;

/// An item that can be identified inside a list
pub trait Keyed {
    /// Stable identifier used as the list key
    fn key(&self) -> &str;
}

impl Keyed for String {
    fn key(&self) -> &str {
        self
    }
}

/// One page of results as returned by a fetcher
#[derive(Debug, Clone, PartialEq)]
pub struct Page<T> {
    /// Items of this page, in backend order
    pub items: Vec<T>,
    /// Total number of matches across all pages
    pub total_count: u64,
}

impl<T> Page<T> {
    pub fn new(items: Vec<T>, total_count: u64) -> Self {
        Self { items, total_count }
    }
}

/// Parameters for a single page request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchParams {
    /// Id of the record owning the collection (episode, playlist, ...)
    pub parent_id: String,
    /// Selected filter, e.g. `clips`
    pub filter_key: Option<String>,
    /// Selected sort, e.g. `most-recent`
    pub sort_key: Option<String>,
    /// 1-based page number
    pub page: u32,
    /// Search text, `None` when the search box is empty
    pub search_text: Option<String>,
}

impl FetchParams {
    /// The key the backend orders results by
    ///
    /// The sort selection wins; without one the filter doubles as the sort.
    pub fn filter_or_sort_key(&self) -> Option<&str> {
        self.sort_key.as_deref().or(self.filter_key.as_deref())
    }
}

/// Pagination, filter and sort state of one remote list
#[derive(Debug, Clone, Serialize)]
pub struct QueryState<T> {
    pub items: Vec<T>,
    /// Unknown until the first page arrives
    pub total_count: Option<u64>,
    pub page: u32,
    pub sort_key: Option<String>,
    pub filter_key: Option<String>,
    pub search_text: String,
    pub end_of_results: bool,
    pub is_loading: bool,
    pub is_loading_more: bool,
    #[serde(skip)]
    generation: u64,
}

impl<T> Default for QueryState<T> {
    fn default() -> Self {
        Self {
            items: Vec::new(),
            total_count: None,
            page: 1,
            sort_key: None,
            filter_key: None,
            search_text: String::new(),
            end_of_results: false,
            is_loading: false,
            is_loading_more: false,
            generation: 0,
        }
    }
}

impl<T> QueryState<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Counter bumped on every reset; responses issued under an older
    /// generation are discarded
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Whether a filter is selected, i.e. the list is paginated
    pub fn is_paginated(&self) -> bool {
        self.filter_key.is_some()
    }

    pub fn is_busy(&self) -> bool {
        self.is_loading || self.is_loading_more
    }

    /// Page the next `load_more` asks for
    ///
    /// Until a first page has arrived (unknown total) this is page 1 again,
    /// so a result set whose first load failed is never continued at page 2.
    pub fn next_page(&self) -> u32 {
        match self.total_count {
            Some(_) => self.page + 1,
            None => 1,
        }
    }

    /// Keys of the loaded items, in list order
    pub fn item_keys(&self) -> Vec<&str>
    where
        T: Keyed,
    {
        self.items.iter().map(Keyed::key).collect()
    }

    /// Start a new result set: page 1, no items, unknown total
    pub(crate) fn reset(&mut self) {
        self.generation += 1;
        self.items.clear();
        self.total_count = None;
        self.page = 1;
        self.end_of_results = false;
        self.is_loading = false;
        self.is_loading_more = false;
    }

    /// Collapse to an empty, closed result set
    pub(crate) fn close(&mut self) {
        self.reset();
        self.end_of_results = true;
    }

    pub(crate) fn finish_loading(&mut self) {
        self.is_loading = false;
        self.is_loading_more = false;
    }

    /// Merge a fetched page: page 1 replaces, later pages append
    pub(crate) fn apply_page(&mut self, page_number: u32, page: Page<T>) {
        if page_number <= 1 {
            self.items = page.items;
        } else {
            self.items.extend(page.items);
        }
        self.page = page_number;
        self.total_count = Some(page.total_count);
        self.end_of_results = self.items.len() as u64 >= page.total_count;
        self.finish_loading();
    }

    /// Put back the state an operation started from, keeping the current
    /// generation so later responses are still judged against it
    pub(crate) fn restore(&mut self, snapshot: QueryState<T>) {
        let generation = self.generation;
        *self = snapshot;
        self.generation = generation;
        self.finish_loading();
    }

    pub(crate) fn params(&self, parent_id: &str, page: u32) -> FetchParams {
        FetchParams {
            parent_id: parent_id.to_string(),
            filter_key: self.filter_key.clone(),
            sort_key: self.sort_key.clone(),
            page,
            search_text: Some(self.search_text.clone()).filter(|text| !text.is_empty()),
        }
    }
}
