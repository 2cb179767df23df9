// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use std::sync::Arc;

use async_trait::async_trait;

use crate::api::{ApiClient, MediaRef, MediaRefQuery};
use crate::error::ApiError;
use crate::http::HttpClient;

use super::state::{FetchParams, Keyed, Page};

/// A remote collection that can be read one page at a time
///
/// Implementations should return the same page for identical parameters;
/// the controller does not memoize.
#[async_trait]
pub trait PagedFetcher: Send + Sync + 'static {
    type Item: Keyed + Clone + Send + Sync + 'static;

    /// Fetch one page along with the total number of matches
    async fn fetch_page(&self, params: &FetchParams) -> Result<Page<Self::Item>, ApiError>;
}

#[async_trait]
impl<F: PagedFetcher> PagedFetcher for Arc<F> {
    type Item = F::Item;

    async fn fetch_page(&self, params: &FetchParams) -> Result<Page<Self::Item>, ApiError> {
        (**self).fetch_page(params).await
    }
}

/// Clips of one episode, read from the media-ref endpoint
///
/// The selected sort is sent as the backend sort, falling back to the
/// filter when no sort is selected.
pub struct MediaRefFetcher<C: HttpClient> {
    api: Arc<ApiClient<C>>,
}

impl<C: HttpClient> MediaRefFetcher<C> {
    pub fn new(api: Arc<ApiClient<C>>) -> Self {
        Self { api }
    }
}

#[async_trait]
impl<C: HttpClient + 'static> PagedFetcher for MediaRefFetcher<C> {
    type Item = MediaRef;

    async fn fetch_page(&self, params: &FetchParams) -> Result<Page<MediaRef>, ApiError> {
        let query = MediaRefQuery {
            episode_id: Some(params.parent_id.clone()),
            sort: params.filter_or_sort_key().map(str::to_string),
            page: Some(params.page),
            search_all_fields_text: params.search_text.clone(),
        };

        let (items, total_count) = self.api.get_media_refs(&query).await?;
        Ok(Page::new(items, total_count))
    }
}
