// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use serde::de::DeserializeOwned;
use tracing::debug;
use url::Url;

use crate::error::ApiError;
use crate::http::HttpClient;

use super::model::{Episode, MediaRef, Playlist};

/// Backend used when no other API URL is configured
pub const DEFAULT_API_URL: &str = "https://api.podverse.fm/api/v1";

/// Public site used for share links
pub const DEFAULT_WEB_URL: &str = "https://podverse.fm";

/// Query for one page of clips
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MediaRefQuery {
    /// Only clips of this episode
    pub episode_id: Option<String>,
    /// Backend sort key, e.g. `most-recent`
    pub sort: Option<String>,
    /// 1-based page number
    pub page: Option<u32>,
    /// Free-text search over all clip fields
    pub search_all_fields_text: Option<String>,
}

/// Typed access to the podcast backend's REST endpoints
pub struct ApiClient<C: HttpClient> {
    http: C,
    base_url: Url,
}

impl<C: HttpClient> ApiClient<C> {
    /// Create a client for the backend rooted at `base_url`
    pub fn new(http: C, base_url: Url) -> Self {
        Self { http, base_url }
    }

    /// Create a client for the backend rooted at `base_url`, given as a string
    pub fn from_str_url(http: C, base_url: &str) -> Result<Self, ApiError> {
        Ok(Self::new(http, Url::parse(base_url)?))
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// The underlying HTTP client
    pub fn http(&self) -> &C {
        &self.http
    }

    /// Fetch a single episode
    pub async fn get_episode(&self, id: &str) -> Result<Episode, ApiError> {
        let url = self.endpoint(&["episode", id])?;
        self.get_json(url).await
    }

    /// Fetch one page of clips together with the total number of matches
    pub async fn get_media_refs(
        &self,
        query: &MediaRefQuery,
    ) -> Result<(Vec<MediaRef>, u64), ApiError> {
        let mut url = self.endpoint(&["mediaRef"])?;
        {
            let mut pairs = url.query_pairs_mut();
            if let Some(episode_id) = &query.episode_id {
                pairs.append_pair("episodeId", episode_id);
            }
            if let Some(sort) = &query.sort {
                pairs.append_pair("sort", sort);
            }
            if let Some(page) = query.page {
                pairs.append_pair("page", &page.to_string());
            }
            if let Some(text) = &query.search_all_fields_text {
                pairs.append_pair("searchAllFieldsText", text);
            }
        }
        // query_pairs_mut leaves a dangling `?` when nothing was appended
        if url.query() == Some("") {
            url.set_query(None);
        }

        self.get_json(url).await
    }

    /// Fetch a playlist with its episodes and clips
    pub async fn get_playlist(&self, id: &str) -> Result<Playlist, ApiError> {
        let url = self.endpoint(&["playlist", id])?;
        self.get_json(url).await
    }

    /// Toggle the subscription to a playlist
    ///
    /// Returns the ids of all playlists the session is subscribed to afterwards.
    pub async fn toggle_playlist_subscription(&self, id: &str) -> Result<Vec<String>, ApiError> {
        let url = self.endpoint(&["playlist", "toggle-subscribe", id])?;
        self.get_json(url).await
    }

    fn endpoint(&self, segments: &[&str]) -> Result<Url, ApiError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| ApiError::InvalidBaseUrl(self.base_url.to_string()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    async fn get_json<T: DeserializeOwned>(&self, url: Url) -> Result<T, ApiError> {
        debug!(url = %url, "requesting");

        let response = self
            .http
            .get(url.as_str())
            .await
            .map_err(|e| ApiError::RequestFailed {
                url: url.to_string(),
                source: e,
            })?;

        if response.status >= 400 {
            return Err(ApiError::HttpStatus {
                url: url.to_string(),
                status: response.status,
            });
        }

        serde_json::from_slice(&response.body).map_err(|e| ApiError::DecodeFailed {
            url: url.to_string(),
            source: e,
        })
    }
}

/// Build the public share link for an episode
pub fn episode_share_url(web_url: &str, episode_id: &str) -> String {
    format!("{}/episode/{}", web_url.trim_end_matches('/'), episode_id)
}

/// Build the public share link for a playlist
pub fn playlist_share_url(web_url: &str, playlist_id: &str) -> String {
    format!("{}/playlist/{}", web_url.trim_end_matches('/'), playlist_id)
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::http::HttpResponse;
    use async_trait::async_trait;
    use bytes::Bytes;
    use std::sync::Mutex;

    struct MockHttpClient {
        status: u16,
        body: String,
        requested: Mutex<Vec<String>>,
    }

    impl MockHttpClient {
        fn new(status: u16, body: &str) -> Self {
            Self {
                status,
                body: body.to_string(),
                requested: Mutex::new(Vec::new()),
            }
        }

        fn last_url(&self) -> String {
            self.requested.lock().unwrap().last().cloned().unwrap()
        }
    }

    #[async_trait]
    impl HttpClient for MockHttpClient {
        async fn get(&self, url: &str) -> Result<HttpResponse, reqwest::Error> {
            self.requested.lock().unwrap().push(url.to_string());
            Ok(HttpResponse {
                status: self.status,
                body: Bytes::from(self.body.clone()),
            })
        }
    }

    fn client(status: u16, body: &str) -> ApiClient<MockHttpClient> {
        ApiClient::from_str_url(MockHttpClient::new(status, body), "https://api.example.com/api/v1")
            .unwrap()
    }

    #[tokio::test]
    async fn get_episode_builds_path_and_decodes() {
        let api = client(200, r#"{"id": "ep 1", "title": "Pilot"}"#);

        let episode = api.get_episode("ep 1").await.unwrap();

        assert_eq!(episode.title.as_deref(), Some("Pilot"));
        assert_eq!(api.http.last_url(), "https://api.example.com/api/v1/episode/ep%201");
    }

    #[tokio::test]
    async fn get_media_refs_encodes_query() {
        let api = client(200, r#"[[{"id": "c1", "startTime": 3}], 12]"#);

        let query = MediaRefQuery {
            episode_id: Some("ep-1".to_string()),
            sort: Some("top-past-week".to_string()),
            page: Some(2),
            search_all_fields_text: Some("deep dive".to_string()),
        };
        let (clips, total) = api.get_media_refs(&query).await.unwrap();

        assert_eq!(clips.len(), 1);
        assert_eq!(total, 12);
        assert_eq!(
            api.http.last_url(),
            "https://api.example.com/api/v1/mediaRef?episodeId=ep-1&sort=top-past-week&page=2&searchAllFieldsText=deep+dive"
        );
    }

    #[tokio::test]
    async fn empty_query_has_no_question_mark() {
        let api = client(200, "[[], 0]");

        api.get_media_refs(&MediaRefQuery::default()).await.unwrap();

        assert_eq!(api.http.last_url(), "https://api.example.com/api/v1/mediaRef");
    }

    #[tokio::test]
    async fn http_error_status_is_reported() {
        let api = client(404, "Not Found");

        let err = api.get_playlist("missing").await.unwrap_err();

        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn malformed_body_is_a_decode_error() {
        let api = client(200, "<html>");

        let err = api.get_episode("ep").await.unwrap_err();

        assert!(matches!(err, ApiError::DecodeFailed { .. }));
    }

    #[tokio::test]
    async fn toggle_subscription_returns_ids() {
        let api = client(200, r#"["pl-1", "pl-2"]"#);

        let ids = api.toggle_playlist_subscription("pl-2").await.unwrap();

        assert_eq!(ids, vec!["pl-1", "pl-2"]);
        assert_eq!(
            api.http.last_url(),
            "https://api.example.com/api/v1/playlist/toggle-subscribe/pl-2"
        );
    }

    #[test]
    fn share_urls_trim_trailing_slash() {
        assert_eq!(
            episode_share_url("https://podverse.fm/", "abc"),
            "https://podverse.fm/episode/abc"
        );
        assert_eq!(
            playlist_share_url("https://podverse.fm", "xyz"),
            "https://podverse.fm/playlist/xyz"
        );
    }
}
