use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use thiserror::Error;
use tracing::{info, warn};

use crate::api::{ApiClient, Episode, MediaRef, episode_share_url};
use crate::connectivity::SharedConnectivity;
use crate::http::HttpClient;
use crate::observer::SharedObserver;
use crate::query::{ListQueryController, MediaRefFetcher, QueryOptions, QueryState};

/// Filter key of the paginated clip list
pub const CLIPS_FILTER: &str = "clips";

/// Shown when an episode comes without a description
pub const NO_SUMMARY: &str = "No summary available.";

/// What the episode view shows below its header
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EpisodeViewType {
    /// Paginated, searchable clip list
    Clips,
    /// The episode description
    #[default]
    ShowNotes,
}

/// Sort orders offered for clips
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ClipSort {
    #[default]
    MostRecent,
    TopPastDay,
    TopPastWeek,
    TopPastMonth,
    TopPastYear,
}

#[derive(Error, Debug, PartialEq, Eq)]
#[error("Unknown clip sort '{0}'")]
pub struct UnknownSort(pub String);

impl ClipSort {
    pub const ALL: [ClipSort; 5] = [
        ClipSort::MostRecent,
        ClipSort::TopPastDay,
        ClipSort::TopPastWeek,
        ClipSort::TopPastMonth,
        ClipSort::TopPastYear,
    ];

    /// Key understood by the backend
    pub fn as_str(self) -> &'static str {
        match self {
            ClipSort::MostRecent => "most-recent",
            ClipSort::TopPastDay => "top-past-day",
            ClipSort::TopPastWeek => "top-past-week",
            ClipSort::TopPastMonth => "top-past-month",
            ClipSort::TopPastYear => "top-past-year",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            ClipSort::MostRecent => "most recent",
            ClipSort::TopPastDay => "top - past day",
            ClipSort::TopPastWeek => "top - past week",
            ClipSort::TopPastMonth => "top - past month",
            ClipSort::TopPastYear => "top - past year",
        }
    }
}

impl fmt::Display for ClipSort {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ClipSort {
    type Err = UnknownSort;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ClipSort::ALL
            .into_iter()
            .find(|sort| sort.as_str() == s)
            .ok_or_else(|| UnknownSort(s.to_string()))
    }
}

/// Episode detail: header data, show notes and the episode's clips
pub struct EpisodeView<C: HttpClient + 'static> {
    api: Arc<ApiClient<C>>,
    connectivity: SharedConnectivity,
    episode_id: String,
    episode: Option<Episode>,
    view_type: Option<EpisodeViewType>,
    is_loading: bool,
    clips: ListQueryController<MediaRefFetcher<C>>,
}

impl<C: HttpClient + 'static> EpisodeView<C> {
    pub fn new(
        api: Arc<ApiClient<C>>,
        connectivity: SharedConnectivity,
        observer: SharedObserver<MediaRef>,
        episode_id: impl Into<String>,
        view_type: EpisodeViewType,
    ) -> Self {
        let episode_id = episode_id.into();
        let clips = ListQueryController::new(
            MediaRefFetcher::new(api.clone()),
            episode_id.clone(),
            connectivity.clone(),
            observer,
            QueryOptions {
                initial_sort: Some(ClipSort::default().as_str().to_string()),
                ..Default::default()
            },
        );

        Self {
            api,
            connectivity,
            episode_id,
            episode: None,
            view_type: Some(view_type),
            is_loading: view_type == EpisodeViewType::Clips,
            clips,
        }
    }

    /// Show an episode that is already at hand until the fresh copy arrives
    pub fn with_episode(mut self, episode: Episode) -> Self {
        self.episode = Some(episode);
        self
    }

    /// Load the episode and, in clip mode, the first page of clips
    pub async fn initialize(&mut self) {
        self.is_loading = true;
        info!(episode_id = %self.episode_id, "loading episode");

        let wants_clips = self.view_type == Some(EpisodeViewType::Clips);
        let clips = &self.clips;
        let load_clips = async move {
            if wants_clips {
                clips.set_filter(CLIPS_FILTER).await;
            }
        };

        if self.connectivity.is_offline().await {
            warn!(episode_id = %self.episode_id, "offline, keeping cached episode");
            load_clips.await;
        } else {
            let (episode, ()) = futures::join!(self.api.get_episode(&self.episode_id), load_clips);
            match episode {
                Ok(mut episode) => {
                    if episode
                        .description
                        .as_deref()
                        .is_none_or(|text| text.trim().is_empty())
                    {
                        episode.description = Some(NO_SUMMARY.to_string());
                    }
                    self.episode = Some(episode);
                }
                Err(e) => {
                    warn!(episode_id = %self.episode_id, error = %e, "failed to load episode");
                }
            }
        }

        self.is_loading = false;
    }

    /// Switch between clips and show notes; `None` clears the selection
    pub async fn select_view(&mut self, view_type: Option<EpisodeViewType>) -> QueryState<MediaRef> {
        self.view_type = view_type;
        match view_type {
            Some(EpisodeViewType::Clips) => self.clips.set_filter(CLIPS_FILTER).await,
            _ => self.clips.set_filter("").await,
        }
    }

    /// Change the clip sort; `None` clears it and keeps the loaded clips
    pub async fn select_sort(&self, sort: Option<ClipSort>) -> QueryState<MediaRef> {
        self.clips
            .set_sort(sort.map(ClipSort::as_str).unwrap_or_default())
            .await
    }

    pub async fn load_more(&self) -> QueryState<MediaRef> {
        self.clips.load_more().await
    }

    /// Debounced clip search
    pub async fn search(&self, text: &str) -> QueryState<MediaRef> {
        self.clips.set_search_text(text).await
    }

    pub async fn wait_for_search(&self) -> QueryState<MediaRef> {
        self.clips.wait_for_search().await
    }

    pub async fn clips(&self) -> QueryState<MediaRef> {
        self.clips.state().await
    }

    /// Sorts to offer for the current view; show notes have none
    pub fn available_sorts(&self) -> &'static [ClipSort] {
        match self.view_type {
            Some(EpisodeViewType::Clips) => &ClipSort::ALL,
            _ => &[],
        }
    }

    pub fn episode_id(&self) -> &str {
        &self.episode_id
    }

    pub fn episode(&self) -> Option<&Episode> {
        self.episode.as_ref()
    }

    pub fn view_type(&self) -> Option<EpisodeViewType> {
        self.view_type
    }

    pub fn is_loading(&self) -> bool {
        self.is_loading
    }

    pub fn is_not_found(&self) -> bool {
        !self.is_loading && self.episode.is_none()
    }

    pub fn show_notes(&self) -> Option<&str> {
        self.episode.as_ref()?.description.as_deref()
    }

    pub fn share_url(&self, web_url: &str) -> String {
        episode_share_url(web_url, &self.episode_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::connectivity::{AlwaysOnline, ConnectivityFlag};
    use crate::http::HttpResponse;
    use crate::observer::NoopObserver;
    use crate::query::Keyed;
    use async_trait::async_trait;
    use bytes::Bytes;
    use std::sync::Mutex;

    /// Answers episode requests and serves clips two per page out of five
    #[derive(Default)]
    struct MockHttpClient {
        episode_json: Option<String>,
        requested: Mutex<Vec<String>>,
    }

    impl MockHttpClient {
        fn clip_requests(&self) -> Vec<String> {
            self.requested
                .lock()
                .unwrap()
                .iter()
                .filter(|url| url.contains("/mediaRef"))
                .cloned()
                .collect()
        }
    }

    #[async_trait]
    impl HttpClient for MockHttpClient {
        async fn get(&self, url: &str) -> Result<HttpResponse, reqwest::Error> {
            self.requested.lock().unwrap().push(url.to_string());

            let (status, body) = if url.contains("/episode/") {
                match &self.episode_json {
                    Some(json) => (200, json.clone()),
                    None => (404, "Not Found".to_string()),
                }
            } else if url.contains("page=1") {
                (200, r#"[[{"id": "c1", "startTime": 0}, {"id": "c2", "startTime": 5}], 5]"#.to_string())
            } else {
                (200, r#"[[{"id": "c3", "startTime": 9}, {"id": "c4", "startTime": 12}], 5]"#.to_string())
            };

            Ok(HttpResponse {
                status,
                body: Bytes::from(body),
            })
        }
    }

    fn view(client: MockHttpClient, view_type: EpisodeViewType) -> EpisodeView<MockHttpClient> {
        let api = Arc::new(ApiClient::from_str_url(client, "https://api.example.com").unwrap());
        EpisodeView::new(
            api,
            AlwaysOnline::shared(),
            NoopObserver::shared(),
            "ep-1",
            view_type,
        )
    }

    fn episode_client(json: &str) -> MockHttpClient {
        MockHttpClient {
            episode_json: Some(json.to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn clip_sort_parses_backend_keys() {
        for sort in ClipSort::ALL {
            assert_eq!(sort.as_str().parse::<ClipSort>(), Ok(sort));
        }
        assert_eq!(
            "loudest".parse::<ClipSort>(),
            Err(UnknownSort("loudest".to_string()))
        );
        assert_eq!(ClipSort::TopPastWeek.to_string(), "top-past-week");
    }

    #[tokio::test]
    async fn clips_view_loads_episode_and_first_page() {
        let mut view = view(
            episode_client(r#"{"id": "ep-1", "title": "Pilot", "description": "<p>Hi</p>"}"#),
            EpisodeViewType::Clips,
        );
        assert!(view.is_loading());

        view.initialize().await;

        assert!(!view.is_loading());
        assert_eq!(view.episode().unwrap().title.as_deref(), Some("Pilot"));
        assert_eq!(view.show_notes(), Some("<p>Hi</p>"));
        let clips = view.clips().await;
        assert_eq!(clips.item_keys(), vec!["c1", "c2"]);
        assert_eq!(clips.filter_key.as_deref(), Some(CLIPS_FILTER));
        assert_eq!(view.available_sorts().len(), 5);
    }

    #[tokio::test]
    async fn first_clip_request_uses_default_sort() {
        let mut view = view(episode_client(r#"{"id": "ep-1"}"#), EpisodeViewType::Clips);

        view.initialize().await;

        let clip_requests = view.api_client_requests();
        assert_eq!(clip_requests.len(), 1);
        assert!(clip_requests[0].contains("episodeId=ep-1"));
        assert!(clip_requests[0].contains("sort=most-recent"));
        assert!(clip_requests[0].contains("page=1"));
    }

    #[tokio::test]
    async fn show_notes_view_fetches_no_clips() {
        let mut view = view(episode_client(r#"{"id": "ep-1"}"#), EpisodeViewType::ShowNotes);

        view.initialize().await;

        assert_eq!(view.show_notes(), Some(NO_SUMMARY));
        assert!(view.api_client_requests().is_empty());
        assert!(view.available_sorts().is_empty());
    }

    #[tokio::test]
    async fn missing_episode_is_not_found() {
        let mut view = view(MockHttpClient::default(), EpisodeViewType::ShowNotes);

        view.initialize().await;

        assert!(view.is_not_found());
    }

    #[tokio::test]
    async fn failed_refresh_keeps_cached_episode() {
        let cached = Episode {
            id: "ep-1".to_string(),
            title: Some("Cached".to_string()),
            description: None,
            pub_date: None,
            media_url: None,
            podcast: None,
        };
        let mut view =
            view(MockHttpClient::default(), EpisodeViewType::ShowNotes).with_episode(cached);

        view.initialize().await;

        assert_eq!(view.episode().unwrap().title.as_deref(), Some("Cached"));
        assert!(!view.is_not_found());
    }

    #[tokio::test]
    async fn offline_initialize_skips_requests() {
        let api = Arc::new(
            ApiClient::from_str_url(episode_client(r#"{"id": "ep-1"}"#), "https://api.example.com")
                .unwrap(),
        );
        let mut view = EpisodeView::new(
            api.clone(),
            ConnectivityFlag::new(true),
            NoopObserver::shared(),
            "ep-1",
            EpisodeViewType::Clips,
        );

        view.initialize().await;

        assert!(view.is_not_found());
        assert!(view.clips().await.items.is_empty());
        assert!(!view.clips().await.is_loading);
    }

    #[tokio::test]
    async fn switching_views_opens_and_closes_clip_list() {
        let mut view = view(episode_client(r#"{"id": "ep-1"}"#), EpisodeViewType::ShowNotes);
        view.initialize().await;

        let clips = view.select_view(Some(EpisodeViewType::Clips)).await;
        assert_eq!(clips.item_keys(), vec!["c1", "c2"]);

        let clips = view.load_more().await;
        assert_eq!(clips.item_keys(), vec!["c1", "c2", "c3", "c4"]);

        let clips = view.select_view(Some(EpisodeViewType::ShowNotes)).await;
        assert!(clips.items.is_empty());
        assert!(clips.end_of_results);
        assert_eq!(view.view_type(), Some(EpisodeViewType::ShowNotes));
    }

    #[tokio::test]
    async fn selecting_sort_reloads_clips() {
        let mut view = view(episode_client(r#"{"id": "ep-1"}"#), EpisodeViewType::Clips);
        view.initialize().await;

        let clips = view.select_sort(Some(ClipSort::TopPastYear)).await;

        assert_eq!(clips.sort_key.as_deref(), Some("top-past-year"));
        let last = view.api_client_requests().pop().unwrap();
        assert!(last.contains("sort=top-past-year"));

        let clips = view.select_sort(None).await;
        assert!(clips.sort_key.is_none());
        assert_eq!(clips.items.len(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn search_reaches_backend_once() {
        let mut view = view(episode_client(r#"{"id": "ep-1"}"#), EpisodeViewType::Clips);
        view.initialize().await;

        view.search("in").await;
        view.search("intro").await;
        let clips = view.wait_for_search().await;

        let requests = view.api_client_requests();
        assert_eq!(requests.len(), 2);
        assert!(requests[1].contains("searchAllFieldsText=intro"));
        assert_eq!(clips.items.iter().map(Keyed::key).count(), 2);
    }

    #[test]
    fn share_url_points_at_episode() {
        let view = view(MockHttpClient::default(), EpisodeViewType::Clips);
        assert_eq!(
            view.share_url("https://podverse.fm"),
            "https://podverse.fm/episode/ep-1"
        );
    }

    impl EpisodeView<MockHttpClient> {
        fn api_client_requests(&self) -> Vec<String> {
            self.api.http().clip_requests()
        }
    }
}
