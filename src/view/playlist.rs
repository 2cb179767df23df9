use std::sync::Arc;

use tracing::{info, warn};

use crate::api::{ApiClient, Playlist, PlaylistItem, playlist_share_url};
use crate::connectivity::SharedConnectivity;
use crate::http::HttpClient;
use crate::store::{AppStore, ScreenPlaylist};

/// Flags the playlist view renders from
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PlaylistViewState {
    pub is_loading: bool,
    pub is_subscribed: bool,
    pub is_subscribing: bool,
}

/// Playlist detail: header, combined clip and episode items, subscription
///
/// The loaded playlist lives in the store's `screen_playlist` slot so other
/// views (e.g. an editor) can read it.
pub struct PlaylistView<C: HttpClient> {
    api: Arc<ApiClient<C>>,
    connectivity: SharedConnectivity,
    store: AppStore,
    playlist_id: String,
    fallback: Option<Playlist>,
    state: PlaylistViewState,
}

impl<C: HttpClient> PlaylistView<C> {
    pub fn new(
        api: Arc<ApiClient<C>>,
        connectivity: SharedConnectivity,
        store: AppStore,
        playlist_id: impl Into<String>,
    ) -> Self {
        let playlist_id = playlist_id.into();
        let is_subscribed = store.session.get().is_subscribed_to_playlist(&playlist_id);

        Self {
            api,
            connectivity,
            store,
            playlist_id,
            fallback: None,
            state: PlaylistViewState {
                is_loading: true,
                is_subscribed,
                is_subscribing: false,
            },
        }
    }

    /// Show a playlist that is already at hand until the fresh copy arrives
    pub fn with_playlist(mut self, playlist: Playlist) -> Self {
        self.fallback = Some(playlist);
        self
    }

    /// Load the playlist into the store
    ///
    /// Failures are logged and leave the slot empty.
    pub async fn initialize(&mut self) -> PlaylistViewState {
        self.state.is_loading = true;
        self.store.screen_playlist.set(ScreenPlaylist::default());
        info!(playlist_id = %self.playlist_id, "loading playlist");

        if self.connectivity.is_offline().await {
            warn!(playlist_id = %self.playlist_id, "offline, not loading playlist");
        } else {
            match self.api.get_playlist(&self.playlist_id).await {
                Ok(playlist) => {
                    let items = playlist.combined_items();
                    let total_count = playlist.item_count.or(Some(items.len() as u64));
                    self.store.screen_playlist.set(ScreenPlaylist {
                        playlist: Some(playlist),
                        items,
                        total_count,
                    });
                }
                Err(e) => {
                    warn!(playlist_id = %self.playlist_id, error = %e, "failed to load playlist");
                }
            }
        }

        self.state.is_loading = false;
        self.state
    }

    /// Subscribe to or unsubscribe from the playlist
    ///
    /// Offline this does nothing; errors only end the subscribing state.
    pub async fn toggle_subscribe(&mut self) -> PlaylistViewState {
        if self.connectivity.is_offline().await {
            warn!(playlist_id = %self.playlist_id, "offline, not changing subscription");
            return self.state;
        }

        self.state.is_subscribing = true;
        match self.api.toggle_playlist_subscription(&self.playlist_id).await {
            Ok(subscribed_ids) => {
                self.store
                    .session
                    .update(|session| session.subscribed_playlist_ids = subscribed_ids);
                self.state.is_subscribed = self
                    .store
                    .session
                    .get()
                    .is_subscribed_to_playlist(&self.playlist_id);
            }
            Err(e) => {
                warn!(playlist_id = %self.playlist_id, error = %e, "failed to toggle subscription");
            }
        }
        self.state.is_subscribing = false;
        self.state
    }

    pub fn state(&self) -> PlaylistViewState {
        self.state
    }

    pub fn playlist_id(&self) -> &str {
        &self.playlist_id
    }

    /// The loaded playlist, or the one handed in before loading
    pub fn playlist(&self) -> Option<Playlist> {
        self.store
            .screen_playlist
            .get()
            .playlist
            .or_else(|| self.fallback.clone())
    }

    pub fn items(&self) -> Vec<PlaylistItem> {
        self.store.screen_playlist.get().items
    }

    pub fn total_count(&self) -> u64 {
        self.store.screen_playlist.get().total_count.unwrap_or(0)
    }

    /// Whether the signed-in user owns this playlist
    ///
    /// Owners edit their playlists instead of subscribing to them.
    pub fn is_own_playlist(&self) -> bool {
        let owner_id = self
            .playlist()
            .and_then(|playlist| playlist.owner)
            .map(|owner| owner.id);
        owner_id.is_some() && owner_id == self.store.session.get().user_id
    }

    pub fn is_not_found(&self) -> bool {
        !self.state.is_loading && self.playlist().is_none()
    }

    pub fn share_url(&self, web_url: &str) -> String {
        playlist_share_url(web_url, &self.playlist_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::connectivity::{AlwaysOnline, ConnectivityFlag};
    use crate::http::HttpResponse;
    use crate::query::Keyed;
    use crate::store::Session;
    use async_trait::async_trait;
    use bytes::Bytes;
    use std::sync::Mutex;

    const PLAYLIST_JSON: &str = r#"{
        "id": "pl-1",
        "title": "Favourites",
        "itemCount": 3,
        "owner": { "id": "user-1", "name": "Ada" },
        "episodes": [{ "id": "e1", "title": "Episode one" }],
        "mediaRefs": [
            { "id": "c1", "title": "Clip one", "startTime": 10, "endTime": 20 },
            { "id": "c2", "title": "Clip two", "startTime": 30 }
        ],
        "itemsOrder": ["c2", "e1", "c1"]
    }"#;

    struct MockHttpClient {
        playlist_status: u16,
        subscription_status: u16,
        requested: Mutex<Vec<String>>,
    }

    impl MockHttpClient {
        fn new(playlist_status: u16, subscription_status: u16) -> Self {
            Self {
                playlist_status,
                subscription_status,
                requested: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl HttpClient for MockHttpClient {
        async fn get(&self, url: &str) -> Result<HttpResponse, reqwest::Error> {
            self.requested.lock().unwrap().push(url.to_string());

            let (status, body) = if url.contains("toggle-subscribe") {
                (self.subscription_status, r#"["pl-0", "pl-1"]"#)
            } else {
                (self.playlist_status, PLAYLIST_JSON)
            };
            Ok(HttpResponse {
                status,
                body: Bytes::from(body),
            })
        }
    }

    fn view(client: MockHttpClient, session: Session) -> PlaylistView<MockHttpClient> {
        let api = Arc::new(ApiClient::from_str_url(client, "https://api.example.com").unwrap());
        PlaylistView::new(api, AlwaysOnline::shared(), AppStore::new(session), "pl-1")
    }

    fn visitor() -> Session {
        Session {
            user_id: Some("user-2".to_string()),
            subscribed_playlist_ids: vec!["pl-0".to_string()],
        }
    }

    #[tokio::test]
    async fn initialize_writes_playlist_to_store() {
        let mut view = view(MockHttpClient::new(200, 200), visitor());
        let mut screen = view.store.screen_playlist.subscribe();

        let state = view.initialize().await;

        assert!(!state.is_loading);
        assert!(screen.has_changed().unwrap());
        let screen = screen.borrow_and_update().clone();
        assert_eq!(screen.total_count, Some(3));
        let keys: Vec<&str> = screen.items.iter().map(Keyed::key).collect();
        assert_eq!(keys, vec!["c2", "e1", "c1"]);
        assert_eq!(view.playlist().unwrap().title.as_deref(), Some("Favourites"));
        assert!(!view.is_not_found());
    }

    #[tokio::test]
    async fn initialize_clears_previous_playlist() {
        let store = AppStore::new(visitor());
        store.screen_playlist.set(ScreenPlaylist {
            playlist: None,
            items: Vec::new(),
            total_count: Some(99),
        });
        let api = Arc::new(
            ApiClient::from_str_url(MockHttpClient::new(500, 200), "https://api.example.com")
                .unwrap(),
        );
        let mut view = PlaylistView::new(api, AlwaysOnline::shared(), store.clone(), "pl-1");

        view.initialize().await;

        assert_eq!(store.screen_playlist.get(), ScreenPlaylist::default());
        assert!(view.is_not_found());
        assert_eq!(view.total_count(), 0);
    }

    #[tokio::test]
    async fn fallback_playlist_is_shown_when_loading_fails() {
        let fallback: Playlist = serde_json::from_str(r#"{"id": "pl-1", "title": "Cached"}"#).unwrap();
        let mut view = view(MockHttpClient::new(404, 200), visitor()).with_playlist(fallback);

        view.initialize().await;

        assert_eq!(view.playlist().unwrap().title.as_deref(), Some("Cached"));
        assert!(view.items().is_empty());
    }

    #[tokio::test]
    async fn subscription_follows_returned_ids() {
        let mut view = view(MockHttpClient::new(200, 200), visitor());
        assert!(!view.state().is_subscribed);

        let state = view.toggle_subscribe().await;

        assert!(state.is_subscribed);
        assert!(!state.is_subscribing);
        assert_eq!(
            view.store.session.get().subscribed_playlist_ids,
            vec!["pl-0", "pl-1"]
        );
    }

    #[tokio::test]
    async fn subscribed_state_matches_exact_playlist_id() {
        let session = Session {
            user_id: None,
            subscribed_playlist_ids: vec!["pl-10".to_string()],
        };
        let view = view(MockHttpClient::new(200, 200), session);

        assert!(!view.state().is_subscribed);
    }

    #[tokio::test]
    async fn failed_toggle_keeps_subscription_state() {
        let mut view = view(MockHttpClient::new(200, 500), visitor());

        let state = view.toggle_subscribe().await;

        assert!(!state.is_subscribed);
        assert!(!state.is_subscribing);
        assert_eq!(view.store.session.get(), visitor());
    }

    #[tokio::test]
    async fn offline_toggle_sends_nothing() {
        let api = Arc::new(
            ApiClient::from_str_url(MockHttpClient::new(200, 200), "https://api.example.com")
                .unwrap(),
        );
        let mut view = PlaylistView::new(
            api.clone(),
            ConnectivityFlag::new(true),
            AppStore::new(visitor()),
            "pl-1",
        );

        view.toggle_subscribe().await;
        view.initialize().await;

        assert!(api.http().requested.lock().unwrap().is_empty());
        assert!(view.is_not_found());
    }

    #[tokio::test]
    async fn ownership_compares_owner_with_session_user() {
        let owner = Session {
            user_id: Some("user-1".to_string()),
            subscribed_playlist_ids: Vec::new(),
        };
        let mut own = view(MockHttpClient::new(200, 200), owner);
        let mut other = view(MockHttpClient::new(200, 200), visitor());

        own.initialize().await;
        other.initialize().await;

        assert!(own.is_own_playlist());
        assert!(!other.is_own_playlist());
    }

    #[test]
    fn share_url_points_at_playlist() {
        let view = view(MockHttpClient::new(200, 200), visitor());
        assert_eq!(
            view.share_url("https://podverse.fm/"),
            "https://podverse.fm/playlist/pl-1"
        );
    }
}
