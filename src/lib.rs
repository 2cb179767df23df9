pub mod api;
pub mod connectivity;
pub mod error;
pub mod http;
pub mod observer;
pub mod query;
pub mod store;
pub mod view;

// Re-export main types for convenience
pub use api::{ApiClient, DEFAULT_API_URL, DEFAULT_WEB_URL, Episode, MediaRef, Playlist, PlaylistItem};
pub use connectivity::{AlwaysOnline, ConnectivityCheck, ConnectivityFlag, HttpProbe, SharedConnectivity};
pub use error::ApiError;
pub use http::{HttpClient, HttpResponse, ReqwestClient};
pub use observer::{NoopObserver, SharedObserver, StateObserver};
pub use query::{
    FetchParams, Keyed, ListQueryController, MediaRefFetcher, Page, PagedFetcher, QueryOptions,
    QueryState,
};
pub use store::{AppStore, ScreenPlaylist, Session, Slot};
pub use view::{ClipSort, EpisodeView, EpisodeViewType, PlaylistView, PlaylistViewState};
