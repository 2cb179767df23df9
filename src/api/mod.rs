mod client;
mod model;

pub use client::{
    ApiClient, DEFAULT_API_URL, DEFAULT_WEB_URL, MediaRefQuery, episode_share_url,
    playlist_share_url,
};
pub use model::{Episode, MediaRef, Playlist, PlaylistItem, PlaylistOwner, PodcastSummary};
