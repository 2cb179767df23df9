// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::query::Keyed;

/// The podcast an episode or clip belongs to
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PodcastSummary {
    pub id: String,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub image_url: Option<String>,
}

/// A podcast episode as returned by the backend
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Episode {
    pub id: String,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub pub_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub media_url: Option<String>,
    #[serde(default)]
    pub podcast: Option<PodcastSummary>,
}

impl Episode {
    /// Image of the owning podcast, if known
    pub fn podcast_image_url(&self) -> Option<&str> {
        self.podcast.as_ref()?.image_url.as_deref()
    }
}

/// A clip: a titled time range inside an episode
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MediaRef {
    pub id: String,
    #[serde(default)]
    pub title: Option<String>,
    /// Start offset in seconds
    pub start_time: u32,
    /// End offset in seconds, open-ended when missing
    #[serde(default)]
    pub end_time: Option<u32>,
    #[serde(default)]
    pub episode: Option<Episode>,
}

impl MediaRef {
    /// Clip length in seconds, if the clip has an end
    pub fn duration(&self) -> Option<u32> {
        self.end_time
            .map(|end| end.saturating_sub(self.start_time))
    }
}

/// Owner of a user playlist
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlaylistOwner {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
}

/// A user playlist with its episodes and clips
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Playlist {
    pub id: String,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub item_count: Option<u64>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub owner: Option<PlaylistOwner>,
    #[serde(default)]
    pub episodes: Vec<Episode>,
    #[serde(default)]
    pub media_refs: Vec<MediaRef>,
    /// Ids of episodes and clips in display order
    #[serde(default)]
    pub items_order: Vec<String>,
}

impl Playlist {
    /// Combine episodes and clips into one list in `items_order` order
    ///
    /// Items missing from `items_order` follow the ordered ones, episodes
    /// before clips, each keeping the order the backend returned them in.
    pub fn combined_items(&self) -> Vec<PlaylistItem> {
        let mut items: Vec<PlaylistItem> = self
            .episodes
            .iter()
            .cloned()
            .map(PlaylistItem::Episode)
            .chain(self.media_refs.iter().cloned().map(PlaylistItem::Clip))
            .collect();

        // sort_by_key is stable, so unordered items keep their relative order
        items.sort_by_key(|item| {
            self.items_order
                .iter()
                .position(|id| id == item.key())
                .unwrap_or(usize::MAX)
        });

        items
    }
}

/// One entry of a playlist
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PlaylistItem {
    Clip(MediaRef),
    Episode(Episode),
}

impl PlaylistItem {
    pub fn title(&self) -> Option<&str> {
        match self {
            PlaylistItem::Clip(clip) => clip.title.as_deref(),
            PlaylistItem::Episode(episode) => episode.title.as_deref(),
        }
    }

    pub fn is_clip(&self) -> bool {
        matches!(self, PlaylistItem::Clip(_))
    }
}

impl Keyed for Episode {
    fn key(&self) -> &str {
        &self.id
    }
}

impl Keyed for MediaRef {
    fn key(&self) -> &str {
        &self.id
    }
}

impl Keyed for PlaylistItem {
    fn key(&self) -> &str {
        match self {
            PlaylistItem::Clip(clip) => &clip.id,
            PlaylistItem::Episode(episode) => &episode.id,
        }
    }
}
