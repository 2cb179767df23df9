use std::sync::Arc;

use tokio::sync::watch;

use crate::api::{Playlist, PlaylistItem};

/// A piece of state shared between views
///
/// Clones share the same value. Readers can either take a snapshot with
/// `get` or `subscribe` to be woken on every write.
#[derive(Debug)]
pub struct Slot<T> {
    tx: Arc<watch::Sender<T>>,
}

impl<T> Clone for Slot<T> {
    fn clone(&self) -> Self {
        Self {
            tx: self.tx.clone(),
        }
    }
}

impl<T: Clone> Slot<T> {
    pub fn new(value: T) -> Self {
        let (tx, _rx) = watch::channel(value);
        Self { tx: Arc::new(tx) }
    }

    /// Snapshot of the current value
    pub fn get(&self) -> T {
        self.tx.borrow().clone()
    }

    /// Replace the value, returning the previous one
    pub fn set(&self, value: T) -> T {
        self.tx.send_replace(value)
    }

    /// Modify the value in place
    pub fn update(&self, modify: impl FnOnce(&mut T)) {
        self.tx.send_modify(modify);
    }

    /// Receiver that observes every subsequent write
    pub fn subscribe(&self) -> watch::Receiver<T> {
        self.tx.subscribe()
    }
}

impl<T: Clone + Default> Default for Slot<T> {
    fn default() -> Self {
        Self::new(T::default())
    }
}

/// The signed-in user as far as views need to know
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Session {
    pub user_id: Option<String>,
    pub subscribed_playlist_ids: Vec<String>,
}

impl Session {
    pub fn is_subscribed_to_playlist(&self, playlist_id: &str) -> bool {
        self.subscribed_playlist_ids.iter().any(|id| id == playlist_id)
    }
}

/// The playlist currently shown by the playlist view
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ScreenPlaylist {
    pub playlist: Option<Playlist>,
    pub items: Vec<PlaylistItem>,
    pub total_count: Option<u64>,
}

/// State shared across views, handed to each view explicitly
#[derive(Debug, Clone, Default)]
pub struct AppStore {
    pub session: Slot<Session>,
    pub screen_playlist: Slot<ScreenPlaylist>,
}

impl AppStore {
    pub fn new(session: Session) -> Self {
        Self {
            session: Slot::new(session),
            screen_playlist: Slot::default(),
        }
    }
}
