mod episode;
mod playlist;

pub use episode::{CLIPS_FILTER, ClipSort, EpisodeView, EpisodeViewType, NO_SUMMARY, UnknownSort};
pub use playlist::{PlaylistView, PlaylistViewState};
