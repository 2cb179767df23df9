mod controller;
mod debounce;
mod fetcher;
mod state;

pub use controller::{DEFAULT_SEARCH_DEBOUNCE, ListQueryController, QueryOptions};
pub use debounce::Debouncer;
pub use fetcher::{MediaRefFetcher, PagedFetcher};
pub use state::{FetchParams, Keyed, Page, QueryState};
