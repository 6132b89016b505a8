//! List view: filter/pagination state kept in sync with a remote collection.

mod controller;
mod intent;
mod reducer;
mod state;

pub use controller::ListViewController;
pub use intent::ListIntent;
pub use reducer::ListReducer;
pub use state::{FetchTicket, ListStatus, ListViewState};
