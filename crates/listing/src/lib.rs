//! View-level orchestration over the metadata service and favorites backend.

pub mod controller;
pub mod details;
pub mod favorites;
#[cfg(test)]
pub(crate) mod testing;

pub use controller::{
    Applied, FetchTicket, Intent, ListingController, ListingState, ListingView, Route,
    SearchMemory,
};
pub use details::{DetailView, load_details};
pub use favorites::{FavoriteError, FavoriteSet, Toggled};
