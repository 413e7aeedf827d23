//! Collaborator services consumed by the session core.

pub mod location;

pub use location::{FeedLocationService, LocationFeed, LocationService, LocationServiceFactory};
