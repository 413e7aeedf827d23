//! Source of the local position fix.
//!
//! Real sensors are platform specific and live outside this crate; the
//! session only needs the [`LocationService`] trait. [`FeedLocationService`]
//! is the in-process implementation used by the binaries (static position
//! from configuration) and by tests (positions pushed through a
//! [`LocationFeed`]).

use std::sync::{Arc, Mutex};

use tracing::debug;

use crate::domain::location::Location;

/// A provider of position fixes.
pub trait LocationService: Send {
    /// Starts receiving fixes.
    fn start_listen(&mut self);

    /// Stops receiving fixes. Calling it while not listening is harmless.
    fn stop_listen(&mut self);

    /// `true` when a fix arrived since the last [`current_location`](Self::current_location).
    fn has_location_changed(&self) -> bool;

    /// Returns the latest fix and clears the changed flag.
    fn current_location(&mut self) -> Option<Location>;
}

/// Creates the location service of a session on first use.
pub type LocationServiceFactory = Box<dyn FnOnce() -> Box<dyn LocationService> + Send>;

#[derive(Debug, Default)]
struct FeedState {
    location: Option<Location>,
    changed: bool,
    listening: bool,
}

/// Handle for pushing fixes into a [`FeedLocationService`] from anywhere.
#[derive(Debug, Clone, Default)]
pub struct LocationFeed {
    state: Arc<Mutex<FeedState>>,
}

impl LocationFeed {
    /// Publishes a new fix and raises the changed flag.
    pub fn update(&self, location: Location) {
        if let Ok(mut state) = self.state.lock() {
            state.location = Some(location);
            state.changed = true;
        }
    }

    pub fn is_listening(&self) -> bool {
        self.state.lock().map(|s| s.listening).unwrap_or(false)
    }
}

/// [`LocationService`] whose fixes come from a [`LocationFeed`].
#[derive(Debug, Clone, Default)]
pub struct FeedLocationService {
    feed: LocationFeed,
}

impl FeedLocationService {
    pub fn new() -> Self {
        Self::default()
    }

    /// A service that reports `location` once after it starts listening.
    pub fn fixed(location: Location) -> Self {
        let service = Self::default();
        service.feed.update(location);
        service
    }

    pub fn feed(&self) -> LocationFeed {
        self.feed.clone()
    }
}

impl LocationService for FeedLocationService {
    fn start_listen(&mut self) {
        if let Ok(mut state) = self.feed.state.lock() {
            debug!("location service listening");
            state.listening = true;
        }
    }

    fn stop_listen(&mut self) {
        if let Ok(mut state) = self.feed.state.lock() {
            state.listening = false;
        }
    }

    fn has_location_changed(&self) -> bool {
        self.feed
            .state
            .lock()
            .map(|s| s.listening && s.changed)
            .unwrap_or(false)
    }

    fn current_location(&mut self) -> Option<Location> {
        let mut state = self.feed.state.lock().ok()?;
        state.changed = false;
        state.location
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_change_reported_before_listening() {
        let service = FeedLocationService::fixed(Location::new(1.0, 2.0));
        assert!(!service.has_location_changed());
    }

    #[test]
    fn test_reading_clears_changed_flag() {
        // Arrange
        let mut service = FeedLocationService::fixed(Location::new(1.0, 2.0));
        service.start_listen();
        assert!(service.has_location_changed());

        // Act
        let fix = service.current_location();

        // Assert
        assert_eq!(fix, Some(Location::new(1.0, 2.0)));
        assert!(!service.has_location_changed());
    }

    #[test]
    fn test_feed_updates_are_visible_to_service() {
        let mut service = FeedLocationService::new();
        let feed = service.feed();
        service.start_listen();
        assert!(feed.is_listening());

        feed.update(Location::new(5.0, 6.0));

        assert!(service.has_location_changed());
        assert_eq!(service.current_location(), Some(Location::new(5.0, 6.0)));

        service.stop_listen();
        assert!(!feed.is_listening());
    }
}
