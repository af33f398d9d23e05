//! Device-side collaborators a query watcher listens to: the orientation
//! sensor and the window dimension notifier.

use std::sync::Arc;

use async_trait::async_trait;
use shared::{
    domain::{Orientation, WindowSize},
    events::{DimensionsChangeEvent, DimensionsEventKind, OrientationChangeEvent},
};

pub mod callbacks;
pub mod simulated;

pub use callbacks::{CallbackId, CallbackList};
pub use simulated::{SimulatedOrientationSource, SimulatedViewport};

pub type OrientationCallback = Arc<dyn Fn(&OrientationChangeEvent) + Send + Sync>;
pub type DimensionsCallback = Arc<dyn Fn(&DimensionsChangeEvent) + Send + Sync>;

#[async_trait]
pub trait OrientationSource: Send + Sync {
    /// One-shot read of the current device orientation.
    async fn current_orientation(&self) -> anyhow::Result<Orientation>;
    /// Registers `callback` for every later orientation change.
    fn on_orientation_change(&self, callback: OrientationCallback) -> Subscription;
}

pub trait ViewportSource: Send + Sync {
    /// Current window size. Always fresh, never cached by callers.
    fn window_size(&self) -> WindowSize;
    fn add_dimensions_listener(&self, kind: DimensionsEventKind, callback: DimensionsCallback);
    /// Removes a listener previously added with the same `Arc`. Removing an
    /// unknown listener is a no-op.
    fn remove_dimensions_listener(&self, kind: DimensionsEventKind, callback: &DimensionsCallback);
}

/// Handle to a registration on an [`OrientationSource`].
///
/// The release action runs at most once, either through [`Subscription::remove`]
/// or when the handle is dropped.
pub struct Subscription {
    release: Option<Box<dyn FnOnce() + Send>>,
}

impl Subscription {
    pub fn new(release: impl FnOnce() + Send + 'static) -> Self {
        Self {
            release: Some(Box::new(release)),
        }
    }

    /// A handle with nothing to release.
    pub fn detached() -> Self {
        Self { release: None }
    }

    pub fn remove(&mut self) {
        if let Some(release) = self.release.take() {
            release();
        }
    }

    pub fn is_active(&self) -> bool {
        self.release.is_some()
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.remove();
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription")
            .field("active", &self.is_active())
            .finish()
    }
}

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
