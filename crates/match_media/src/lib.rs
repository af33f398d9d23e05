//! `matchMedia` for runtimes without a native implementation.
//!
//! A [`QueryWatcher`] keeps one media query string, follows the device
//! orientation and window dimensions, and tells its listeners whenever either
//! changes. [`QueryWatcher::matches`] re-evaluates the query on every call.
//!
//! Application code obtains watchers from a [`MatchMedia`] factory, either
//! injected directly or through the process-wide [`install`] /
//! [`match_media`] pair.

pub mod registry;
pub mod watcher;

pub use registry::{
    install, install_with_current_runtime, installed, match_media, InstallError, InstallOutcome,
    MatchMedia,
};
pub use watcher::{listener, Listener, MediaEnvironment, QueryWatcher, WatcherSnapshot};
