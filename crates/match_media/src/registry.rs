use std::sync::{Arc, OnceLock};

use thiserror::Error;
use tokio::runtime::Handle;
use tracing::{debug, info};

use crate::watcher::{MediaEnvironment, QueryWatcher};

static INSTALLED: OnceLock<MatchMedia> = OnceLock::new();

#[derive(Debug, Error, PartialEq, Eq)]
pub enum InstallError {
    #[error("match_media is already installed for this process")]
    AlreadyInstalled,
    #[error("match_media has not been installed")]
    NotInstalled,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InstallOutcome {
    Installed,
    /// No async runtime was available on the calling thread.
    Skipped,
}

/// Factory handing out a fresh [`QueryWatcher`] per call.
///
/// Watchers are never shared: two calls with the same query return two
/// independent watchers with their own listeners.
#[derive(Clone)]
pub struct MatchMedia {
    environment: MediaEnvironment,
    runtime: Option<Handle>,
}

impl MatchMedia {
    pub fn new(environment: MediaEnvironment, runtime: Option<Handle>) -> Self {
        Self {
            environment,
            runtime,
        }
    }

    /// Binds the factory to the tokio runtime of the calling thread, if any.
    pub fn with_current_runtime(environment: MediaEnvironment) -> Option<Self> {
        Handle::try_current()
            .ok()
            .map(|runtime| Self::new(environment, Some(runtime)))
    }

    pub fn match_media(&self, query: impl Into<String>) -> Arc<QueryWatcher> {
        QueryWatcher::new(query, &self.environment, self.runtime.as_ref())
    }
}

/// Makes `factory` the process-wide entry point. Can only happen once.
pub fn install(factory: MatchMedia) -> Result<(), InstallError> {
    INSTALLED
        .set(factory)
        .map_err(|_| InstallError::AlreadyInstalled)?;
    info!("match_media installed");
    Ok(())
}

/// Installs a factory bound to the current tokio runtime. Outside a runtime
/// nothing is installed and [`InstallOutcome::Skipped`] is returned.
pub fn install_with_current_runtime(
    environment: MediaEnvironment,
) -> Result<InstallOutcome, InstallError> {
    let Some(factory) = MatchMedia::with_current_runtime(environment) else {
        debug!("no async runtime on this thread; match_media installation skipped");
        return Ok(InstallOutcome::Skipped);
    };
    install(factory)?;
    Ok(InstallOutcome::Installed)
}

pub fn installed() -> Option<&'static MatchMedia> {
    INSTALLED.get()
}

/// Creates a watcher through the installed factory.
pub fn match_media(query: impl Into<String>) -> Result<Arc<QueryWatcher>, InstallError> {
    installed()
        .map(|factory| factory.match_media(query))
        .ok_or(InstallError::NotInstalled)
}

#[cfg(test)]
#[path = "tests/registry_tests.rs"]
mod tests;
