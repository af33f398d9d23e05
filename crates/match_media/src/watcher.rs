use std::{
    fmt,
    sync::{
        atomic::{AtomicU64, Ordering},
        Arc,
    },
};

use device_integration::{
    CallbackList, DimensionsCallback, OrientationSource, Subscription, ViewportSource,
};
use media_matcher::{CssMediaMatcher, MediaMatcher};
use parking_lot::Mutex;
use serde::Serialize;
use shared::{
    domain::{MediaContext, Orientation, UpdateSeq, WatcherId},
    error::QueryError,
    events::{DimensionsChangeEvent, DimensionsEventKind, OrientationChangeEvent},
};
use tokio::{runtime::Handle, task::JoinHandle};
use tracing::{debug, warn};

static NEXT_WATCHER_ID: AtomicU64 = AtomicU64::new(1);

/// Callback invoked with the watcher whose context changed.
///
/// Listeners are compared by `Arc` address, so keep the `Arc` around to
/// remove the listener later.
pub type Listener = Arc<dyn Fn(&QueryWatcher) + Send + Sync>;

pub fn listener(callback: impl Fn(&QueryWatcher) + Send + Sync + 'static) -> Listener {
    Arc::new(callback)
}

/// The device collaborators every watcher is built from.
#[derive(Clone)]
pub struct MediaEnvironment {
    pub orientation: Arc<dyn OrientationSource>,
    pub viewport: Arc<dyn ViewportSource>,
    pub matcher: Arc<dyn MediaMatcher>,
}

impl MediaEnvironment {
    pub fn new(
        orientation: Arc<dyn OrientationSource>,
        viewport: Arc<dyn ViewportSource>,
    ) -> Self {
        Self {
            orientation,
            viewport,
            matcher: Arc::new(CssMediaMatcher),
        }
    }

    pub fn with_matcher(mut self, matcher: Arc<dyn MediaMatcher>) -> Self {
        self.matcher = matcher;
        self
    }
}

#[derive(Debug, Clone, Copy)]
enum UpdateOrigin {
    Probe,
    Change,
}

struct OrientationState {
    orientation: Orientation,
    /// Sequence number of the last applied update; 0 before any.
    last_applied: u64,
    unmounted: bool,
}

/// Serializable view of a watcher at one instant.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WatcherSnapshot {
    pub id: WatcherId,
    pub query: String,
    pub orientation: Orientation,
    pub width: f64,
    pub height: f64,
    pub matches: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub listeners: usize,
    pub unmounted: bool,
}

/// Live state of one media query.
///
/// Orientation updates are stamped with a sequence number when they are
/// issued: the initial probe at construction, change events on receipt. An
/// update older than the last applied one is dropped, so a slow probe cannot
/// overwrite a newer change event.
///
/// The callbacks registered with both device sources own the watcher, so it
/// stays mounted after every caller handle is gone. Only
/// [`QueryWatcher::unmount`] releases it.
pub struct QueryWatcher {
    id: WatcherId,
    query: String,
    viewport: Arc<dyn ViewportSource>,
    matcher: Arc<dyn MediaMatcher>,
    state: Mutex<OrientationState>,
    next_seq: AtomicU64,
    listeners: CallbackList<dyn Fn(&QueryWatcher) + Send + Sync>,
    subscription: Mutex<Option<Subscription>>,
    on_resize: Mutex<Option<DimensionsCallback>>,
    probe: Mutex<Option<JoinHandle<()>>>,
}

impl QueryWatcher {
    /// Creates a watcher and subscribes it to both device sources.
    ///
    /// The initial orientation probe is spawned on `runtime`, or on the
    /// current tokio runtime when `None`. Without any runtime the probe is
    /// skipped and the watcher starts from [`Orientation::Portrait`].
    pub fn new(
        query: impl Into<String>,
        environment: &MediaEnvironment,
        runtime: Option<&Handle>,
    ) -> Arc<Self> {
        let watcher = Arc::new(Self {
            id: WatcherId(NEXT_WATCHER_ID.fetch_add(1, Ordering::Relaxed)),
            query: query.into(),
            viewport: Arc::clone(&environment.viewport),
            matcher: Arc::clone(&environment.matcher),
            state: Mutex::new(OrientationState {
                orientation: Orientation::default(),
                last_applied: 0,
                unmounted: false,
            }),
            next_seq: AtomicU64::new(1),
            listeners: CallbackList::new(),
            subscription: Mutex::new(None),
            on_resize: Mutex::new(None),
            probe: Mutex::new(None),
        });

        let probe_seq = watcher.reserve_seq();
        watcher.start_probe(probe_seq, &environment.orientation, runtime);

        let owner = Arc::clone(&watcher);
        let subscription = environment.orientation.on_orientation_change(Arc::new(
            move |event: &OrientationChangeEvent| owner.handle_orientation_change(event),
        ));
        *watcher.subscription.lock() = Some(subscription);

        let owner = Arc::clone(&watcher);
        let on_resize: DimensionsCallback =
            Arc::new(move |event: &DimensionsChangeEvent| owner.handle_resize(event));
        environment
            .viewport
            .add_dimensions_listener(DimensionsEventKind::Change, Arc::clone(&on_resize));
        *watcher.on_resize.lock() = Some(on_resize);

        debug!(watcher = watcher.id.0, query = %watcher.query, "query watcher mounted");
        watcher
    }

    pub fn id(&self) -> WatcherId {
        self.id
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    /// Last known device orientation.
    pub fn orientation(&self) -> Orientation {
        self.state.lock().orientation
    }

    /// Appends `listener`. Registering the same listener twice makes it fire
    /// twice per change; nothing is invoked at registration time.
    pub fn add_listener(&self, listener: Listener) {
        self.listeners.push(listener);
    }

    /// Removes the first registration of `listener`. Unknown listeners are
    /// ignored.
    pub fn remove_listener(&self, listener: &Listener) {
        self.listeners.remove_first(listener);
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }

    /// Whether the query matches the current device state.
    ///
    /// Evaluated on every call against the live window size. A query the
    /// matcher rejects never matches.
    pub fn matches(&self) -> bool {
        match self.evaluate() {
            Ok(matches) => matches,
            Err(err) => {
                warn!(watcher = self.id.0, query = %self.query, error = %err, "media query rejected");
                false
            }
        }
    }

    /// Like [`QueryWatcher::matches`] but surfaces matcher errors.
    pub fn evaluate(&self) -> Result<bool, QueryError> {
        self.matcher.matches(&self.query, &self.context())
    }

    /// The feature context the query is evaluated against right now.
    pub fn context(&self) -> MediaContext {
        MediaContext::screen(self.orientation(), self.viewport.window_size())
    }

    pub fn snapshot(&self) -> WatcherSnapshot {
        let context = self.context();
        let (matches, error) = match self.matcher.matches(&self.query, &context) {
            Ok(matches) => (matches, None),
            Err(err) => (false, Some(err.to_string())),
        };
        WatcherSnapshot {
            id: self.id,
            query: self.query.clone(),
            orientation: context.orientation.unwrap_or_default(),
            width: context.width.unwrap_or_default(),
            height: context.height.unwrap_or_default(),
            matches,
            error,
            listeners: self.listener_count(),
            unmounted: self.is_unmounted(),
        }
    }

    /// Detaches from both device sources and cancels a pending probe.
    ///
    /// Listeners stay registered; the watcher just stops calling them. A
    /// listener already running on another thread is allowed to finish.
    pub fn unmount(&self) {
        self.state.lock().unmounted = true;
        self.release();
        debug!(watcher = self.id.0, "query watcher unmounted");
    }

    pub fn is_unmounted(&self) -> bool {
        self.state.lock().unmounted
    }

    fn release(&self) {
        let subscription = self.subscription.lock().take();
        if let Some(mut subscription) = subscription {
            subscription.remove();
        }
        if let Some(probe) = self.probe.lock().take() {
            probe.abort();
        }
        let on_resize = self.on_resize.lock().take();
        if let Some(on_resize) = on_resize {
            self.viewport
                .remove_dimensions_listener(DimensionsEventKind::Change, &on_resize);
        }
    }

    fn reserve_seq(&self) -> UpdateSeq {
        UpdateSeq(self.next_seq.fetch_add(1, Ordering::SeqCst))
    }

    fn start_probe(
        self: &Arc<Self>,
        seq: UpdateSeq,
        source: &Arc<dyn OrientationSource>,
        runtime: Option<&Handle>,
    ) {
        let runtime = match runtime {
            Some(handle) => handle.clone(),
            None => match Handle::try_current() {
                Ok(handle) => handle,
                Err(_) => {
                    warn!(
                        watcher = self.id.0,
                        "no async runtime available; initial orientation probe skipped"
                    );
                    return;
                }
            },
        };

        let weak = Arc::downgrade(self);
        let source = Arc::clone(source);
        let task = runtime.spawn(async move {
            let result = source.current_orientation().await;
            let Some(watcher) = weak.upgrade() else {
                return;
            };
            match result {
                Ok(orientation) => watcher.apply_orientation(seq, orientation, UpdateOrigin::Probe),
                Err(err) => warn!(
                    watcher = watcher.id.0,
                    error = %err,
                    "initial orientation probe failed"
                ),
            }
        });
        *self.probe.lock() = Some(task);
    }

    fn handle_orientation_change(&self, event: &OrientationChangeEvent) {
        let seq = self.reserve_seq();
        self.apply_orientation(seq, event.orientation(), UpdateOrigin::Change);
    }

    fn handle_resize(&self, event: &DimensionsChangeEvent) {
        if self.is_unmounted() {
            return;
        }
        debug!(
            watcher = self.id.0,
            width = event.window.width,
            height = event.window.height,
            "window resized"
        );
        self.notify_listeners();
    }

    fn apply_orientation(&self, seq: UpdateSeq, orientation: Orientation, origin: UpdateOrigin) {
        {
            let mut state = self.state.lock();
            if state.unmounted {
                debug!(watcher = self.id.0, ?origin, "ignoring orientation update after unmount");
                return;
            }
            if seq.0 <= state.last_applied {
                debug!(
                    watcher = self.id.0,
                    ?origin,
                    seq = seq.0,
                    last_applied = state.last_applied,
                    "dropping stale orientation update"
                );
                return;
            }
            state.last_applied = seq.0;
            state.orientation = orientation;
        }

        debug!(watcher = self.id.0, ?origin, orientation = %orientation, "orientation updated");
        self.notify_listeners();
    }

    /// Calls every listener, in registration order, on a snapshot of the
    /// listener list. Panics propagate and skip the remaining listeners.
    /// Delivery stops as soon as the watcher is unmounted.
    fn notify_listeners(&self) {
        for listener in self.listeners.snapshot() {
            if self.is_unmounted() {
                debug!(watcher = self.id.0, "notification cut short by unmount");
                return;
            }
            listener(self);
        }
    }
}

impl fmt::Debug for QueryWatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QueryWatcher")
            .field("id", &self.id)
            .field("query", &self.query)
            .field("orientation", &self.orientation())
            .field("listeners", &self.listener_count())
            .field("unmounted", &self.is_unmounted())
            .finish()
    }
}

#[cfg(test)]
#[path = "tests/watcher_tests.rs"]
mod tests;
