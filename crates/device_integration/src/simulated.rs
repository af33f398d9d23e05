//! In-memory device sources for tests and the simulator app.

use std::sync::Arc;

use anyhow::anyhow;
use async_trait::async_trait;
use parking_lot::Mutex;
use shared::{
    domain::{Orientation, WindowSize},
    events::{DimensionsChangeEvent, DimensionsEventKind, OrientationChangeEvent},
};
use tokio::sync::watch;
use tracing::debug;

use crate::{
    callbacks::CallbackList, DimensionsCallback, OrientationCallback, OrientationSource,
    Subscription, ViewportSource,
};

type OrientationListeners = CallbackList<dyn Fn(&OrientationChangeEvent) + Send + Sync>;

/// Orientation sensor whose state is driven by the caller.
///
/// A probe started through [`OrientationSource::current_orientation`] reads
/// the orientation when it is issued, then waits for the probe gate. Holding
/// the gate lets a test deliver change events before an older probe resolves.
pub struct SimulatedOrientationSource {
    orientation: Mutex<Orientation>,
    probe_failure: Mutex<Option<String>>,
    probe_gate: watch::Sender<bool>,
    listeners: Arc<OrientationListeners>,
}

impl SimulatedOrientationSource {
    pub fn new(initial: Orientation) -> Arc<Self> {
        let (probe_gate, _) = watch::channel(true);
        Arc::new(Self {
            orientation: Mutex::new(initial),
            probe_failure: Mutex::new(None),
            probe_gate,
            listeners: Arc::new(CallbackList::new()),
        })
    }

    pub fn orientation(&self) -> Orientation {
        *self.orientation.lock()
    }

    /// Changes the orientation future probes report without notifying anyone.
    pub fn set_orientation(&self, orientation: Orientation) {
        *self.orientation.lock() = orientation;
    }

    /// Changes the orientation and dispatches a change event.
    pub fn rotate_to(&self, orientation: Orientation) {
        self.set_orientation(orientation);
        let event = OrientationChangeEvent::new(orientation);
        let listeners = self.listeners.snapshot();
        debug!(
            orientation = %orientation,
            listeners = listeners.len(),
            "simulated orientation change"
        );
        for listener in listeners {
            listener(&event);
        }
    }

    pub fn hold_probes(&self) {
        self.probe_gate.send_replace(false);
    }

    pub fn release_probes(&self) {
        self.probe_gate.send_replace(true);
    }

    /// Makes probes issued from now on fail with `message`.
    pub fn fail_probes(&self, message: impl Into<String>) {
        *self.probe_failure.lock() = Some(message.into());
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }
}

#[async_trait]
impl OrientationSource for SimulatedOrientationSource {
    async fn current_orientation(&self) -> anyhow::Result<Orientation> {
        let orientation = self.orientation();
        let failure = self.probe_failure.lock().clone();

        let mut gate = self.probe_gate.subscribe();
        loop {
            let open = *gate.borrow_and_update();
            if open {
                break;
            }
            gate.changed()
                .await
                .map_err(|_| anyhow!("orientation sensor shut down"))?;
        }

        match failure {
            Some(message) => Err(anyhow!(message)),
            None => Ok(orientation),
        }
    }

    fn on_orientation_change(&self, callback: OrientationCallback) -> Subscription {
        let id = self.listeners.push(callback);
        let listeners = Arc::downgrade(&self.listeners);
        Subscription::new(move || {
            if let Some(listeners) = listeners.upgrade() {
                listeners.remove_id(id);
            }
        })
    }
}

type DimensionsListeners = CallbackList<dyn Fn(&DimensionsChangeEvent) + Send + Sync>;

/// Window whose size is driven by the caller.
pub struct SimulatedViewport {
    size: Mutex<WindowSize>,
    listeners: DimensionsListeners,
}

impl SimulatedViewport {
    pub fn new(width: f64, height: f64) -> Arc<Self> {
        Arc::new(Self {
            size: Mutex::new(WindowSize::new(width, height)),
            listeners: CallbackList::new(),
        })
    }

    /// Updates the window size without dispatching an event.
    pub fn set_size(&self, width: f64, height: f64) {
        *self.size.lock() = WindowSize::new(width, height);
    }

    /// Updates the window size and dispatches a `change` event.
    pub fn resize(&self, width: f64, height: f64) {
        let window = WindowSize::new(width, height);
        *self.size.lock() = window;
        let event = DimensionsChangeEvent { window };
        let listeners = self.listeners.snapshot();
        debug!(width, height, listeners = listeners.len(), "simulated resize");
        for listener in listeners {
            listener(&event);
        }
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }
}

impl ViewportSource for SimulatedViewport {
    fn window_size(&self) -> WindowSize {
        *self.size.lock()
    }

    fn add_dimensions_listener(&self, kind: DimensionsEventKind, callback: DimensionsCallback) {
        match kind {
            DimensionsEventKind::Change => {
                self.listeners.push(callback);
            }
        }
    }

    fn remove_dimensions_listener(&self, kind: DimensionsEventKind, callback: &DimensionsCallback) {
        match kind {
            DimensionsEventKind::Change => {
                self.listeners.remove_first(callback);
            }
        }
    }
}
