//! Ordered callback storage with snapshot-on-emit semantics.
//!
//! - A callback removed during emission is still called in that round.
//! - A callback added during emission is not called until the next round.
//!
//! The lock is never held while callbacks run, so callbacks may register or
//! remove callbacks on the same list. Panics propagate to the emitter.

use std::sync::{
    atomic::{AtomicU64, Ordering},
    Arc,
};

use parking_lot::Mutex;

pub type CallbackId = u64;

pub struct CallbackList<F: ?Sized> {
    entries: Mutex<Vec<(CallbackId, Arc<F>)>>,
    next_id: AtomicU64,
}

impl<F: ?Sized> CallbackList<F> {
    pub fn new() -> Self {
        Self {
            entries: Mutex::new(Vec::new()),
            next_id: AtomicU64::new(1),
        }
    }

    /// Appends `callback`. The same `Arc` may be added more than once.
    pub fn push(&self, callback: Arc<F>) -> CallbackId {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        self.entries.lock().push((id, callback));
        id
    }

    pub fn remove_id(&self, id: CallbackId) -> bool {
        let mut entries = self.entries.lock();
        match entries.iter().position(|(entry_id, _)| *entry_id == id) {
            Some(index) => {
                entries.remove(index);
                true
            }
            None => false,
        }
    }

    /// Removes the first registration of `callback`, compared by address.
    pub fn remove_first(&self, callback: &Arc<F>) -> bool {
        let mut entries = self.entries.lock();
        let target = Arc::as_ptr(callback);
        match entries
            .iter()
            .position(|(_, entry)| std::ptr::addr_eq(Arc::as_ptr(entry), target))
        {
            Some(index) => {
                entries.remove(index);
                true
            }
            None => false,
        }
    }

    /// Callbacks in insertion order, detached from the list.
    pub fn snapshot(&self) -> Vec<Arc<F>> {
        self.entries
            .lock()
            .iter()
            .map(|(_, callback)| Arc::clone(callback))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }
}

impl<F: ?Sized> Default for CallbackList<F> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    type Callback = dyn Fn(&mut Vec<&'static str>) + Send + Sync;

    #[test]
    fn snapshot_preserves_insertion_order_and_duplicates() {
        let list: CallbackList<Callback> = CallbackList::new();
        let a: Arc<Callback> = Arc::new(|log: &mut Vec<&'static str>| log.push("a"));
        let b: Arc<Callback> = Arc::new(|log: &mut Vec<&'static str>| log.push("b"));
        list.push(Arc::clone(&a));
        list.push(b);
        list.push(Arc::clone(&a));

        let mut log = Vec::new();
        for callback in list.snapshot() {
            callback(&mut log);
        }
        assert_eq!(log, vec!["a", "b", "a"]);
    }

    #[test]
    fn remove_first_drops_only_one_registration() {
        let list: CallbackList<Callback> = CallbackList::new();
        let a: Arc<Callback> = Arc::new(|log: &mut Vec<&'static str>| log.push("a"));
        list.push(Arc::clone(&a));
        list.push(Arc::clone(&a));

        assert!(list.remove_first(&a));
        assert_eq!(list.len(), 1);
        assert!(list.remove_first(&a));
        assert!(!list.remove_first(&a));
        assert!(list.is_empty());
    }

    #[test]
    fn remove_id_targets_one_entry() {
        let list: CallbackList<Callback> = CallbackList::new();
        let a: Arc<Callback> = Arc::new(|log: &mut Vec<&'static str>| log.push("a"));
        let first = list.push(Arc::clone(&a));
        list.push(a);

        assert!(list.remove_id(first));
        assert!(!list.remove_id(first));
        assert_eq!(list.len(), 1);
    }
}
