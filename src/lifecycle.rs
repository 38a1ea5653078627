//! Lifecycle shared by every participant: the router and each consumer.
//!
//! A [`Lifecycle`] holds the participant's identity, the most recently
//! accepted item, and an ordered list of destroy callbacks. Destroying a
//! lifecycle only notifies; the cached item stays readable and writable.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::value::Item;

/// Identity of a participant. Registry keys use this, never value equality.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConsumerId(Uuid);

impl ConsumerId {
    /// Create a new random consumer id.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// The unset id. The router refuses to register a consumer that reports it.
    #[must_use]
    pub const fn nil() -> Self {
        Self(Uuid::nil())
    }

    /// Wrap an existing UUID.
    #[must_use]
    pub const fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Whether this is the unset id.
    #[must_use]
    pub fn is_nil(&self) -> bool {
        self.0.is_nil()
    }
}

impl Default for ConsumerId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ConsumerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Zero-argument callback run when a participant is destroyed.
pub type DestroyCallback = Box<dyn Fn() + Send + Sync>;

type SharedCallback = Arc<dyn Fn() + Send + Sync>;

/// Handle to one registered destroy callback, used to remove it again.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DestroyHook(u64);

// Every critical section below leaves its state consistent, so a poisoned lock
// is safe to keep using.
fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Last-value cache plus destroy notification.
///
/// All operations are safe to call concurrently from any thread.
pub struct Lifecycle {
    id: ConsumerId,
    last: Mutex<Option<Item>>,
    // Kept sorted by hook key; keys only ever grow.
    callbacks: Mutex<Vec<(DestroyHook, SharedCallback)>>,
    next_hook: AtomicU64,
    // Serializes destroy passes against each other.
    destroy_pass: Mutex<()>,
}

impl Lifecycle {
    /// Creates a lifecycle with a fresh id and an empty cache.
    #[must_use]
    pub fn new() -> Self {
        Self::with_id(ConsumerId::new())
    }

    /// Creates a lifecycle that reports the given id.
    #[must_use]
    pub fn with_id(id: ConsumerId) -> Self {
        Self {
            id,
            last: Mutex::new(None),
            callbacks: Mutex::new(Vec::new()),
            next_hook: AtomicU64::new(0),
            destroy_pass: Mutex::new(()),
        }
    }

    /// Identity reported by this lifecycle.
    #[must_use]
    pub const fn id(&self) -> ConsumerId {
        self.id
    }

    /// Replaces the cached item.
    pub fn set_last(&self, item: Item) {
        *lock(&self.last) = Some(item);
    }

    /// The most recently cached item, if any.
    #[must_use]
    pub fn last(&self) -> Option<Item> {
        lock(&self.last).clone()
    }

    /// Appends a callback to run on [`destroy`](Self::destroy).
    ///
    /// Callbacks stay registered across passes until removed with
    /// [`remove_destroy_hook`](Self::remove_destroy_hook).
    pub fn on_destroy(&self, callback: DestroyCallback) -> DestroyHook {
        let mut callbacks = lock(&self.callbacks);
        // Allocated under the lock so the list stays sorted.
        let hook = DestroyHook(self.next_hook.fetch_add(1, Ordering::Relaxed));
        callbacks.push((hook, Arc::from(callback)));
        hook
    }

    /// Removes a callback. Returns whether it was still registered.
    ///
    /// Safe to call from inside a running destroy pass, including from the
    /// callback being removed.
    pub fn remove_destroy_hook(&self, hook: DestroyHook) -> bool {
        let mut callbacks = lock(&self.callbacks);
        match callbacks.binary_search_by_key(&hook, |(h, _)| *h) {
            Ok(pos) => {
                callbacks.remove(pos);
                true
            }
            Err(_) => false,
        }
    }

    /// Number of registered destroy callbacks.
    #[must_use]
    pub fn destroy_callbacks(&self) -> usize {
        lock(&self.callbacks).len()
    }

    /// Runs every destroy callback in registration order.
    ///
    /// Callbacks appended while the pass is running, including from inside a
    /// callback, are run by the same pass. The callback list lock is not held
    /// while a callback runs, so callbacks may call back into this lifecycle.
    /// A callback must not destroy its own participant.
    pub fn destroy(&self) {
        let _pass = lock(&self.destroy_pass);
        let mut ran: Option<DestroyHook> = None;
        loop {
            // Resume after the last hook run, so removals and additions made
            // by a callback neither skip nor repeat anything.
            let (hook, callback) = {
                let callbacks = lock(&self.callbacks);
                let pos = ran.map_or(0, |last| callbacks.partition_point(|(h, _)| *h <= last));
                match callbacks.get(pos) {
                    Some((h, cb)) => (*h, Arc::clone(cb)),
                    None => break,
                }
            };
            callback();
            ran = Some(hook);
        }
    }
}

impl Default for Lifecycle {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Lifecycle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Lifecycle")
            .field("id", &self.id)
            .field("last", &self.last())
            .field("destroy_callbacks", &self.destroy_callbacks())
            .finish()
    }
}
