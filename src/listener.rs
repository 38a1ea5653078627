//! Minimal callback consumer.

use std::fmt;
use std::sync::Arc;

use crate::consumer::Consumer;
use crate::error::RouterResult;
use crate::lifecycle::Lifecycle;
use crate::value::Item;

/// Callback invoked with every item a [`Listener`] accepts.
pub type OnData = Box<dyn Fn(&Item) + Send + Sync>;

/// A consumer that hands each accepted item to a callback.
///
/// A listener without a callback accepts everything as a no-op and does not
/// update its last value.
pub struct Listener {
    lifecycle: Lifecycle,
    on_data: Option<OnData>,
}

impl Listener {
    /// A listener that calls `on_data` for every accepted item.
    #[must_use]
    pub fn new(on_data: impl Fn(&Item) + Send + Sync + 'static) -> Self {
        Self {
            lifecycle: Lifecycle::new(),
            on_data: Some(Box::new(on_data)),
        }
    }

    /// A listener with no callback.
    #[must_use]
    pub fn noop() -> Self {
        Self {
            lifecycle: Lifecycle::new(),
            on_data: None,
        }
    }
}

impl Default for Listener {
    fn default() -> Self {
        Self::noop()
    }
}

impl fmt::Debug for Listener {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Listener")
            .field("lifecycle", &self.lifecycle)
            .field("has_callback", &self.on_data.is_some())
            .finish()
    }
}

impl Consumer for Listener {
    fn lifecycle(&self) -> &Lifecycle {
        &self.lifecycle
    }

    fn input(&self, item: Item) -> RouterResult<()> {
        let Some(on_data) = self.on_data.as_ref() else {
            return Ok(());
        };
        self.lifecycle.set_last(Arc::clone(&item));
        on_data(&item);
        Ok(())
    }
}
