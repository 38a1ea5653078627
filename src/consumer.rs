//! The capability set every selectable participant implements.

use crate::error::RouterResult;
use crate::lifecycle::{ConsumerId, DestroyCallback, DestroyHook, Lifecycle};
use crate::value::Item;

/// A participant that can be registered with a [`Router`](crate::Router).
///
/// Implementors embed a [`Lifecycle`] and provide [`input`](Self::input);
/// identity, last-value access and destroy notification default to the
/// embedded lifecycle.
///
/// `input` may be called from any thread, concurrently with itself.
pub trait Consumer: Send + Sync {
    /// The embedded lifecycle.
    fn lifecycle(&self) -> &Lifecycle;

    /// Accepts an item.
    fn input(&self, item: Item) -> RouterResult<()>;

    /// Registry identity.
    fn id(&self) -> ConsumerId {
        self.lifecycle().id()
    }

    /// The last item this consumer accepted.
    fn last(&self) -> Option<Item> {
        self.lifecycle().last()
    }

    /// Runs the consumer's destroy callbacks.
    fn destroy(&self) {
        self.lifecycle().destroy();
    }

    /// Registers a destroy callback.
    fn on_destroy(&self, callback: DestroyCallback) -> DestroyHook {
        self.lifecycle().on_destroy(callback)
    }

    /// Removes a destroy callback registered with [`on_destroy`](Self::on_destroy).
    fn remove_destroy_hook(&self, hook: DestroyHook) -> bool {
        self.lifecycle().remove_destroy_hook(hook)
    }
}
