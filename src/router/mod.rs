//! The content-based router.
//!
//! A [`Router`] keeps a concurrent registry of consumers and the expression
//! each one selected. Every accepted item is matched against every registered
//! expression and handed to each matching consumer as an independent job.
//! Registration replays the router's last item to the new consumer when it
//! already matches, and installs a destroy hook so the consumer leaves the
//! registry on its own when it is destroyed.

pub mod config;
pub mod dispatch;

use std::fmt;
use std::sync::Arc;

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use tracing::{debug, warn};

use crate::consumer::Consumer;
use crate::error::{DeliveryError, RouterError, RouterResult, ValidationError};
use crate::expr::{Evaluator, Expression, OperatorTable};
use crate::lifecycle::{ConsumerId, DestroyHook, Lifecycle};
use crate::observability as events;
use crate::value::Item;

pub use config::RouterConfig;
#[cfg(feature = "tokio")]
pub use dispatch::TokioSpawner;
pub use dispatch::{Job, Spawner, ThreadSpawner};

const COMPONENT: &str = "router";

struct Registration {
    consumer: Arc<dyn Consumer>,
    expression: Arc<Expression>,
    // Auto-unselect callback installed on `consumer`.
    hook: DestroyHook,
}

impl Registration {
    fn release(self) -> Arc<dyn Consumer> {
        self.consumer.remove_destroy_hook(self.hook);
        self.consumer
    }
}

type Registry = DashMap<ConsumerId, Registration>;

/// Marks a consumer id as being selected. Dropping it releases the id.
struct Reservation<'a> {
    pending: &'a DashMap<ConsumerId, ()>,
    id: ConsumerId,
}

impl Drop for Reservation<'_> {
    fn drop(&mut self) {
        self.pending.remove(&self.id);
    }
}

/// Content-based publish/subscribe router.
///
/// `Router` is itself a [`Consumer`], so one router can be selected into
/// another. Its inherent [`destroy`](Router::destroy) drains the registry;
/// [`Consumer::destroy`] runs the router's own destroy callbacks. The two are
/// independent.
///
/// # Examples
///
/// ```
/// use std::sync::Arc;
/// use matchcast::{Expression, Listener, Router, RouterConfig, Value};
///
/// let router = Router::new(RouterConfig::default());
/// let adults = Arc::new(Listener::new(|item| println!("adult: {item}")));
///
/// router
///     .select(Expression::new().field("age", Expression::new().gte(18)), adults.clone())
///     .unwrap();
/// router.input(Arc::new(Value::map([("age", 21)]))).unwrap();
/// assert_eq!(router.len(), 1);
/// ```
pub struct Router {
    lifecycle: Lifecycle,
    registry: Arc<Registry>,
    // Ids with a select in flight, between the duplicate check and the insert.
    pending: DashMap<ConsumerId, ()>,
    evaluator: Evaluator,
    spawner: Arc<dyn Spawner>,
}

impl Router {
    /// Creates a router that dispatches on detached threads.
    #[must_use]
    pub fn new(cfg: RouterConfig) -> Self {
        let spawner = Arc::new(ThreadSpawner::new(cfg.dispatch_thread_name));
        Self {
            lifecycle: Lifecycle::new(),
            registry: Arc::new(DashMap::new()),
            pending: DashMap::new(),
            evaluator: Evaluator::new(OperatorTable::shared_standard(), cfg.alias_key),
            spawner,
        }
    }

    /// Replaces the spawner used for delivery and drain jobs.
    #[must_use]
    pub fn with_spawner(mut self, spawner: Arc<dyn Spawner>) -> Self {
        self.spawner = spawner;
        self
    }

    /// Replaces the operator table, keeping the configured alias scheme.
    #[must_use]
    pub fn with_operators(mut self, table: Arc<OperatorTable>) -> Self {
        let alias_key = self.evaluator.alias_key().map(str::to_string);
        self.evaluator = Evaluator::new(table, alias_key);
        self
    }

    /// Identity of this router as a consumer.
    #[must_use]
    pub const fn id(&self) -> ConsumerId {
        self.lifecycle.id()
    }

    /// The last item accepted by [`input`](Self::input).
    #[must_use]
    pub fn last(&self) -> Option<Item> {
        self.lifecycle.last()
    }

    /// The evaluator applied to every registration.
    #[must_use]
    pub const fn evaluator(&self) -> &Evaluator {
        &self.evaluator
    }

    /// Number of registered consumers.
    #[must_use]
    pub fn len(&self) -> usize {
        self.registry.len()
    }

    /// Whether no consumer is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.registry.is_empty()
    }

    /// Whether `id` is registered.
    #[must_use]
    pub fn is_selected(&self, id: ConsumerId) -> bool {
        self.registry.contains_key(&id)
    }

    /// Accepts an item and dispatches it to every consumer whose expression
    /// matches.
    ///
    /// Returns as soon as the deliveries are spawned. Delivery order across
    /// consumers is unspecified, and a consumer's failure is logged but never
    /// returned here.
    ///
    /// # Errors
    ///
    /// [`ValidationError::NullItem`] if `item` is [`Value::Null`](crate::Value::Null).
    pub fn input(&self, item: Item) -> RouterResult<()> {
        if item.is_null() {
            debug!(
                event = events::ROUTER_INPUT_REJECTED,
                component = COMPONENT,
                router = %self.id(),
                "rejected null item"
            );
            return Err(ValidationError::NullItem.into());
        }
        self.lifecycle.set_last(Arc::clone(&item));

        let matched: Vec<Arc<dyn Consumer>> = self
            .registry
            .iter()
            .filter(|entry| self.evaluator.matches(&entry.expression, &item))
            .map(|entry| Arc::clone(&entry.consumer))
            .collect();

        debug!(
            event = events::ROUTER_INPUT,
            component = COMPONENT,
            router = %self.id(),
            registered = self.registry.len(),
            matched = matched.len(),
            "broadcasting item"
        );

        for consumer in matched {
            self.dispatch(consumer, Arc::clone(&item));
        }
        Ok(())
    }

    fn dispatch(&self, consumer: Arc<dyn Consumer>, item: Item) {
        self.spawner.spawn(Box::new(move || {
            if let Err(err) = consumer.input(item) {
                warn!(
                    event = events::DISPATCH_FAILED,
                    component = COMPONENT,
                    consumer = %consumer.id(),
                    error = %err,
                    "consumer failed to accept dispatched item"
                );
            }
        }));
    }

    /// Registers `consumer` with `expression`.
    ///
    /// If the router's last item matches, it is delivered to `consumer`
    /// before this call returns. Concurrent selects of one consumer are
    /// serialized on its id, so at most one of them replays and registers.
    /// A successful registration installs one destroy hook on `consumer`
    /// that removes it from this router; unselecting removes the hook again.
    ///
    /// # Errors
    ///
    /// - [`ValidationError::InvalidHandle`] if the consumer reports a nil id.
    /// - [`ValidationError::DuplicateHandle`] if it is already registered.
    /// - [`DeliveryError::Replay`] if the replay failed; nothing is registered.
    pub fn select(&self, expression: Expression, consumer: Arc<dyn Consumer>) -> RouterResult<()> {
        let id = consumer.id();
        if id.is_nil() {
            return Err(self.reject_select(ValidationError::InvalidHandle { id }));
        }
        // Checked after reserving: a select that released the id before us
        // has already inserted.
        let Some(_reservation) = self.reserve(id) else {
            return Err(self.reject_select(ValidationError::DuplicateHandle { id }));
        };
        if self.registry.contains_key(&id) {
            return Err(self.reject_select(ValidationError::DuplicateHandle { id }));
        }

        if let Some(last) = self.lifecycle.last() {
            if self.evaluator.matches(&expression, &last) {
                debug!(
                    event = events::SELECT_REPLAY,
                    component = COMPONENT,
                    router = %self.id(),
                    consumer = %id,
                    "replaying last item"
                );
                consumer.input(last).map_err(|source| {
                    warn!(
                        event = events::SELECT_REPLAY_FAILED,
                        component = COMPONENT,
                        router = %self.id(),
                        consumer = %id,
                        error = %source,
                        "replay failed, registration aborted"
                    );
                    DeliveryError::Replay {
                        id,
                        source: Box::new(source),
                    }
                })?;
            }
        }

        match self.registry.entry(id) {
            Entry::Occupied(_) => Err(self.reject_select(ValidationError::DuplicateHandle { id })),
            Entry::Vacant(slot) => {
                let registry = Arc::downgrade(&self.registry);
                let router = self.id();
                let hook = consumer.on_destroy(Box::new(move || {
                    if let Some(registry) = registry.upgrade() {
                        if let Some((_, reg)) = registry.remove(&id) {
                            reg.release();
                            debug!(
                                event = events::AUTO_UNSELECT,
                                component = COMPONENT,
                                router = %router,
                                consumer = %id,
                                "consumer destroyed, unselected"
                            );
                        }
                    }
                }));
                slot.insert(Registration {
                    consumer,
                    expression: Arc::new(expression),
                    hook,
                });
                debug!(
                    event = events::SELECT_OK,
                    component = COMPONENT,
                    router = %self.id(),
                    consumer = %id,
                    "consumer selected"
                );
                Ok(())
            }
        }
    }

    fn reserve(&self, id: ConsumerId) -> Option<Reservation<'_>> {
        match self.pending.entry(id) {
            Entry::Occupied(_) => None,
            Entry::Vacant(slot) => {
                slot.insert(());
                Some(Reservation {
                    pending: &self.pending,
                    id,
                })
            }
        }
    }

    fn reject_select(&self, err: ValidationError) -> RouterError {
        debug!(
            event = events::SELECT_REJECTED,
            component = COMPONENT,
            router = %self.id(),
            reason = %err,
            "select rejected"
        );
        err.into()
    }

    /// Removes the registration for `id` and its destroy hook. Returns
    /// whether one existed.
    pub fn unselect(&self, id: ConsumerId) -> bool {
        let removed = self
            .registry
            .remove(&id)
            .map(|(_, reg)| reg.release())
            .is_some();
        debug!(
            event = events::UNSELECT,
            component = COMPONENT,
            router = %self.id(),
            consumer = %id,
            removed,
            "unselect"
        );
        removed
    }

    /// Drains the registry and destroys every drained consumer on its own job.
    ///
    /// Each entry is removed exactly once even under concurrent drains. The
    /// router's own destroy callbacks are not run; see [`Consumer::destroy`].
    pub fn destroy(&self) {
        let mut drained: Vec<(Arc<dyn Consumer>, DestroyHook)> = Vec::new();
        self.registry.retain(|_, reg| {
            drained.push((Arc::clone(&reg.consumer), reg.hook));
            false
        });
        let drained: Vec<Arc<dyn Consumer>> = drained
            .into_iter()
            .map(|(consumer, hook)| {
                consumer.remove_destroy_hook(hook);
                consumer
            })
            .collect();

        debug!(
            event = events::ROUTER_DRAINED,
            component = COMPONENT,
            router = %self.id(),
            drained = drained.len(),
            "registry drained"
        );

        for consumer in drained {
            self.spawner.spawn(Box::new(move || consumer.destroy()));
        }
    }
}

impl Default for Router {
    fn default() -> Self {
        Self::new(RouterConfig::default())
    }
}

impl fmt::Debug for Router {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Router")
            .field("id", &self.id())
            .field("registered", &self.registry.len())
            .field("evaluator", &self.evaluator)
            .finish_non_exhaustive()
    }
}

impl Consumer for Router {
    fn lifecycle(&self) -> &Lifecycle {
        &self.lifecycle
    }

    fn input(&self, item: Item) -> RouterResult<()> {
        Self::input(self, item)
    }
}
