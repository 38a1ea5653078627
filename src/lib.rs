//! # matchcast - content-based in-memory publish/subscribe
//!
//! Producers push structured items into a [`Router`]; consumers register an
//! [`Expression`] and receive every item that matches it. A consumer that
//! registers after an item was published still receives the router's most
//! recent item if it matches.
//!
//! ## Core Concepts
//!
//! - **Value / Item**: schema-less structured data (records, dictionaries, scalars)
//! - **Expression**: a conjunctive predicate over field paths (`$f`, `$eq`, `$gt`, ...)
//! - **Consumer**: anything that accepts items and carries a [`Lifecycle`]
//! - **Router**: the registry that matches items to consumers and dispatches them
//!
//! ## Usage
//!
//! ```rust
//! use std::sync::Arc;
//! use matchcast::{Consumer, Expression, Listener, Record, Router, RouterConfig, Value};
//!
//! let router = Router::new(RouterConfig::default().with_alias_key("json"));
//!
//! let detail = Record::new("Detail").with_aliased("Age", [("json", "age")], 19);
//! let msg = Record::new("Msg").with("Name", "ok").with_aliased("Detail", [("json", "detail")], detail);
//! router.input(Arc::new(Value::from(msg))).unwrap();
//!
//! let expr = Expression::from_json_str(
//!     r#"{"$f":{"Name":{"$eq":"ok"},"detail.age":{"$gt":18,"$lt":31}}}"#,
//! )
//! .unwrap();
//! let listener = Arc::new(Listener::new(|item| println!("got {item}")));
//!
//! // The cached item matches, so it is replayed before `select` returns.
//! router.select(expr, listener.clone()).unwrap();
//! assert!(listener.last().is_some());
//!
//! // Destroying the listener removes it from the router.
//! listener.destroy();
//! assert!(router.is_empty());
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod consumer;
pub mod error;
pub mod expr;
pub mod lifecycle;
pub mod listener;
pub mod router;
pub mod value;

#[doc(hidden)]
pub mod observability;

// Re-export primary types at crate root for convenience
pub use consumer::Consumer;
pub use error::{DeliveryError, RouterError, RouterResult, ValidationError};
pub use expr::{Evaluator, Expression, Operator, OperatorFn, OperatorTable};
pub use lifecycle::{ConsumerId, DestroyCallback, DestroyHook, Lifecycle};
pub use listener::{Listener, OnData};
#[cfg(feature = "tokio")]
pub use router::TokioSpawner;
pub use router::{Job, Router, RouterConfig, Spawner, ThreadSpawner};
pub use value::{Item, Member, Record, Value};
