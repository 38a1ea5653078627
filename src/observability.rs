//! Canonical structured event names emitted by `matchcast`.
//!
//! Events go through `tracing`. The library never installs a subscriber;
//! binaries and tests do that at process boundaries.

// Broadcast path.
pub const ROUTER_INPUT: &str = "router_input";
pub const ROUTER_INPUT_REJECTED: &str = "router_input_rejected";
pub const DISPATCH_FAILED: &str = "dispatch_failed";
pub const DISPATCH_SPAWN_FAILED: &str = "dispatch_spawn_failed";
pub const DISPATCH_THREAD_NAME_REJECTED: &str = "dispatch_thread_name_rejected";

// Registration lifecycle.
pub const SELECT_OK: &str = "select_ok";
pub const SELECT_REJECTED: &str = "select_rejected";
pub const SELECT_REPLAY: &str = "select_replay";
pub const SELECT_REPLAY_FAILED: &str = "select_replay_failed";
pub const UNSELECT: &str = "unselect";
pub const AUTO_UNSELECT: &str = "auto_unselect";
pub const ROUTER_DRAINED: &str = "router_drained";
