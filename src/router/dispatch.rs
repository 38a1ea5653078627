//! Units of work for fire-and-forget delivery.
//!
//! The router hands every matched delivery to a [`Spawner`] as one
//! independent job. Spawners never block the caller on the job and never
//! report the job's outcome back.

use std::thread;

use tracing::warn;

use crate::observability as events;

use super::config::DEFAULT_DISPATCH_THREAD_NAME;

const COMPONENT: &str = "dispatch";

/// A unit of delivery work.
pub type Job = Box<dyn FnOnce() + Send + 'static>;

/// Runs jobs independently of the caller.
pub trait Spawner: Send + Sync {
    /// Starts `job` without waiting for it.
    fn spawn(&self, job: Job);
}

/// Runs each job on its own detached OS thread.
#[derive(Debug, Clone)]
pub struct ThreadSpawner {
    thread_name: Option<String>,
}

impl ThreadSpawner {
    /// Names every spawned thread `thread_name`.
    ///
    /// Thread names cannot contain NUL; such a name is dropped and the
    /// threads are left unnamed.
    #[must_use]
    pub fn new(thread_name: impl Into<String>) -> Self {
        let thread_name = thread_name.into();
        if thread_name.contains('\0') {
            warn!(
                event = events::DISPATCH_THREAD_NAME_REJECTED,
                component = COMPONENT,
                thread_name = ?thread_name,
                "thread name contains NUL, spawning unnamed threads"
            );
            return Self { thread_name: None };
        }
        Self {
            thread_name: Some(thread_name),
        }
    }

    /// Name given to spawned threads, if any.
    #[must_use]
    pub fn thread_name(&self) -> Option<&str> {
        self.thread_name.as_deref()
    }
}

impl Default for ThreadSpawner {
    fn default() -> Self {
        Self::new(DEFAULT_DISPATCH_THREAD_NAME)
    }
}

impl Spawner for ThreadSpawner {
    fn spawn(&self, job: Job) {
        let mut builder = thread::Builder::new();
        if let Some(name) = &self.thread_name {
            builder = builder.name(name.clone());
        }
        let spawned = builder.spawn(job);
        // The job is lost with the failed spawn; delivery is best-effort.
        if let Err(err) = spawned {
            warn!(
                event = events::DISPATCH_SPAWN_FAILED,
                component = COMPONENT,
                thread_name = ?self.thread_name(),
                error = %err,
                "failed to spawn dispatch thread"
            );
        }
    }
}

/// Runs each job on a tokio runtime's blocking pool.
#[cfg(feature = "tokio")]
#[derive(Debug, Clone)]
pub struct TokioSpawner {
    handle: tokio::runtime::Handle,
}

#[cfg(feature = "tokio")]
impl TokioSpawner {
    /// Spawns onto the runtime behind `handle`.
    #[must_use]
    pub fn new(handle: tokio::runtime::Handle) -> Self {
        Self { handle }
    }

    /// Binds to the runtime of the calling context, if there is one.
    #[must_use]
    pub fn try_current() -> Option<Self> {
        tokio::runtime::Handle::try_current().ok().map(Self::new)
    }
}

#[cfg(feature = "tokio")]
impl Spawner for TokioSpawner {
    fn spawn(&self, job: Job) {
        drop(self.handle.spawn_blocking(job));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn thread_spawner_runs_job_on_named_thread() {
        let (tx, rx) = crossbeam_channel::bounded(1);
        ThreadSpawner::new("dispatch-test").spawn(Box::new(move || {
            let _ = tx.send(thread::current().name().map(str::to_string));
        }));
        let name = rx.recv_timeout(Duration::from_secs(1)).unwrap();
        assert_eq!(name.as_deref(), Some("dispatch-test"));
    }

    #[test]
    fn thread_spawner_drops_name_with_nul() {
        let spawner = ThreadSpawner::new("a\0b");
        assert_eq!(spawner.thread_name(), None);

        let (tx, rx) = crossbeam_channel::bounded(1);
        spawner.spawn(Box::new(move || {
            let _ = tx.send(thread::current().name().map(str::to_string));
        }));
        let name = rx.recv_timeout(Duration::from_secs(1)).unwrap();
        assert_eq!(name, None);
    }

    #[test]
    fn thread_spawner_does_not_wait_for_job() {
        let (release_tx, release_rx) = crossbeam_channel::bounded::<()>(0);
        let (done_tx, done_rx) = crossbeam_channel::bounded(1);
        ThreadSpawner::default().spawn(Box::new(move || {
            let _ = release_rx.recv();
            let _ = done_tx.send(());
        }));
        // spawn returned while the job is still parked.
        assert!(done_rx.try_recv().is_err());
        release_tx.send(()).unwrap();
        done_rx.recv_timeout(Duration::from_secs(1)).unwrap();
    }

    #[cfg(feature = "tokio")]
    #[tokio::test(flavor = "multi_thread")]
    async fn tokio_spawner_runs_job() {
        let (tx, rx) = crossbeam_channel::bounded(1);
        let spawner = TokioSpawner::try_current().unwrap();
        spawner.spawn(Box::new(move || {
            let _ = tx.send(7);
        }));
        let got = tokio::task::spawn_blocking(move || rx.recv_timeout(Duration::from_secs(1)))
            .await
            .unwrap();
        assert_eq!(got.unwrap(), 7);
    }
}
