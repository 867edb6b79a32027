use std::collections::HashMap;
use std::io;
use std::panic::{self, AssertUnwindSafe};
use std::sync::{Arc, Mutex, MutexGuard};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use super::{triggers::TaskName, Logger};
use crate::{net::classify_error, Error, Result};

const JOIN_POLL: Duration = Duration::from_millis(10);

/// Outcome of [`TaskRunner::launch_if_idle`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Launch {
    Started,
    /// A previous instance is still running; nothing was queued.
    Busy,
}

type Registry = Arc<Mutex<HashMap<TaskName, JoinHandle<()>>>>;
type ThreadBody = Box<dyn FnOnce() + Send + 'static>;
type Spawner = fn(thread::Builder, ThreadBody) -> io::Result<JoinHandle<()>>;

/// Runs named background jobs, at most one live instance per name.
pub struct TaskRunner {
    active: Registry,
    logger: Arc<Logger>,
    spawner: Spawner,
}

/// Releases the name when the job thread unwinds or returns.
struct ActiveGuard {
    name: TaskName,
    active: Registry,
}

impl Drop for ActiveGuard {
    fn drop(&mut self) {
        lock(&self.active).remove(&self.name);
    }
}

impl TaskRunner {
    pub fn new(logger: Arc<Logger>) -> Self {
        Self::with_spawner(logger, spawn_thread)
    }

    fn with_spawner(logger: Arc<Logger>, spawner: Spawner) -> Self {
        Self {
            active: Arc::new(Mutex::new(HashMap::new())),
            logger,
            spawner,
        }
    }

    /// Spawn `job` on its own thread unless `name` is already running.
    ///
    /// The registry lock is held across the check, the spawn and the insert,
    /// so a finishing job cannot remove its entry before it was recorded.
    pub fn launch_if_idle<F>(&self, name: TaskName, job: F) -> Result<Launch>
    where
        F: FnOnce() -> Result<()> + Send + 'static,
    {
        let mut active = lock(&self.active);
        if active.contains_key(&name) {
            self.logger
                .debug(format!("task {name} still running; skipping this trigger"));
            return Ok(Launch::Busy);
        }

        let registry = self.active.clone();
        let logger = self.logger.clone();
        let body: ThreadBody = Box::new(move || {
            // Created on the job thread: a body dropped by a failed spawn must
            // not touch the registry, which the caller still holds locked.
            let _guard = ActiveGuard {
                name,
                active: registry,
            };
            report(&logger, name, panic::catch_unwind(AssertUnwindSafe(job)));
        });
        let builder = thread::Builder::new().name(format!("station-{name}"));
        let handle = (self.spawner)(builder, body).map_err(Error::Io)?;
        active.insert(name, handle);
        Ok(Launch::Started)
    }

    pub fn is_active(&self, name: TaskName) -> bool {
        lock(&self.active).contains_key(&name)
    }

    pub fn active(&self) -> Vec<TaskName> {
        let mut names: Vec<_> = lock(&self.active).keys().copied().collect();
        names.sort_by_key(|name| name.as_str());
        names
    }

    /// Wait up to `grace` for running jobs to finish. Jobs still running at
    /// the deadline are abandoned and returned.
    pub fn join_all(&self, grace: Duration) -> Vec<TaskName> {
        let deadline = Instant::now() + grace;
        loop {
            let finished: Vec<JoinHandle<()>> = {
                let mut active = lock(&self.active);
                let done: Vec<TaskName> = active
                    .iter()
                    .filter(|(_, handle)| handle.is_finished())
                    .map(|(name, _)| *name)
                    .collect();
                done.iter().filter_map(|name| active.remove(name)).collect()
            };
            for handle in finished {
                let _ = handle.join();
            }
            let remaining = self.active();
            if remaining.is_empty() || Instant::now() >= deadline {
                for name in &remaining {
                    self.logger
                        .warn(format!("task {name} did not stop within {grace:?}; abandoning"));
                }
                return remaining;
            }
            thread::sleep(JOIN_POLL);
        }
    }
}

fn spawn_thread(builder: thread::Builder, body: ThreadBody) -> io::Result<JoinHandle<()>> {
    builder.spawn(body)
}

fn report(logger: &Logger, name: TaskName, outcome: std::thread::Result<Result<()>>) {
    match outcome {
        Ok(Ok(())) => logger.debug(format!("task {name} finished")),
        Ok(Err(err)) => logger.error(format!(
            "task {name} failed ({}): {err}",
            classify_error(&err)
        )),
        Err(payload) => {
            let msg = payload
                .downcast_ref::<&str>()
                .map(|s| s.to_string())
                .or_else(|| payload.downcast_ref::<String>().cloned())
                .unwrap_or_else(|| "unknown panic".to_string());
            logger.error(format!("task {name} panicked: {msg}"));
        }
    }
}

fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}
