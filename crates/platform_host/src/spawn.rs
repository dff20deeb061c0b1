//! Task spawning contract for the host's single-threaded executor.

use futures::{
    executor::LocalSpawner,
    future::LocalBoxFuture,
    task::LocalSpawnExt,
};

/// Spawns `!Send` background tasks on the host event loop.
pub trait TaskSpawner {
    /// Schedules `task` to run to completion on the current thread.
    ///
    /// # Errors
    ///
    /// Returns an error when the executor no longer accepts tasks.
    fn spawn_task(&self, task: LocalBoxFuture<'static, ()>) -> Result<(), String>;
}

impl TaskSpawner for LocalSpawner {
    fn spawn_task(&self, task: LocalBoxFuture<'static, ()>) -> Result<(), String> {
        LocalSpawnExt::spawn_local(self, task).map_err(|e| e.to_string())
    }
}
