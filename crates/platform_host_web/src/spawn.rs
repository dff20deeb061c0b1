//! Browser task spawner backed by `wasm-bindgen-futures`.

use futures::future::LocalBoxFuture;
use platform_host::TaskSpawner;

#[derive(Debug, Clone, Copy, Default)]
/// Spawns tasks onto the browser microtask queue.
pub struct WebTaskSpawner;

impl TaskSpawner for WebTaskSpawner {
    fn spawn_task(&self, task: LocalBoxFuture<'static, ()>) -> Result<(), String> {
        #[cfg(target_arch = "wasm32")]
        {
            wasm_bindgen_futures::spawn_local(task);
            Ok(())
        }

        #[cfg(not(target_arch = "wasm32"))]
        {
            drop(task);
            Err("browser task spawner is only available on wasm32".to_string())
        }
    }
}
