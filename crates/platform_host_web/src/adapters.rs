//! Host bundle assembly for browser builds.

use std::rc::Rc;

use platform_host::{ContentStreamClient, HostServices, HostStrategy};

use crate::{WebAppStateStore, WebTaskSpawner};

/// Builds the browser [`HostServices`] bundle around the injected generation client.
pub fn build_host_services(generation: Rc<dyn ContentStreamClient>) -> HostServices {
    HostServices {
        generation,
        app_state: Rc::new(WebAppStateStore),
        spawner: Rc::new(WebTaskSpawner),
        host_strategy: HostStrategy::Browser,
    }
}
