//! Folds a generation stream into one session, fenced by its generation id.

use futures::StreamExt;
use leptos::logging;
use platform_host::ContentStream;

use crate::{
    error::{GenerationError, StaleWrite},
    model::{AppId, GenerationId},
    session_store::SessionStore,
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IngestOutcome {
    Completed,
    Failed(GenerationError),
    /// The instance closed or navigated away; remaining fragments were not consumed.
    Dropped(StaleWrite),
}

pub struct StreamIngester {
    store: SessionStore,
    app_id: AppId,
    generation: GenerationId,
}

impl StreamIngester {
    pub fn new(store: SessionStore, app_id: AppId, generation: GenerationId) -> Self {
        Self {
            store,
            app_id,
            generation,
        }
    }

    /// Consumes `stream` until it ends, fails, or this generation stops being current.
    ///
    /// The loading flag is cleared in every case, but only if the generation is still current.
    pub async fn ingest(self, mut stream: ContentStream) -> IngestOutcome {
        let outcome = self.fold(&mut stream).await;
        let _ = self.store.finish_generation(&self.app_id, self.generation);
        if let IngestOutcome::Dropped(reason) = &outcome {
            logging::debug_warn!(
                "dropping generation stream for `{}`: {reason}",
                self.app_id
            );
        }
        outcome
    }

    async fn fold(&self, stream: &mut ContentStream) -> IngestOutcome {
        while let Some(item) = stream.next().await {
            match item {
                Ok(fragment) => {
                    if let Err(stale) =
                        self.store
                            .append_fragment(&self.app_id, self.generation, &fragment)
                    {
                        return IngestOutcome::Dropped(stale);
                    }
                }
                Err(message) => {
                    let error = GenerationError::from_stream_message(message);
                    return match self.store.fail_generation(
                        &self.app_id,
                        self.generation,
                        error.to_string(),
                    ) {
                        Ok(()) => IngestOutcome::Failed(error),
                        Err(stale) => IngestOutcome::Dropped(stale),
                    };
                }
            }
        }
        IngestOutcome::Completed
    }
}
