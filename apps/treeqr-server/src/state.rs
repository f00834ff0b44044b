//! Application state for the TreeQR server

use std::sync::Arc;

use treeqr_core::{
    DescriptionEnricher, FirebaseStore, GenerationConfig, MemoryStore, Pipeline, RecordStore,
    SpeechConfig, SpeechProxy, StoreConfig,
};

/// Where tree records come from
pub enum StoreSource {
    Firebase(StoreConfig),
    /// Serve a database export from memory
    Fixtures(MemoryStore),
}

#[derive(Clone)]
pub struct AppState {
    pub pipeline: Pipeline,
}

impl AppState {
    pub fn new(
        source: StoreSource,
        generation: GenerationConfig,
        speech: SpeechConfig,
    ) -> treeqr_core::Result<Self> {
        let store: Arc<dyn RecordStore> = match source {
            StoreSource::Firebase(config) => {
                tracing::info!("Using Firebase database at {}", config.database_url);
                Arc::new(FirebaseStore::new(config)?)
            }
            StoreSource::Fixtures(store) => {
                tracing::info!("Serving {} fixture records from memory", store.len());
                Arc::new(store)
            }
        };

        let enricher = DescriptionEnricher::new(generation)?;
        tracing::info!("Descriptions generated with {}", enricher.model());

        let speech = SpeechProxy::new(speech)?;

        Ok(Self {
            pipeline: Pipeline::new(store, enricher, speech),
        })
    }
}
