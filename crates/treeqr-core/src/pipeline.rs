//! Request pipeline
//!
//! Wires the store, enricher and speech proxy together. Each step runs to completion
//! before the next starts; nothing is shared between calls except the injected
//! capabilities.

use std::sync::Arc;

use tracing::{info, instrument};

use crate::enrich::DescriptionEnricher;
use crate::error::Result;
use crate::record::Record;
use crate::speech::{AudioStream, SpeechProxy};
use crate::store::RecordStore;

#[derive(Clone)]
pub struct Pipeline {
    store: Arc<dyn RecordStore>,
    enricher: DescriptionEnricher,
    speech: SpeechProxy,
}

impl Pipeline {
    pub fn new(
        store: Arc<dyn RecordStore>,
        enricher: DescriptionEnricher,
        speech: SpeechProxy,
    ) -> Self {
        Self {
            store,
            enricher,
            speech,
        }
    }

    /// Fetch and normalize the record for `id`
    #[instrument(skip(self))]
    pub async fn resolve(&self, id: &str) -> Result<Record> {
        let record = self.store.fetch(id).await?;
        Ok(record.normalize())
    }

    /// Resolve `id`, then have the tree describe itself
    #[instrument(skip(self))]
    pub async fn describe(&self, id: &str) -> Result<String> {
        let record = self.resolve(id).await?;
        let description = self.enricher.enrich(&record.name).await?;
        info!(id, name = %record.name, chars = description.len(), "Generated description");
        Ok(description)
    }

    pub async fn speak(&self, text: &str) -> Result<AudioStream> {
        self.speech.synthesize(text).await
    }
}
