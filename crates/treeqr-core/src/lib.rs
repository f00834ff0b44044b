//! TreeQR core - record resolution and enrichment pipeline
//!
//! Every tagged tree carries a QR code that resolves to an identifier. This crate
//! turns that identifier into something worth showing:
//!
//! - [`store`] fetches the tree record from the document store
//! - [`record`] normalizes optional collections so renderers never see `None`
//! - [`enrich`] asks a chat-completion model to narrate the tree in first person
//! - [`speech`] relays text to a local TTS service and streams the audio back
//!
//! ## Architecture
//!
//! ```text
//! request → RecordStore::fetch → Record::normalize → { page render | DescriptionEnricher }
//! request → SpeechProxy::synthesize → AudioStream → response body
//! ```
//!
//! The capabilities are built once at startup and injected into a [`Pipeline`].
//! Nothing in here holds mutable state, so a `Pipeline` can be cloned freely across
//! request tasks.

pub mod config;
pub mod enrich;
pub mod error;
pub mod pipeline;
pub mod record;
pub mod speech;
pub mod store;

pub use config::{GenerationConfig, SpeechConfig, StoreConfig};
pub use enrich::{DescriptionEnricher, DEFAULT_MODEL};
pub use error::{Error, GenerationFailure, Result};
pub use pipeline::Pipeline;
pub use record::Record;
pub use speech::{AudioStream, SpeechProxy};
pub use store::{FirebaseStore, MemoryStore, RecordStore};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
