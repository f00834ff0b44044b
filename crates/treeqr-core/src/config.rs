//! Configuration for the outbound capabilities
//!
//! Each capability gets its own config struct with sensible defaults. `from_env`
//! overlays environment variables on top of the defaults; the server binary layers
//! command-line flags on top of that.

use std::path::Path;
use std::time::Duration;

use crate::error::{Error, Result};

pub const DEFAULT_DATABASE_URL: &str = "https://treeqrsystem-default-rtdb.firebaseio.com/";
pub const DEFAULT_COLLECTION: &str = "trees";
pub const DEFAULT_GENERATION_URL: &str = "https://openrouter.ai/api/v1/chat/completions";
pub const DEFAULT_SPEECH_URL: &str = "http://localhost:5002/speak";

/// Firebase Realtime Database settings
#[derive(Debug, Clone)]
pub struct StoreConfig {
    /// Database root, e.g. `https://<project>-default-rtdb.firebaseio.com/`
    pub database_url: String,
    /// Path under the root holding one child per tree
    pub collection: String,
    /// Database secret or access token sent as the `auth` query parameter
    pub auth_token: Option<String>,
    pub timeout_ms: u64,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            database_url: DEFAULT_DATABASE_URL.to_string(),
            collection: DEFAULT_COLLECTION.to_string(),
            auth_token: None,
            timeout_ms: 10_000,
        }
    }
}

impl StoreConfig {
    /// Load from environment variables
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            database_url: env_string("FIREBASE_DATABASE_URL").unwrap_or(defaults.database_url),
            collection: env_string("FIREBASE_COLLECTION").unwrap_or(defaults.collection),
            auth_token: env_string("FIREBASE_AUTH_TOKEN"),
            timeout_ms: env_u64("STORE_TIMEOUT_MS").unwrap_or(defaults.timeout_ms),
        }
    }

    /// Read the database auth token from a credentials file.
    ///
    /// The file holds the token on its own; surrounding whitespace is ignored. A
    /// missing or empty file is a startup error.
    pub fn with_credentials_file(mut self, path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|e| {
            Error::Config(format!("cannot read credentials {}: {}", path.display(), e))
        })?;
        let token = contents.trim();
        if token.is_empty() {
            return Err(Error::Config(format!(
                "credentials file {} is empty",
                path.display()
            )));
        }
        self.auth_token = Some(token.to_string());
        Ok(self)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

/// Chat-completion endpoint settings
#[derive(Debug, Clone)]
pub struct GenerationConfig {
    pub endpoint: String,
    pub model: String,
    pub api_key: Option<String>,
    pub timeout_ms: u64,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_GENERATION_URL.to_string(),
            model: crate::enrich::DEFAULT_MODEL.to_string(),
            api_key: None,
            timeout_ms: 60_000,
        }
    }
}

impl GenerationConfig {
    /// Load from environment variables
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            endpoint: env_string("GENERATION_URL").unwrap_or(defaults.endpoint),
            model: env_string("GENERATION_MODEL").unwrap_or(defaults.model),
            api_key: env_string("OPENROUTER_API_KEY"),
            timeout_ms: env_u64("GENERATION_TIMEOUT_MS").unwrap_or(defaults.timeout_ms),
        }
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

/// Local TTS service settings
#[derive(Debug, Clone)]
pub struct SpeechConfig {
    pub endpoint: String,
    /// Upper bound on waiting for the response headers; the audio body itself is
    /// streamed without a deadline
    pub timeout_ms: u64,
}

impl Default for SpeechConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_SPEECH_URL.to_string(),
            timeout_ms: 30_000,
        }
    }
}

impl SpeechConfig {
    /// Load from environment variables
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            endpoint: env_string("TTS_URL").unwrap_or(defaults.endpoint),
            timeout_ms: env_u64("TTS_TIMEOUT_MS").unwrap_or(defaults.timeout_ms),
        }
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

fn env_string(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|s| !s.is_empty())
}

fn env_u64(key: &str) -> Option<u64> {
    std::env::var(key).ok().and_then(|v| v.parse().ok())
}
