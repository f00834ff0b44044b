//! Text-to-speech passthrough
//!
//! Forwards a text string to the local TTS service and hands back the upstream
//! response as an [`AudioStream`]. The audio is never collected in memory: callers
//! either copy it chunk by chunk into a sink or turn the inner response into a
//! streaming body.

use reqwest::header::{HeaderValue, CONTENT_LENGTH, CONTENT_TYPE};
use reqwest::{Client, Response, StatusCode};
use tokio::io::{AsyncWrite, AsyncWriteExt};
use tracing::{debug, instrument, warn};

use crate::config::SpeechConfig;
use crate::error::{Error, Result};

/// Client for the local speech synthesis endpoint
#[derive(Clone)]
pub struct SpeechProxy {
    http: Client,
    config: SpeechConfig,
}

impl SpeechProxy {
    pub fn new(config: SpeechConfig) -> Result<Self> {
        // No overall timeout: it would cut off long audio mid-stream
        let http = Client::builder()
            .connect_timeout(config.timeout())
            .build()
            .map_err(|e| Error::Config(format!("Failed to build HTTP client: {e}")))?;
        Ok(Self { http, config })
    }

    /// Upstream URL with `text` percent-encoded into the query
    pub fn request_url(&self, text: &str) -> String {
        let separator = if self.config.endpoint.contains('?') {
            '&'
        } else {
            '?'
        };
        format!(
            "{}{}text={}",
            self.config.endpoint,
            separator,
            urlencoding::encode(text)
        )
    }

    /// Ask the TTS service to speak `text`.
    ///
    /// Empty text is rejected before any request is made. Only the wait for the
    /// response headers is bounded by the configured timeout.
    #[instrument(skip(self, text), fields(chars = text.chars().count()))]
    pub async fn synthesize(&self, text: &str) -> Result<AudioStream> {
        if text.is_empty() {
            return Err(Error::BadRequest("Missing 'text' parameter".to_string()));
        }

        let url = self.request_url(text);
        debug!(endpoint = %self.config.endpoint, "GET synthesized audio");

        let response = tokio::time::timeout(self.config.timeout(), self.http.get(&url).send())
            .await
            .map_err(|_| {
                warn!(timeout_ms = self.config.timeout_ms, "TTS request timed out");
                Error::TtsUnavailable(format!("no response within {}ms", self.config.timeout_ms))
            })?
            .map_err(|e| {
                warn!(error = %e, "TTS request failed");
                Error::TtsUnavailable(e.to_string())
            })?;

        debug!(
            status = %response.status(),
            content_type = ?response.headers().get(CONTENT_TYPE),
            "TTS responded"
        );

        Ok(AudioStream { response })
    }
}

/// Upstream audio response, owned until consumed or dropped.
///
/// Dropping an `AudioStream` (or whatever it was turned into) releases the upstream
/// connection, whether the body was fully read or not.
#[derive(Debug)]
pub struct AudioStream {
    response: Response,
}

impl AudioStream {
    pub fn status(&self) -> StatusCode {
        self.response.status()
    }

    /// `Content-Type` exactly as the TTS service sent it
    pub fn content_type(&self) -> Option<&HeaderValue> {
        self.response.headers().get(CONTENT_TYPE)
    }

    /// `Content-Length` exactly as the TTS service sent it, if at all
    pub fn content_length(&self) -> Option<&HeaderValue> {
        self.response.headers().get(CONTENT_LENGTH)
    }

    /// Copy the audio into `sink` chunk by chunk, returning the bytes written.
    ///
    /// An upstream read error or a sink write error stops the copy; whatever was
    /// already written stays written.
    pub async fn copy_to<W>(mut self, sink: &mut W) -> std::io::Result<u64>
    where
        W: AsyncWrite + Unpin + ?Sized,
    {
        let mut written = 0u64;
        while let Some(chunk) = self.response.chunk().await.map_err(std::io::Error::other)? {
            sink.write_all(&chunk).await?;
            written += chunk.len() as u64;
        }
        sink.flush().await?;
        Ok(written)
    }

    /// The upstream response, for callers that stream its body themselves
    pub fn into_inner(self) -> Response {
        self.response
    }
}
