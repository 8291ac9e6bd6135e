//! Endpoint adapters
//!
//! [`Backend`] is the seam between the controller and the outside world. The
//! controller only ever talks to a `Backend`; [`HttpBackend`] is the real one,
//! tests substitute scripted implementations.

use async_trait::async_trait;
use futures::future;
use futures::stream::{BoxStream, StreamExt};
use reqwest::header::{ACCEPT, CACHE_CONTROL};
use std::time::Duration;
use url::Url;

use crate::config::Config;
use crate::error::{Error, RESPONSE_NOT_OK, Result};
use crate::sse;
use crate::types::{
    DownloadRequest, DownloadedFile, FilesResponse, LogsResponse, ProgressSnapshot, SessionId,
    SubmitResponse,
};

/// Snapshots pushed by the Progress Endpoint, in emission order.
///
/// An `Err` item is a transport or framing failure; the stream should be
/// dropped after one.
pub type ProgressStream = BoxStream<'static, Result<ProgressSnapshot>>;

/// The external download service
#[async_trait]
pub trait Backend: Send + Sync + 'static {
    /// Submit a request; returns the new session id or `Error::Submission`
    async fn submit(&self, request: &DownloadRequest) -> Result<SessionId>;

    /// Open the server-push progress channel for `id`; failures are `Error::Stream`
    async fn progress(&self, id: &SessionId) -> Result<ProgressStream>;

    /// Full accumulated log for `id`; failures are `Error::LogFetch`
    async fn logs(&self, id: &SessionId) -> Result<Vec<String>>;

    /// Files the backend has finished downloading
    async fn downloaded_files(&self) -> Result<Vec<DownloadedFile>>;
}

/// [`Backend`] over HTTP with reqwest
#[derive(Clone, Debug)]
pub struct HttpBackend {
    client: reqwest::Client,
    base: Url,
    request_timeout: Duration,
}

impl HttpBackend {
    /// Build a backend from configuration
    pub fn new(config: &Config) -> Result<Self> {
        config.validate()?;
        // No client-wide timeout: it would also cut off the progress stream.
        let client = reqwest::Client::builder()
            .user_agent(concat!("ytdlp-client/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Self::with_client(client, config)
    }

    /// Build a backend around an existing client
    pub fn with_client(client: reqwest::Client, config: &Config) -> Result<Self> {
        Ok(Self {
            client,
            base: config.base()?,
            request_timeout: config.request_timeout,
        })
    }

    /// Base URL every endpoint is resolved against
    pub fn base_url(&self) -> &Url {
        &self.base
    }

    fn endpoint(&self, path: &str) -> Result<Url> {
        Ok(self.base.join(path)?)
    }

    fn session_endpoint(&self, prefix: &str, id: &SessionId) -> Result<Url> {
        self.endpoint(&format!("{prefix}/{}", urlencoding::encode(id.as_str())))
    }
}

#[async_trait]
impl Backend for HttpBackend {
    async fn submit(&self, request: &DownloadRequest) -> Result<SessionId> {
        let url = self.endpoint("api/download")?;
        tracing::debug!(%url, source = %request.url, mode = %request.download_type, "submitting download");

        let response = self
            .client
            .post(url)
            .json(request)
            .timeout(self.request_timeout)
            .send()
            .await
            .map_err(|e| Error::Submission(e.to_string()))?;

        if !response.status().is_success() {
            tracing::warn!(status = %response.status(), "submission endpoint rejected request");
            return Err(Error::Submission(RESPONSE_NOT_OK.to_string()));
        }

        let body: SubmitResponse = response
            .json()
            .await
            .map_err(|e| Error::Submission(e.to_string()))?;
        Ok(body.download_id)
    }

    async fn progress(&self, id: &SessionId) -> Result<ProgressStream> {
        let url = self.session_endpoint("api/progress", id)?;
        tracing::debug!(%url, session_id = %id, "opening progress stream");

        let response = self
            .client
            .get(url)
            .header(ACCEPT, "text/event-stream")
            .header(CACHE_CONTROL, "no-cache")
            .send()
            .await
            .map_err(|e| Error::Stream(e.to_string()))?;

        if !response.status().is_success() {
            tracing::warn!(status = %response.status(), session_id = %id, "progress endpoint rejected subscription");
            return Err(Error::Stream(RESPONSE_NOT_OK.to_string()));
        }

        // only unnamed or `message` events carry snapshots
        let snapshots = sse::decode(response.bytes_stream()).filter_map(|frame| {
            let snapshot = match frame {
                Ok(event) if !event.is_message() => {
                    tracing::debug!(event = ?event.event, "skipping named progress event");
                    None
                }
                Ok(event) => Some(
                    serde_json::from_str::<ProgressSnapshot>(&event.data)
                        .map_err(|e| Error::Stream(format!("malformed progress payload: {e}"))),
                ),
                Err(e) => Some(Err(Error::Stream(e.to_string()))),
            };
            future::ready(snapshot)
        });
        Ok(snapshots.boxed())
    }

    async fn logs(&self, id: &SessionId) -> Result<Vec<String>> {
        let url = self.session_endpoint("api/logs", id)?;

        let response = self
            .client
            .get(url)
            .timeout(self.request_timeout)
            .send()
            .await
            .map_err(|e| Error::LogFetch(e.to_string()))?;

        if !response.status().is_success() {
            return Err(Error::LogFetch(RESPONSE_NOT_OK.to_string()));
        }

        let body: LogsResponse = response
            .json()
            .await
            .map_err(|e| Error::LogFetch(e.to_string()))?;
        Ok(body.logs)
    }

    async fn downloaded_files(&self) -> Result<Vec<DownloadedFile>> {
        let url = self.endpoint("api/downloads")?;

        let body: FilesResponse = self
            .client
            .get(url)
            .timeout(self.request_timeout)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        Ok(body.files)
    }
}

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn session_ids_are_percent_encoded() {
        let backend = HttpBackend::new(&Config::with_base_url("http://localhost:5001")).unwrap();
        let url = backend
            .session_endpoint("api/progress", &SessionId::from("a b/c"))
            .unwrap();
        assert_eq!(url.as_str(), "http://localhost:5001/api/progress/a%20b%2Fc");
    }

    #[test]
    fn invalid_base_url_is_rejected() {
        let err = HttpBackend::new(&Config::with_base_url("::nope")).unwrap_err();
        assert!(matches!(err, Error::Url(_)));
    }
}
