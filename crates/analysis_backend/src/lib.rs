use async_trait::async_trait;
use reqwest::{Client, Response, StatusCode};
use shared::{
    domain::SessionId,
    error::{AnalysisError, ErrorKind},
    protocol::{AnalysisResult, ErrorBody, TriggerAck},
};
use tracing::debug;
use url::Url;

/// Transport seam to the external video-analysis service. No retries and
/// no business logic; every failure is normalized into an
/// [`AnalysisError`] with a message and a machine-checkable kind.
#[async_trait]
pub trait AnalysisBackend: Send + Sync {
    /// Starts analysis for the session. The service holds the connection
    /// open until the job completes, so a successful response means the
    /// results are ready to fetch.
    async fn trigger_analysis(&self, session_id: &SessionId)
        -> Result<TriggerAck, AnalysisError>;

    /// Retrieves completed analysis output. Only meaningful after a
    /// successful trigger; the service answers 404 otherwise.
    async fn fetch_results(&self, session_id: &SessionId)
        -> Result<AnalysisResult, AnalysisError>;
}

pub struct MissingAnalysisBackend;

#[async_trait]
impl AnalysisBackend for MissingAnalysisBackend {
    async fn trigger_analysis(
        &self,
        session_id: &SessionId,
    ) -> Result<TriggerAck, AnalysisError> {
        Err(AnalysisError::transport(format!(
            "analysis backend is unavailable for session {session_id}"
        )))
    }

    async fn fetch_results(
        &self,
        session_id: &SessionId,
    ) -> Result<AnalysisResult, AnalysisError> {
        Err(AnalysisError::transport(format!(
            "analysis backend is unavailable for session {session_id}"
        )))
    }
}

pub struct HttpAnalysisBackend {
    http: Client,
    base_url: Url,
}

impl HttpAnalysisBackend {
    pub fn new(base_url: Url) -> Self {
        Self::with_http_client(Client::new(), base_url)
    }

    pub fn with_http_client(http: Client, base_url: Url) -> Self {
        Self { http, base_url }
    }

    fn endpoint(&self, path: &str, session_id: &SessionId) -> String {
        format!(
            "{}/{path}/{session_id}",
            self.base_url.as_str().trim_end_matches('/')
        )
    }
}

fn ensure_session_id(session_id: &SessionId) -> Result<(), AnalysisError> {
    if session_id.is_empty() {
        return Err(AnalysisError::validation(
            "session id must not be empty",
        ));
    }
    Ok(())
}

fn transport_error(err: reqwest::Error) -> AnalysisError {
    AnalysisError::transport(err.to_string())
}

/// Maps a non-2xx response onto the error taxonomy, preferring the
/// service-provided `{error}` body over the bare status line.
async fn service_error(response: Response, kind: ErrorKind) -> AnalysisError {
    let status = response.status();
    let message = match response.json::<ErrorBody>().await {
        Ok(body) => body.error,
        Err(_) => format!("analysis service returned {status}"),
    };
    AnalysisError::new(kind, message)
}

#[async_trait]
impl AnalysisBackend for HttpAnalysisBackend {
    async fn trigger_analysis(
        &self,
        session_id: &SessionId,
    ) -> Result<TriggerAck, AnalysisError> {
        ensure_session_id(session_id)?;
        let url = self.endpoint("analyze_booking", session_id);
        debug!(session_id = %session_id, "backend: triggering analysis");

        let response = self
            .http
            .post(&url)
            .send()
            .await
            .map_err(transport_error)?;
        if !response.status().is_success() {
            return Err(service_error(response, ErrorKind::Job).await);
        }

        response
            .json::<TriggerAck>()
            .await
            .map_err(|_| AnalysisError::job("analysis service returned invalid data"))
    }

    async fn fetch_results(
        &self,
        session_id: &SessionId,
    ) -> Result<AnalysisResult, AnalysisError> {
        ensure_session_id(session_id)?;
        let url = self.endpoint("analysis_results", session_id);
        debug!(session_id = %session_id, "backend: fetching analysis results");

        let response = self
            .http
            .get(&url)
            .send()
            .await
            .map_err(transport_error)?;
        if response.status() == StatusCode::NOT_FOUND {
            return Err(service_error(response, ErrorKind::NotFound).await);
        }
        if !response.status().is_success() {
            return Err(service_error(response, ErrorKind::Job).await);
        }

        response
            .json::<AnalysisResult>()
            .await
            .map_err(|_| AnalysisError::job("analysis service returned invalid data"))
    }
}

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
