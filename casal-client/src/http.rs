//! HTTP gateway for authenticated calls to the authority

use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

use crate::{ClientConfig, ClientError, ClientResult};
use shared::client::{JoinRequest, LoginData, LoginRequest, RemoteEvent, RemotePerson};
use shared::ids::RemoteId;

/// Header carrying the opaque bearer token
const AUTH_HEADER: &str = "API-Key";

/// HTTP client for making authenticated requests to the authority
///
/// Performs no local writes and no automatic retries; cancelling an in-flight
/// call can therefore never leave a partially-applied mutation behind.
#[derive(Debug, Clone)]
pub struct HttpClient {
    client: Client,
    base_url: String,
    timeout: Duration,
    cancel: CancellationToken,
}

impl HttpClient {
    /// Create a new HTTP client from configuration
    pub fn new(config: &ClientConfig) -> Self {
        let client = Client::builder()
            .build()
            .expect("Failed to build HTTP client");

        Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            timeout: config.timeout_duration(),
            cancel: CancellationToken::new(),
        }
    }

    /// Attach a cancellation token; the issuer keeps the original and cancels
    /// every in-flight call through it
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self
    }

    /// Override the per-call timeout
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    fn url(&self, path: &str) -> String {
        format!("{}/v1{}", self.base_url, path)
    }

    /// Make an authenticated GET request
    async fn get(
        &self,
        path: &str,
        token: Option<&str>,
        query: &[(&str, String)],
    ) -> ClientResult<Value> {
        let url = self.url(path);
        tracing::debug!(url = %url, "GET request");
        let mut request = self.client.get(&url).query(query);
        if let Some(token) = token {
            request = request.header(AUTH_HEADER, token);
        }
        self.roundtrip(request).await
    }

    /// Make a POST request with a JSON body
    async fn post<B: serde::Serialize>(
        &self,
        path: &str,
        token: Option<&str>,
        body: &B,
    ) -> ClientResult<Value> {
        let url = self.url(path);
        tracing::debug!(url = %url, "POST request");
        let mut request = self.client.post(&url).json(body);
        if let Some(token) = token {
            request = request.header(AUTH_HEADER, token);
        }
        self.roundtrip(request).await
    }

    /// Send the request under the per-call deadline and cancellation token
    ///
    /// The caller's await is released the moment the deadline elapses or the
    /// token fires; the underlying request is dropped best-effort.
    async fn roundtrip(&self, request: reqwest::RequestBuilder) -> ClientResult<Value> {
        let exchange = async {
            let response = request.send().await?;
            let status = response.status();
            let body = response.text().await?;
            Ok::<_, reqwest::Error>((status, body))
        };

        let (status, body) = tokio::select! {
            _ = self.cancel.cancelled() => return Err(ClientError::Cancelled),
            result = tokio::time::timeout(self.timeout, exchange) => match result {
                Err(_) => return Err(ClientError::TimedOut),
                Ok(Err(e)) => return Err(ClientError::Network(e)),
                Ok(Ok(pair)) => pair,
            },
        };

        if !status.is_success() {
            return Err(Self::map_status(status, body));
        }

        let json: Value = serde_json::from_str(&body)
            .map_err(|e| ClientError::MalformedResponse(format!("body is not JSON: {e}")))?;
        match json.get("success").and_then(Value::as_bool) {
            Some(true) => Ok(json),
            Some(false) => Err(ClientError::MalformedResponse(
                "authority reported success=false".into(),
            )),
            None => Err(ClientError::MalformedResponse(
                "missing boolean 'success' field".into(),
            )),
        }
    }

    /// Map a non-success HTTP status to a typed failure
    fn map_status(status: StatusCode, body: String) -> ClientError {
        match status.as_u16() {
            400 | 406 => ClientError::Authorisation,
            401 | 403 => ClientError::InvalidCredentials,
            404 => ClientError::NotFound(body),
            409 => ClientError::AlreadySeated,
            410 => ClientError::TableNotFound,
            412 => ClientError::TooManyAttempts,
            other => ClientError::Api(other),
        }
    }

    /// Extract the `data` field of a validated envelope
    fn take_data<T: DeserializeOwned>(mut json: Value) -> ClientResult<T> {
        match json.get_mut("data") {
            Some(data) => serde_json::from_value(data.take())
                .map_err(|e| ClientError::MalformedResponse(format!("unexpected 'data' shape: {e}"))),
            None => Err(ClientError::MalformedResponse(
                "missing 'data' field".into(),
            )),
        }
    }

    /// Issue a data-returning GET against an arbitrary authority path
    pub async fn get_data<T: DeserializeOwned>(
        &self,
        path: &str,
        token: Option<&str>,
    ) -> ClientResult<T> {
        let json = self.get(path, token, &[]).await?;
        Self::take_data(json)
    }

    // ========== Auth API ==========

    /// Exchange credentials for a token
    pub async fn login(&self, nif: &str, password: &str) -> ClientResult<String> {
        let request = LoginRequest {
            nif: nif.to_string(),
            password: password.to_string(),
        };
        let json = self.post("/user/auth", None, &request).await?;
        let data: LoginData = Self::take_data(json)?;
        Ok(data.token)
    }

    // ========== Data API ==========

    /// Fetch the authenticated user's own record
    pub async fn person_data(&self, token: &str) -> ClientResult<RemotePerson> {
        let json = self.get("/user/data", Some(token), &[]).await?;
        Self::take_data(json)
    }

    /// Fetch another member's record by authority id
    pub async fn account_data(&self, token: &str, user_id: RemoteId) -> ClientResult<RemotePerson> {
        let query = [("user_id", user_id.0.to_string())];
        let json = self.get("/user/data", Some(token), &query).await?;
        Self::take_data(json)
    }

    /// Fetch the full current event snapshot, with embedded tables and
    /// attendance
    pub async fn events_list(&self, token: &str) -> ClientResult<Vec<RemoteEvent>> {
        let json = self.get("/events/list", Some(token), &[]).await?;
        Self::take_data(json)
    }

    /// Create a table, join one, or set the attendance flag for an event
    pub async fn join_event(
        &self,
        token: &str,
        event: RemoteId,
        request: &JoinRequest,
    ) -> ClientResult<()> {
        self.post(&format!("/events/{}/join", event.0), Some(token), request)
            .await?;
        Ok(())
    }
}
