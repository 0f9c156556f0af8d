//! Authenticated API client
//!
//! Every call goes through one dispatcher that attaches the stored access
//! credential, interprets the response, and on a 401 runs the shared refresh
//! cycle before re-issuing the identical request exactly once.

use std::sync::Arc;
use std::time::Duration;

use privacyguard_common::auth::{RefreshCoordinator, RefreshError, Session};
use privacyguard_domain::ApiConfig;
use reqwest::header::AUTHORIZATION;
use reqwest::multipart::{Form, Part};
use reqwest::{Method, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, instrument, warn};
use url::Url;

use super::errors::ApiError;
use crate::errors::InfraError;
use crate::http::HttpClient;

/// Binary file attached to a multipart request.
///
/// Kept as raw parts so the form can be rebuilt when the request is retried.
#[derive(Debug, Clone)]
pub struct FilePart {
    pub field: String,
    pub file_name: String,
    pub bytes: Vec<u8>,
    pub content_type: Option<String>,
}

impl FilePart {
    fn to_form(&self) -> Result<Form, ApiError> {
        let mut part = Part::bytes(self.bytes.clone()).file_name(self.file_name.clone());
        if let Some(mime) = &self.content_type {
            part = part
                .mime_str(mime)
                .map_err(|e| ApiError::Client { status: 400, message: e.to_string() })?;
        }
        Ok(Form::new().part(self.field.clone(), part))
    }
}

#[derive(Debug, Clone)]
enum Payload {
    Empty,
    Json(serde_json::Value),
    Multipart(FilePart),
}

/// One logical API call, replayable for the single post-refresh retry.
#[derive(Debug, Clone)]
pub struct ApiRequest {
    method: Method,
    path: String,
    query: Vec<(String, String)>,
    payload: Payload,
    skip_auth: bool,
    refresh_on_unauthorized: bool,
}

impl ApiRequest {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            query: Vec::new(),
            payload: Payload::Empty,
            skip_auth: false,
            refresh_on_unauthorized: true,
        }
    }

    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::GET, path)
    }

    pub fn post(path: impl Into<String>) -> Self {
        Self::new(Method::POST, path)
    }

    pub fn patch(path: impl Into<String>) -> Self {
        Self::new(Method::PATCH, path)
    }

    pub fn delete(path: impl Into<String>) -> Self {
        Self::new(Method::DELETE, path)
    }

    /// Serialize `body` as the JSON payload.
    ///
    /// # Errors
    /// Returns `ApiError::Client` if `body` cannot be serialized.
    pub fn json<B: Serialize + ?Sized>(mut self, body: &B) -> Result<Self, ApiError> {
        let value = serde_json::to_value(body).map_err(|e| ApiError::Client {
            status: 400,
            message: format!("Failed to serialize body: {e}"),
        })?;
        self.payload = Payload::Json(value);
        Ok(self)
    }

    pub fn file(mut self, file: FilePart) -> Self {
        self.payload = Payload::Multipart(file);
        self
    }

    pub fn query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.push((key.into(), value.into()));
        self
    }

    /// Send without a stored credential and never refresh. Used by the
    /// endpoints that establish or rotate credentials.
    pub fn skip_auth(mut self) -> Self {
        self.skip_auth = true;
        self
    }

    /// Attach the credential but surface a 401 as-is.
    pub fn without_refresh(mut self) -> Self {
        self.refresh_on_unauthorized = false;
        self
    }
}

/// PrivacyGuard REST client bound to one [`Session`].
pub struct ApiClient {
    http: HttpClient,
    base_url: Url,
    timeout: Duration,
    session: Arc<Session>,
    coordinator: RefreshCoordinator,
}

impl ApiClient {
    /// Create a client for `config.base_url` operating on `session`.
    ///
    /// # Errors
    /// Returns `ApiError::Config` if the base URL is invalid or the HTTP
    /// client cannot be built.
    pub fn new(config: &ApiConfig, session: Arc<Session>) -> Result<Self, ApiError> {
        let base_url = parse_base_url(&config.base_url)?;

        let mut builder =
            HttpClient::builder().timeout(config.timeout()).max_attempts(config.max_attempts);
        if let Some(agent) = &config.user_agent {
            builder = builder.user_agent(agent.clone());
        }
        let http = builder
            .build()
            .map_err(|e| ApiError::Config(format!("Failed to build HttpClient: {e}")))?;

        let coordinator =
            RefreshCoordinator::new(Arc::clone(session.tokens()), config.refresh_timeout());

        debug!(base_url = %base_url, "API client created");
        Ok(Self { http, base_url, timeout: config.timeout(), session, coordinator })
    }

    pub fn session(&self) -> &Arc<Session> {
        &self.session
    }

    pub fn coordinator(&self) -> &RefreshCoordinator {
        &self.coordinator
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// `GET path`, `None` on 204/205.
    ///
    /// # Errors
    /// See [`ApiClient::execute`].
    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<Option<T>, ApiError> {
        self.execute(&ApiRequest::get(path)).await
    }

    /// # Errors
    /// See [`ApiClient::execute`].
    pub async fn post<B, T>(&self, path: &str, body: &B) -> Result<Option<T>, ApiError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        self.execute(&ApiRequest::post(path).json(body)?).await
    }

    /// # Errors
    /// See [`ApiClient::execute`].
    pub async fn patch<B, T>(&self, path: &str, body: &B) -> Result<Option<T>, ApiError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        self.execute(&ApiRequest::patch(path).json(body)?).await
    }

    /// # Errors
    /// See [`ApiClient::execute`].
    pub async fn delete<T: DeserializeOwned>(&self, path: &str) -> Result<Option<T>, ApiError> {
        self.execute(&ApiRequest::delete(path)).await
    }

    /// Dispatch `request` and decode a JSON body.
    ///
    /// # Errors
    /// - `ApiError::SessionExpired` when a 401 could not be recovered; the
    ///   session has been force-logged-out by then
    /// - status errors carrying the server's `detail` message
    /// - `ApiError::Network`/`ApiError::Timeout` on transport failure
    /// - `ApiError::Decode` when a success body is not the expected JSON
    #[instrument(skip(self, request), fields(method = %request.method, path = %request.path))]
    pub async fn execute<T: DeserializeOwned>(
        &self,
        request: &ApiRequest,
    ) -> Result<Option<T>, ApiError> {
        let response = self.dispatch(request).await?;
        let status = response.status();

        if status == StatusCode::NO_CONTENT || status == StatusCode::RESET_CONTENT {
            debug!(%status, "No content");
            return Ok(None);
        }

        let body = response.bytes().await.map_err(|e| ApiError::Network(e.to_string()))?;
        serde_json::from_slice(&body).map(Some).map_err(|e| ApiError::Decode(e.to_string()))
    }

    /// Dispatch `request` and return the raw success body.
    ///
    /// # Errors
    /// Same as [`ApiClient::execute`], minus decoding.
    #[instrument(skip(self, request), fields(method = %request.method, path = %request.path))]
    pub async fn execute_bytes(&self, request: &ApiRequest) -> Result<Vec<u8>, ApiError> {
        let response = self.dispatch(request).await?;
        let body = response.bytes().await.map_err(|e| ApiError::Network(e.to_string()))?;
        debug!(bytes = body.len(), "Binary response received");
        Ok(body.to_vec())
    }

    /// Send with the 401 recovery protocol; returns only success responses.
    async fn dispatch(&self, request: &ApiRequest) -> Result<Response, ApiError> {
        let mut retry_count: u8 = 0;

        loop {
            let credential =
                if request.skip_auth { None } else { self.session.tokens().access_credential() };

            let response = self.send_once(request, credential.as_deref()).await?;
            let status = response.status();

            if status.is_success() {
                return Ok(response);
            }

            let recoverable = status == StatusCode::UNAUTHORIZED
                && !request.skip_auth
                && request.refresh_on_unauthorized
                && retry_count == 0;

            if !recoverable {
                return Err(error_from_response(response).await);
            }

            debug!("Access credential rejected; refreshing");
            match self.coordinator.refresh(self, credential.as_deref()).await {
                Ok(_) => {
                    retry_count += 1;
                    debug!(retry_count, "Retrying with refreshed credential");
                }
                Err(RefreshError::Superseded) => {
                    // Logged out or replaced by someone else; nothing left to force.
                    debug!("Session changed while refreshing; not retrying");
                    return Err(RefreshError::Superseded.into());
                }
                Err(err) => {
                    let reason = err.to_string();
                    warn!(error = %reason, "Session could not be refreshed");
                    self.session.force_logout(reason.clone());
                    return Err(ApiError::SessionExpired(reason));
                }
            }
        }
    }

    async fn send_once(
        &self,
        request: &ApiRequest,
        credential: Option<&str>,
    ) -> Result<Response, ApiError> {
        let builder = self.build(request, credential)?;

        // Each transport attempt carries its own `timeout` budget.
        self.http.send(builder).await.map_err(|err| {
            if err.is_timeout() {
                ApiError::Timeout(self.timeout)
            } else {
                ApiError::from(InfraError::from(err))
            }
        })
    }

    fn build(
        &self,
        request: &ApiRequest,
        credential: Option<&str>,
    ) -> Result<RequestBuilder, ApiError> {
        let url = self.url(&request.path)?;
        let mut builder = self.http.request(request.method.clone(), url);

        if !request.query.is_empty() {
            builder = builder.query(&request.query);
        }
        if let Some(token) = credential {
            builder = builder.header(AUTHORIZATION, format!("Bearer {token}"));
        }

        builder = match &request.payload {
            Payload::Empty => builder,
            Payload::Json(value) => builder.json(value),
            Payload::Multipart(file) => builder.multipart(file.to_form()?),
        };
        Ok(builder)
    }

    fn url(&self, path: &str) -> Result<Url, ApiError> {
        self.base_url
            .join(path.trim_start_matches('/'))
            .map_err(|e| ApiError::from(InfraError::from(e)))
    }
}

/// Normalize the base so relative joins keep any path prefix.
fn parse_base_url(raw: &str) -> Result<Url, ApiError> {
    let mut url = Url::parse(raw.trim())
        .map_err(|e| ApiError::from(InfraError::from(e)))?;

    if !matches!(url.scheme(), "http" | "https") {
        return Err(ApiError::Config(format!("unsupported API URL scheme: {}", url.scheme())));
    }
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    Ok(url)
}

/// Human-readable message for a failed response: the `detail` field when the
/// body carries one, the status reason when the body is not JSON, else a
/// generic status message.
async fn error_from_response(response: Response) -> ApiError {
    let status = response.status();
    let body = response.text().await.unwrap_or_default();
    let message = error_message(status, &body);
    debug!(%status, message = %message, "Request failed");
    ApiError::from_status(status, message)
}

pub(crate) fn error_message(status: StatusCode, body: &str) -> String {
    let generic = || format!("HTTP error! status: {}", status.as_u16());

    match serde_json::from_str::<serde_json::Value>(body) {
        Ok(json) => match json.get("detail") {
            Some(serde_json::Value::String(detail)) if !detail.is_empty() => detail.clone(),
            Some(serde_json::Value::Null) | None => generic(),
            Some(serde_json::Value::String(_)) => generic(),
            Some(other) => other.to_string(),
        },
        Err(_) => status.canonical_reason().map_or_else(generic, ToString::to_string),
    }
}

impl std::fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiClient")
            .field("base_url", &self.base_url.as_str())
            .field("timeout", &self.timeout)
            .field("session", &self.session)
            .finish_non_exhaustive()
    }
}
