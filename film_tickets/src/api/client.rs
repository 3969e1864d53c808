//! HTTP API client for the film ticketing service.

use reqwest::{IntoUrl, Method, RequestBuilder, Url};
use serde::{Serialize, de::DeserializeOwned};
use std::time::Duration;

use super::errors::{ApiError, ApiResult, from_error_body};
use crate::auth::{AuthResponse, SessionStore, SignInRequest, SignUpRequest};

/// API client for communicating with the ticketing service.
///
/// The bearer token is read from the session store on every call, so a
/// login or logout is picked up without rebuilding the client. Each call
/// makes exactly one attempt.
#[derive(Clone, Debug)]
pub struct ApiClient {
    base_url: String,
    http: reqwest::Client,
    session: SessionStore,
}

impl ApiClient {
    /// Create a new API client
    ///
    /// `base_url` may include a path prefix such as `/api`.
    pub fn new(base_url: impl Into<String>, session: SessionStore) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            http: reqwest::Client::new(),
            session,
        }
    }

    /// Use a custom HTTP client (for connection pool reuse or testing).
    #[must_use]
    pub fn with_http_client(mut self, client: reqwest::Client) -> Self {
        self.http = client;
        self
    }

    /// Bound every request by `timeout`. Without this the client waits for
    /// as long as the transport allows.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Transport`] if the HTTP client cannot be built.
    pub fn with_timeout(mut self, timeout: Duration) -> ApiResult<Self> {
        self.http = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(self)
    }

    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    #[must_use]
    pub fn session(&self) -> &SessionStore {
        &self.session
    }

    /// POST /auth/signIn
    pub async fn sign_in(&self, request: &SignInRequest) -> ApiResult<AuthResponse> {
        let builder = self.http.post(self.url("/auth/signIn")).json(request);
        self.send(builder).await
    }

    /// POST /auth/signUp
    pub async fn sign_up(&self, request: &SignUpRequest) -> ApiResult<AuthResponse> {
        let builder = self.http.post(self.url("/auth/signUp")).json(request);
        self.send(builder).await
    }

    pub(crate) fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// `prefix` followed by one percent-encoded path segment.
    pub(crate) fn segment_url(&self, prefix: &str, segment: &str) -> ApiResult<Url> {
        let mut url =
            Url::parse(&self.url(prefix)).map_err(|e| ApiError::InvalidRequest(e.to_string()))?;
        url.path_segments_mut()
            .map_err(|()| ApiError::InvalidRequest(format!("cannot extend {prefix}")))?
            .push(segment);
        Ok(url)
    }

    /// Request carrying the session's bearer token, if any.
    pub(crate) fn request(&self, method: Method, url: impl IntoUrl) -> RequestBuilder {
        let builder = self.http.request(method, url);
        match self.session.token() {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    pub(crate) async fn get<T: DeserializeOwned>(&self, path: &str) -> ApiResult<T> {
        self.send(self.request(Method::GET, self.url(path))).await
    }

    pub(crate) async fn get_page<T: DeserializeOwned>(
        &self,
        url: impl IntoUrl,
        page: u32,
        size: u32,
    ) -> ApiResult<T> {
        let builder = self
            .request(Method::GET, url)
            .query(&[("page", page), ("size", size)]);
        self.send(builder).await
    }

    pub(crate) async fn send_json<B, T>(&self, method: Method, path: &str, body: &B) -> ApiResult<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        self.send(self.request(method, self.url(path)).json(body)).await
    }

    pub(crate) async fn send<T: DeserializeOwned>(&self, builder: RequestBuilder) -> ApiResult<T> {
        let body = self.execute(builder).await?;
        serde_json::from_slice(&body).map_err(|e| ApiError::Decode(e.to_string()))
    }

    /// Send and discard the response body.
    pub(crate) async fn send_empty(&self, builder: RequestBuilder) -> ApiResult<()> {
        self.execute(builder).await.map(drop)
    }

    async fn execute(&self, builder: RequestBuilder) -> ApiResult<Vec<u8>> {
        let request = builder.build()?;
        let method = request.method().clone();
        let path = request.url().path().to_string();
        tracing::debug!(%method, %path, "API request");

        let response = self.http.execute(request).await.map_err(|e| {
            tracing::warn!(%method, %path, error = %e, "API request did not complete");
            ApiError::Transport(e)
        })?;

        let status = response.status();
        let body = response.bytes().await?;
        if status.is_success() {
            return Ok(body.to_vec());
        }

        let err = from_error_body(status.as_u16(), &String::from_utf8_lossy(&body));
        tracing::warn!(
            %method,
            %path,
            status = status.as_u16(),
            error = %err,
            "API request failed"
        );
        Err(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base_url_trailing_slash_is_dropped() {
        let client = ApiClient::new("http://localhost:8080/api/", SessionStore::in_memory());
        assert_eq!(client.base_url(), "http://localhost:8080/api");
        assert_eq!(client.url("/film"), "http://localhost:8080/api/film");
    }

    #[test]
    fn segment_is_percent_encoded() {
        let client = ApiClient::new("http://localhost:8080/api", SessionStore::in_memory());
        let url = client.segment_url("/film/title", "Star Wars: A/B").unwrap();
        assert_eq!(
            url.as_str(),
            "http://localhost:8080/api/film/title/Star%20Wars:%20A%2FB"
        );
    }

    #[test]
    fn bearer_header_follows_session() {
        let store = SessionStore::in_memory();
        let client = ApiClient::new("http://localhost:8080", store.clone());

        let anonymous = client.request(Method::GET, client.url("/film")).build().unwrap();
        assert!(anonymous.headers().get("authorization").is_none());

        let principal = crate::auth::Principal {
            id: 1,
            name: "Ana".to_string(),
            last_name: "Gomez".to_string(),
            phone: "3001234567".to_string(),
            email: "ana@example.com".to_string(),
            role: crate::auth::Role::User,
            enabled: true,
        };
        store.save_session("abc", &principal).unwrap();
        let authed = client.request(Method::GET, client.url("/film")).build().unwrap();
        assert_eq!(authed.headers().get("authorization").unwrap(), "Bearer abc");
    }
}
