//! HTTP client configuration and request execution.

use crate::error::{Error, Result};
use reqwest::{multipart::Form, Client, Method, RequestBuilder, Response};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;
use url::Url;

/// Default chat API base URL.
pub const DEFAULT_BASE_URL: &str = "http://localhost:3000/api/";

/// Default user agent.
pub const DEFAULT_USER_AGENT: &str = concat!("rchat/", env!("CARGO_PKG_VERSION"));

/// HTTP client configuration.
#[derive(Debug, Clone)]
pub struct HttpConfig {
    /// Base URL for API requests.
    pub base_url: String,
    /// Connection timeout.
    pub connect_timeout: Duration,
    /// Read timeout.
    pub read_timeout: Duration,
    /// Custom user agent.
    pub custom_user_agent: Option<String>,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_owned(),
            connect_timeout: Duration::from_secs(5),
            read_timeout: Duration::from_secs(20),
            custom_user_agent: None,
        }
    }
}

impl HttpConfig {
    /// Get the user agent to send.
    pub fn user_agent(&self) -> &str {
        self.custom_user_agent
            .as_deref()
            .unwrap_or(DEFAULT_USER_AGENT)
    }

    /// Resolve a relative API path to a full URL.
    pub fn resolve_url(&self, api: &str) -> Result<Url> {
        if api.starts_with("http://") || api.starts_with("https://") {
            return Url::parse(api).map_err(Error::Url);
        }

        // Without the trailing slash `join` would drop the last segment.
        let mut base = self.base_url.clone();
        if !base.ends_with('/') {
            base.push('/');
        }

        Url::parse(&base)
            .and_then(|b| b.join(api.trim_start_matches('/')))
            .map_err(Error::Url)
    }
}

/// Build a reqwest client with the given configuration.
pub fn build_client(config: &HttpConfig) -> Result<Client> {
    Client::builder()
        .connect_timeout(config.connect_timeout)
        .read_timeout(config.read_timeout)
        .gzip(true)
        .build()
        .map_err(Error::Network)
}

/// Response envelope shared by every endpoint.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Envelope {
    /// Whether the operation succeeded.
    #[serde(default)]
    pub status: bool,
    /// Payload.
    #[serde(default)]
    pub data: Value,
    /// Error detail on failure.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<Value>,
    /// Human readable outcome.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub descripcion: Option<String>,
    /// HTTP status the envelope arrived with.
    #[serde(skip)]
    pub http_status: u16,
}

impl Envelope {
    /// Best description of a failure.
    pub fn failure_message(&self) -> String {
        match (&self.error, &self.descripcion) {
            (Some(Value::String(s)), _) => s.clone(),
            (Some(Value::Null) | None, Some(d)) => d.clone(),
            (Some(Value::Null) | None, None) => "request failed".to_owned(),
            (Some(other), _) => other.to_string(),
        }
    }

    /// Turn a `status: false` envelope into an error.
    pub fn into_result(self) -> Result<Value> {
        if self.status {
            Ok(self.data)
        } else {
            let code = match self.http_status {
                0 | 200..=299 => "api".to_owned(),
                other => other.to_string(),
            };
            Err(Error::api(code, self.failure_message()))
        }
    }
}

/// HTTP request executor.
pub struct HttpExecutor<'a> {
    client: &'a Client,
    config: &'a HttpConfig,
}

impl<'a> HttpExecutor<'a> {
    /// Create a new executor.
    pub fn new(client: &'a Client, config: &'a HttpConfig) -> Self {
        Self { client, config }
    }

    /// Build a request with common headers.
    fn build_request(&self, method: Method, url: Url, token: Option<&str>) -> RequestBuilder {
        let request = self
            .client
            .request(method, url)
            .header("User-Agent", self.config.user_agent())
            .header("Accept", "application/json");

        match token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    /// Execute a GET request and return the envelope payload.
    pub async fn get(
        &self,
        api: &str,
        query: &[(&str, &str)],
        token: Option<&str>,
    ) -> Result<Value> {
        let url = self.config.resolve_url(api)?;

        let query: Vec<(&str, &str)> = query
            .iter()
            .filter(|(_, v)| !v.is_empty())
            .copied()
            .collect();

        log::debug!("GET {} {:?}", url, query);

        let response = self
            .build_request(Method::GET, url, token)
            .query(&query)
            .send()
            .await
            .map_err(Error::Network)?;
        self.handle_response(response).await?.into_result()
    }

    /// Execute a POST request with a JSON body.
    pub async fn post_json<B: Serialize + ?Sized + Sync>(
        &self,
        api: &str,
        body: &B,
        token: Option<&str>,
    ) -> Result<Envelope> {
        let url = self.config.resolve_url(api)?;
        log::debug!("POST {}", url);

        let response = self
            .build_request(Method::POST, url, token)
            .json(body)
            .send()
            .await
            .map_err(Error::Network)?;
        self.handle_response(response).await
    }

    /// Execute a POST request with a multipart form.
    pub async fn post_multipart(
        &self,
        api: &str,
        form: Form,
        token: Option<&str>,
    ) -> Result<Envelope> {
        let url = self.config.resolve_url(api)?;
        log::debug!("POST {} (multipart)", url);

        let response = self
            .build_request(Method::POST, url, token)
            .multipart(form)
            .send()
            .await
            .map_err(Error::Network)?;
        self.handle_response(response).await
    }

    /// Decode the envelope, falling back to the HTTP status when the body
    /// is not one.
    async fn handle_response(&self, response: Response) -> Result<Envelope> {
        let status = response.status();
        let text = response.text().await.map_err(Error::Network)?;

        match serde_json::from_str::<Envelope>(&text) {
            Ok(mut envelope) => {
                envelope.http_status = status.as_u16();
                Ok(envelope)
            }
            Err(_) if !status.is_success() => Err(Error::api(
                status.as_u16().to_string(),
                status.canonical_reason().unwrap_or("Unknown error"),
            )),
            Err(e) => Err(Error::parse(format!("unexpected response body: {e}"))),
        }
    }
}
