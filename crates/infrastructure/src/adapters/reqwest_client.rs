//! HTTP Client implementation using reqwest.
//!
//! This adapter implements the `HttpClient` port using the reqwest library.
//! Request paths are resolved against `{base_url}/api`.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use reqwest::cookie::Jar;
use reqwest::{Client, Method, Url};
use tally_application::ports::{HttpClient, HttpClientError};
use tally_application::{ApplicationError, ApplicationResult, ClientConfig};
use tally_domain::request::{HttpMethod, RequestSpec};
use tally_domain::response::ResponseSpec;

/// Prefix inserted between the base URL and every request path.
pub const API_PREFIX: &str = "/api";

/// HTTP client implementation using reqwest.
///
/// Requests flagged `with_credentials` share a cookie jar, which carries
/// the refresh cookie set by the login endpoint. Other requests are sent
/// without cookies.
pub struct ReqwestHttpClient {
    with_cookies: Client,
    without_cookies: Client,
    base_url: Url,
    timeout: Duration,
}

impl ReqwestHttpClient {
    /// Creates a client for the API served under `base_url`.
    ///
    /// Default configuration:
    /// - Follow redirects: up to 10
    /// - TLS verification: enabled
    /// - User-Agent: "Tally/<version>"
    ///
    /// # Errors
    ///
    /// Returns an error if the client cannot be created.
    pub fn new(base_url: Url, timeout: Duration) -> Result<Self, HttpClientError> {
        let jar = Arc::new(Jar::default());
        let with_cookies = Self::builder(timeout)
            .cookie_provider(jar)
            .build()
            .map_err(|e| HttpClientError::Other(e.to_string()))?;
        let without_cookies = Self::builder(timeout)
            .build()
            .map_err(|e| HttpClientError::Other(e.to_string()))?;

        Ok(Self {
            with_cookies,
            without_cookies,
            base_url,
            timeout,
        })
    }

    /// Creates a client from the loaded configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the base URL is invalid or the client cannot be
    /// created.
    pub fn from_config(config: &ClientConfig) -> ApplicationResult<Self> {
        let base_url = config.base_url()?;
        Self::new(base_url, config.net.request_timeout()).map_err(ApplicationError::from)
    }

    fn builder(timeout: Duration) -> reqwest::ClientBuilder {
        Client::builder()
            .user_agent(concat!("Tally/", env!("CARGO_PKG_VERSION")))
            .redirect(reqwest::redirect::Policy::limited(10))
            .timeout(timeout)
    }

    /// Returns the base URL requests are resolved against.
    #[must_use]
    pub const fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Converts domain `HttpMethod` to reqwest `Method`.
    const fn to_reqwest_method(method: HttpMethod) -> Method {
        match method {
            HttpMethod::Get => Method::GET,
            HttpMethod::Post => Method::POST,
        }
    }

    /// Builds the absolute URL of `request`.
    fn endpoint(&self, request: &RequestSpec) -> Result<Url, HttpClientError> {
        let base = self.base_url.as_str().trim_end_matches('/');
        let mut url = format!("{base}{API_PREFIX}{}", request.path);

        if !request.query.is_empty() {
            let query = serde_urlencoded::to_string(&request.query)
                .map_err(|e| HttpClientError::InvalidUrl(e.to_string()))?;
            url.push('?');
            url.push_str(&query);
        }

        Url::parse(&url).map_err(|e| HttpClientError::InvalidUrl(format!("{e}: {url}")))
    }

    /// Maps reqwest errors to domain `HttpClientError`.
    fn map_error(error: &reqwest::Error, timeout_ms: u64) -> HttpClientError {
        if error.is_timeout() {
            return HttpClientError::Timeout { timeout_ms };
        }

        let host = || {
            error
                .url()
                .and_then(Url::host_str)
                .unwrap_or("unknown")
                .to_string()
        };

        if error.is_connect() {
            let message = error.to_string();
            let lower = message.to_lowercase();
            if lower.contains("dns") || lower.contains("resolve") {
                return HttpClientError::DnsError {
                    host: host(),
                    message,
                };
            }
            if lower.contains("refused") {
                return HttpClientError::ConnectionRefused {
                    host: host(),
                    port: error
                        .url()
                        .and_then(Url::port_or_known_default)
                        .unwrap_or(80),
                };
            }
            return HttpClientError::ConnectionFailed(message);
        }

        HttpClientError::Other(error.to_string())
    }
}

impl std::fmt::Debug for ReqwestHttpClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReqwestHttpClient")
            .field("base_url", &self.base_url.as_str())
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl HttpClient for ReqwestHttpClient {
    async fn execute(&self, request: &RequestSpec) -> Result<ResponseSpec, HttpClientError> {
        let url = self.endpoint(request)?;
        let timeout_ms = u64::try_from(self.timeout.as_millis()).unwrap_or(u64::MAX);
        let client = if request.with_credentials {
            &self.with_cookies
        } else {
            &self.without_cookies
        };

        let start = Instant::now();

        let mut builder = client.request(Self::to_reqwest_method(request.method), url);
        for header in request.headers.iter() {
            builder = builder.header(&header.name, &header.value);
        }
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }

        let response = builder
            .send()
            .await
            .map_err(|e| Self::map_error(&e, timeout_ms))?;

        let status = response.status().as_u16();
        let headers: HashMap<String, String> = response
            .headers()
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_str().unwrap_or("<binary>").to_string()))
            .collect();

        let body = response
            .bytes()
            .await
            .map_err(|e| HttpClientError::Other(format!("Failed to read body: {e}")))?
            .to_vec();

        let duration = start.elapsed();
        tracing::debug!(
            request_id = %request.id,
            method = request.method.as_str(),
            path = %request.path,
            status,
            elapsed_ms = u64::try_from(duration.as_millis()).unwrap_or(u64::MAX),
            "HTTP request completed"
        );

        Ok(ResponseSpec::new(status, headers, body, duration))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn client(base: &str) -> ReqwestHttpClient {
        ReqwestHttpClient::new(Url::parse(base).unwrap(), Duration::from_secs(5)).unwrap()
    }

    #[test]
    fn test_to_reqwest_method() {
        assert_eq!(
            ReqwestHttpClient::to_reqwest_method(HttpMethod::Get),
            Method::GET
        );
        assert_eq!(
            ReqwestHttpClient::to_reqwest_method(HttpMethod::Post),
            Method::POST
        );
    }

    #[test]
    fn test_endpoint_adds_api_prefix() {
        let http = client("http://localhost:8080/");
        let url = http.endpoint(&RequestSpec::get("/budgeting/overview")).unwrap();
        assert_eq!(url.as_str(), "http://localhost:8080/api/budgeting/overview");
    }

    #[test]
    fn test_endpoint_encodes_query() {
        let http = client("https://tally.example.com");
        let request = RequestSpec::get("/budgeting/transactions")
            .with_query([("category", "Food & Drinks"), ("description", "café")]);

        let url = http.endpoint(&request).unwrap();
        let pairs: Vec<(String, String)> = url
            .query_pairs()
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect();
        assert_eq!(url.path(), "/api/budgeting/transactions");
        assert_eq!(pairs, request.query);
    }

    #[test]
    fn test_from_config_rejects_bad_url() {
        let config = ClientConfig {
            api_base_url: "ftp://example.com".to_string(),
            ..ClientConfig::default()
        };
        assert!(ReqwestHttpClient::from_config(&config).is_err());
    }
}
