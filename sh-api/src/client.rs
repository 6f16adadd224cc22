//! HTTP client for the hosted backend REST API.
//!
//! Handles API-key and bearer authentication, custom headers, timeouts,
//! optional exponential backoff retry, and error classification.

use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderName, HeaderValue, AUTHORIZATION, CONTENT_RANGE};
use reqwest::{Client, Method, RequestBuilder, Response, StatusCode, Url};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, warn};

use sh_core::config::{AppConfig, BackendConfig};
use sh_core::constants;
use sh_core::error::{ShError, ShResult};

use crate::query::Query;
use crate::response::{BackendErrorBody, ContentRange};

/// Retry configuration for HTTP requests.
///
/// Retries are off unless `backend.max_retries` is set: remote failures are
/// normally surfaced to the user rather than retried.
#[derive(Debug, Clone)]
pub struct RetryConfig {
    /// Maximum number of retry attempts.
    pub max_retries: u32,
    /// Base delay between retries (doubles each attempt).
    pub base_delay: Duration,
    /// Maximum delay cap.
    pub max_delay: Duration,
    /// HTTP status codes that trigger a retry.
    pub retryable_statuses: Vec<u16>,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 0,
            base_delay: Duration::from_millis(500),
            max_delay: Duration::from_secs(4),
            retryable_statuses: vec![502, 503, 504],
        }
    }
}

/// What the backend should send back after a write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Returning {
    Representation,
    Minimal,
}

/// HTTP client for the hosted backend.
///
/// Cheap to clone; all clones share the connection pool.
#[derive(Clone)]
pub struct ApiClient {
    inner: Client,
    /// Project origin (e.g. "https://abcd.supabase.co").
    origin: String,
    /// Table/RPC root (origin + `/rest/v1`).
    rest_root: String,
    /// Default request timeout.
    timeout: Duration,
    /// Headers sent with every request (apikey, authorization, custom).
    default_headers: HeaderMap,
    /// Retry configuration.
    retry_config: RetryConfig,
}

impl ApiClient {
    /// Create a client from backend configuration.
    pub fn new(config: &BackendConfig) -> ShResult<Self> {
        if !config.is_configured() {
            return Err(ShError::MissingConfig(
                "backend.url and backend.anon_key are required".into(),
            ));
        }

        let origin = AppConfig::sanitize_backend_url(&config.url);
        Url::parse(&origin)
            .map_err(|e| ShError::Config(format!("invalid backend url '{origin}': {e}")))?;

        let default_headers = build_headers(config)?;
        let timeout = Duration::from_millis(config.api_timeout_ms);

        let inner = Client::builder()
            .timeout(timeout)
            .connect_timeout(Duration::from_secs(15))
            .pool_max_idle_per_host(5)
            .pool_idle_timeout(Duration::from_secs(90))
            .tcp_keepalive(Duration::from_secs(30))
            .build()
            .map_err(|e| ShError::Http(format!("failed to build HTTP client: {e}")))?;

        let retry_config = RetryConfig {
            max_retries: config.max_retries,
            ..RetryConfig::default()
        };

        Ok(Self {
            inner,
            rest_root: format!("{origin}{}", constants::REST_PREFIX),
            origin,
            timeout,
            default_headers,
            retry_config,
        })
    }

    /// Set custom retry configuration.
    pub fn with_retry_config(mut self, config: RetryConfig) -> Self {
        self.retry_config = config;
        self
    }

    /// Project origin.
    pub fn origin(&self) -> &str {
        &self.origin
    }

    /// Table/RPC root URL.
    pub fn rest_root(&self) -> &str {
        &self.rest_root
    }

    /// Build the URL for a table or RPC path with query parameters.
    fn url(&self, path: &str, params: &[(String, String)]) -> ShResult<Url> {
        let mut url = Url::parse(&format!("{}/{}", self.rest_root, path.trim_start_matches('/')))
            .map_err(|e| ShError::Http(format!("invalid request url for '{path}': {e}")))?;
        if !params.is_empty() {
            url.query_pairs_mut().extend_pairs(params);
        }
        Ok(url)
    }

    /// Internal: build a request with default headers and an optional JSON body.
    fn build_request(
        &self,
        method: Method,
        url: Url,
        extra_headers: &[(&'static str, String)],
        body: Option<&serde_json::Value>,
    ) -> RequestBuilder {
        let mut builder = self
            .inner
            .request(method, url)
            .timeout(self.timeout)
            .headers(self.default_headers.clone());
        for (name, value) in extra_headers {
            builder = builder.header(*name, value.as_str());
        }
        if let Some(b) = body {
            builder = builder.json(b);
        }
        builder
    }

    /// Execute a request, retrying transient failures when enabled.
    async fn send(
        &self,
        method: Method,
        path: &str,
        params: &[(String, String)],
        extra_headers: &[(&'static str, String)],
        body: Option<&serde_json::Value>,
    ) -> ShResult<Response> {
        let url = self.url(path, params)?;
        debug!("{} {}", method, url.path());

        let mut last_error: Option<ShError> = None;

        for attempt in 0..=self.retry_config.max_retries {
            if attempt > 0 {
                let delay = self.calculate_retry_delay(attempt - 1);
                warn!(
                    "retrying {} {} (attempt {}/{}) after {:.1}s",
                    method,
                    path,
                    attempt + 1,
                    self.retry_config.max_retries + 1,
                    delay.as_secs_f64()
                );
                tokio::time::sleep(delay).await;
            }

            let builder = self.build_request(method.clone(), url.clone(), extra_headers, body);

            match builder.send().await {
                Ok(response) => {
                    let status = response.status();
                    if self
                        .retry_config
                        .retryable_statuses
                        .contains(&status.as_u16())
                        && attempt < self.retry_config.max_retries
                    {
                        warn!("retryable status {} from {}", status.as_u16(), path);
                        last_error = Some(ShError::ServerError {
                            status: status.as_u16(),
                            message: format!("retryable status {status}"),
                        });
                        continue;
                    }

                    return Self::check_status(response).await;
                }
                Err(e) => {
                    let is_retryable = e.is_timeout() || e.is_connect();
                    let err = Self::classify_error(e);

                    if is_retryable && attempt < self.retry_config.max_retries {
                        warn!("retryable error on {}: {}", path, err);
                        last_error = Some(err);
                        continue;
                    }

                    return Err(err);
                }
            }
        }

        Err(last_error.unwrap_or_else(|| ShError::Http("max retries exceeded".into())))
    }

    /// Calculate retry delay with exponential backoff.
    fn calculate_retry_delay(&self, attempt: u32) -> Duration {
        let base_ms = self.retry_config.base_delay.as_millis() as u64;
        let delay_ms = base_ms.saturating_mul(1u64 << attempt.min(20));
        let max_ms = self.retry_config.max_delay.as_millis() as u64;
        Duration::from_millis(delay_ms.min(max_ms))
    }

    // --- Table operations ---

    /// Select rows from a table.
    pub async fn select<T: DeserializeOwned>(&self, table: &str, query: &Query) -> ShResult<Vec<T>> {
        let resp = self
            .send(Method::GET, table, &query.read_params(), &[], None)
            .await?;
        Self::parse_json(resp).await
    }

    /// Select at most one row.
    pub async fn select_one<T: DeserializeOwned>(
        &self,
        table: &str,
        query: &Query,
    ) -> ShResult<Option<T>> {
        let rows: Vec<T> = self.select(table, &query.clone().limit(1)).await?;
        Ok(rows.into_iter().next())
    }

    /// Count rows matching a query without transferring them.
    pub async fn count(&self, table: &str, query: &Query) -> ShResult<u64> {
        let params = query.clone().select("id").limit(1).read_params();
        let resp = self
            .send(
                Method::GET,
                table,
                &params,
                &[("Prefer", "count=exact".to_string())],
                None,
            )
            .await?;
        let header = resp
            .headers()
            .get(CONTENT_RANGE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_string();
        ContentRange::parse(&header)
            .and_then(|r| r.total)
            .ok_or_else(|| ShError::Serialization(format!("missing row count in '{header}'")))
    }

    /// Insert one or more rows and return the stored representation.
    pub async fn insert<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        table: &str,
        rows: &B,
    ) -> ShResult<Vec<T>> {
        let body = serde_json::to_value(rows)?;
        let resp = self
            .send(
                Method::POST,
                table,
                &[],
                &[("Prefer", prefer(Returning::Representation, false))],
                Some(&body),
            )
            .await?;
        Self::parse_json(resp).await
    }

    /// Insert a single row and return it.
    pub async fn insert_one<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        table: &str,
        row: &B,
    ) -> ShResult<T> {
        let rows: Vec<T> = self.insert(table, row).await?;
        rows.into_iter()
            .next()
            .ok_or_else(|| ShError::Serialization(format!("insert into {table} returned no row")))
    }

    /// Insert rows, merging on primary-key conflicts. Returns nothing.
    pub async fn upsert(&self, table: &str, rows: &[serde_json::Value]) -> ShResult<()> {
        let body = serde_json::Value::Array(rows.to_vec());
        self.send(
            Method::POST,
            table,
            &[],
            &[("Prefer", prefer(Returning::Minimal, true))],
            Some(&body),
        )
        .await?;
        Ok(())
    }

    /// Update rows matching a filtered query and return them.
    pub async fn update<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        table: &str,
        query: &Query,
        changes: &B,
    ) -> ShResult<Vec<T>> {
        if !query.has_filters() {
            return Err(ShError::InvalidInput(format!(
                "refusing unfiltered update of {table}"
            )));
        }
        let body = serde_json::to_value(changes)?;
        let resp = self
            .send(
                Method::PATCH,
                table,
                &query.write_params(),
                &[("Prefer", prefer(Returning::Representation, false))],
                Some(&body),
            )
            .await?;
        Self::parse_json(resp).await
    }

    /// Delete rows matching a filtered query.
    pub async fn delete(&self, table: &str, query: &Query) -> ShResult<()> {
        if !query.has_filters() {
            return Err(ShError::InvalidInput(format!(
                "refusing unfiltered delete of {table}"
            )));
        }
        self.send(Method::DELETE, table, &query.write_params(), &[], None)
            .await?;
        Ok(())
    }

    /// Call a stored procedure with named arguments.
    pub async fn rpc<T: DeserializeOwned>(
        &self,
        function: &str,
        args: &serde_json::Value,
    ) -> ShResult<T> {
        let path = format!("rpc/{function}");
        let resp = self.send(Method::POST, &path, &[], &[], Some(args)).await?;
        Self::parse_json(resp).await
    }

    /// Ping the REST root. Returns the round-trip latency.
    pub async fn health_check(&self) -> ShResult<Duration> {
        let start = std::time::Instant::now();
        self.send(Method::GET, "", &[], &[], None).await?;
        Ok(start.elapsed())
    }

    // --- Response helpers ---

    /// Deserialize a response body.
    pub async fn parse_json<T: DeserializeOwned>(response: Response) -> ShResult<T> {
        response
            .json::<T>()
            .await
            .map_err(|e| ShError::Serialization(format!("failed to parse response: {e}")))
    }

    /// Check the HTTP status code and convert to ShError if needed.
    async fn check_status(response: Response) -> ShResult<Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = BackendErrorBody::parse(&response.text().await.unwrap_or_default());

        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            return Err(ShError::AuthFailed(format!("{status}: {}", body.summary())));
        }

        Err(ShError::ServerError {
            status: status.as_u16(),
            message: body.summary(),
        })
    }

    /// Classify a reqwest error into a ShError variant.
    fn classify_error(e: reqwest::Error) -> ShError {
        if e.is_timeout() {
            ShError::Timeout(e.to_string())
        } else if e.is_connect() {
            ShError::Http(format!("connection failed: {e}"))
        } else {
            ShError::Http(e.to_string())
        }
    }
}

fn prefer(returning: Returning, merge_duplicates: bool) -> String {
    let ret = match returning {
        Returning::Representation => "return=representation",
        Returning::Minimal => "return=minimal",
    };
    if merge_duplicates {
        format!("resolution=merge-duplicates,{ret}")
    } else {
        ret.to_string()
    }
}

fn build_headers(config: &BackendConfig) -> ShResult<HeaderMap> {
    let value = |v: &str| {
        HeaderValue::from_str(v).map_err(|e| ShError::Config(format!("invalid header value: {e}")))
    };

    let mut headers = HeaderMap::new();
    headers.insert("apikey", value(config.anon_key.trim())?);
    headers.insert(
        AUTHORIZATION,
        value(&format!("Bearer {}", config.bearer_token().trim()))?,
    );
    for (k, v) in &config.custom_headers {
        let name = HeaderName::from_bytes(k.as_bytes())
            .map_err(|e| ShError::Config(format!("invalid header name '{k}': {e}")))?;
        headers.insert(name, value(v)?);
    }
    Ok(headers)
}
