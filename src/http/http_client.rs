use std::{
    ops::Deref,
    sync::{Mutex, PoisonError},
    time::Duration,
};

use log::{debug, error, info};
use reqwest::{
    Method, StatusCode,
    header::{CONTENT_TYPE, HeaderMap, HeaderValue},
    redirect::Policy,
};
use reqwest_middleware::ClientWithMiddleware;
use serde_json::Value;

use super::{
    error::{ApiError, ApiResult, empty_payload},
    types::QueryParams,
    utils::{build_url, merge_headers},
};

pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Reusable JSON API client bound to one base URL.
///
/// The underlying transport (a pooled `reqwest` client wrapped in middleware)
/// is created lazily on first use and shared by every call made through this
/// client, including concurrent ones. [`close`](Self::close) drops it; the
/// next call transparently creates a new one.
pub struct ApiClient {
    base_url: String,
    timeout: Duration,
    headers: HeaderMap,
    max_retries: u32,
    handle: Mutex<Option<ClientWithMiddleware>>,
}

impl ApiClient {
    pub fn new(base_url: &str) -> Self {
        Self::with_config(base_url, Duration::from_secs(DEFAULT_TIMEOUT_SECS), HeaderMap::new())
    }

    pub fn with_config(base_url: &str, timeout: Duration, headers: HeaderMap) -> Self {
        Self {
            base_url: base_url.strip_suffix('/').unwrap_or(base_url).to_string(),
            timeout,
            headers,
            max_retries: 0,
            handle: Mutex::new(None),
        }
    }

    /// Retries transient failures with exponential backoff. Disabled by default.
    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    pub fn is_open(&self) -> bool {
        self.lock_handle().is_some()
    }

    /// Makes sure a transport handle exists.
    pub fn open(&self) -> ApiResult<()> {
        self.handle().map(|_| ())
    }

    /// Opens the client for the lifetime of the returned guard.
    ///
    /// The transport handle is released when the guard is dropped, whether
    /// the scope ends normally, through `?`, or by unwinding.
    pub fn session(&self) -> ApiResult<ApiSession<'_>> {
        self.open()?;
        Ok(ApiSession { client: self })
    }

    /// Releases the transport handle. Closing a closed client is a no-op.
    ///
    /// Requests already in flight hold their own clone of the handle and
    /// finish on it; only calls started after `close` open a new one.
    pub fn close(&self) {
        if self.lock_handle().take().is_some() {
            debug!(base_url = &*self.base_url; "HTTP client closed");
        }
    }

    pub fn build_url(&self, endpoint: &str, params: Option<&QueryParams>) -> String {
        build_url(&self.base_url, endpoint, params)
    }

    pub async fn get(&self, endpoint: &str, params: Option<&QueryParams>, headers: Option<&HeaderMap>) -> ApiResult<Value> {
        self.request(Method::GET, endpoint, params, None, headers).await
    }

    pub async fn post(
        &self,
        endpoint: &str,
        data: Option<&Value>,
        params: Option<&QueryParams>,
        headers: Option<&HeaderMap>,
    ) -> ApiResult<Value> {
        self.request(Method::POST, endpoint, params, data, headers).await
    }

    pub async fn put(
        &self,
        endpoint: &str,
        data: Option<&Value>,
        params: Option<&QueryParams>,
        headers: Option<&HeaderMap>,
    ) -> ApiResult<Value> {
        self.request(Method::PUT, endpoint, params, data, headers).await
    }

    pub async fn delete(
        &self,
        endpoint: &str,
        params: Option<&QueryParams>,
        headers: Option<&HeaderMap>,
    ) -> ApiResult<Value> {
        self.request(Method::DELETE, endpoint, params, None, headers).await
    }

    pub async fn patch(
        &self,
        endpoint: &str,
        data: Option<&Value>,
        params: Option<&QueryParams>,
        headers: Option<&HeaderMap>,
    ) -> ApiResult<Value> {
        self.request(Method::PATCH, endpoint, params, data, headers).await
    }

    /// Sends a request and decodes the JSON response body.
    ///
    /// An empty 2xx body decodes to `Value::Null`.
    ///
    /// # Errors
    ///
    /// - [`Client`](super::ApiErrorKind::Client) for 4xx responses
    /// - [`Api`](super::ApiErrorKind::Api) for other non-2xx responses, bodies
    ///   that are not JSON, and transport failures other than the two below
    /// - [`Connection`](super::ApiErrorKind::Connection) when the server cannot be reached
    /// - [`Timeout`](super::ApiErrorKind::Timeout) when the configured timeout elapses
    pub async fn request(
        &self,
        method: Method,
        endpoint: &str,
        params: Option<&QueryParams>,
        data: Option<&Value>,
        headers: Option<&HeaderMap>,
    ) -> ApiResult<Value> {
        let url = self.build_url(endpoint, params);
        let body = self.fetch(method, &url, data, headers).await?;

        if body.is_empty() {
            return Ok(Value::Null);
        }

        serde_json::from_slice(&body)
            .map_err(|e| ApiError::unexpected(&url, e))
            .inspect_err(log_failure)
    }

    /// Same pipeline as [`get`](Self::get), returning the body as text.
    pub async fn get_text(
        &self,
        endpoint: &str,
        params: Option<&QueryParams>,
        headers: Option<&HeaderMap>,
    ) -> ApiResult<String> {
        let url = self.build_url(endpoint, params);
        let body = self.fetch(Method::GET, &url, None, headers).await?;
        Ok(String::from_utf8_lossy(&body).into_owned())
    }

    async fn fetch(
        &self,
        method: Method,
        url: &str,
        data: Option<&Value>,
        headers: Option<&HeaderMap>,
    ) -> ApiResult<Vec<u8>> {
        self.execute(method, url, data, headers).await.inspect_err(log_failure)
    }

    async fn execute(
        &self,
        method: Method,
        url: &str,
        data: Option<&Value>,
        headers: Option<&HeaderMap>,
    ) -> ApiResult<Vec<u8>> {
        let client = self.handle()?;
        let mut request_headers = merge_headers(&self.headers, headers);
        let mut req = client.request(method.clone(), url);

        if let Some(data) = data {
            let body = serde_json::to_vec(data).map_err(|e| ApiError::request(url, e))?;
            request_headers
                .entry(CONTENT_TYPE)
                .or_insert(HeaderValue::from_static("application/json"));
            req = req.body(body);
        }

        info!(method:% = method, url = url; "Making request");

        let resp = req
            .headers(request_headers)
            .send()
            .await
            .map_err(|e| transport_error(url, e))?;

        let status = resp.status();
        info!(status = status.as_u16(); "Response status");

        let body = resp.bytes().await.map_err(|e| {
            if e.is_timeout() {
                ApiError::timeout(url, e)
            } else {
                ApiError::unexpected(url, e)
            }
        })?;

        classify_response(status, &body)?;
        Ok(body.to_vec())
    }

    /// Returns the shared transport handle, creating it under the lock if needed.
    fn handle(&self) -> ApiResult<ClientWithMiddleware> {
        let mut guard = self.lock_handle();
        if let Some(client) = guard.as_ref() {
            return Ok(client.clone());
        }

        let client = self.build_handle()?;
        *guard = Some(client.clone());
        debug!(base_url = &*self.base_url, timeout_secs = self.timeout.as_secs(); "HTTP client opened");
        Ok(client)
    }

    fn build_handle(&self) -> ApiResult<ClientWithMiddleware> {
        let inner_client = reqwest::Client::builder()
            .timeout(self.timeout)
            .redirect(Policy::none())
            .build()
            .map_err(|e| ApiError::request(&self.base_url, e))?;

        let mut builder = reqwest_middleware::ClientBuilder::new(inner_client);
        if self.max_retries > 0 {
            let retry_policy =
                reqwest_retry::policies::ExponentialBackoff::builder().build_with_max_retries(self.max_retries);
            builder = builder.with(reqwest_retry::RetryTransientMiddleware::new_with_policy(retry_policy));
        }

        Ok(builder.build())
    }

    fn lock_handle(&self) -> std::sync::MutexGuard<'_, Option<ClientWithMiddleware>> {
        self.handle.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl std::fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiClient")
            .field("base_url", &self.base_url)
            .field("timeout", &self.timeout)
            .field("max_retries", &self.max_retries)
            .field("open", &self.is_open())
            .finish()
    }
}

/// Scope guard returned by [`ApiClient::session`]; closes the client on drop.
pub struct ApiSession<'a> {
    client: &'a ApiClient,
}

impl Deref for ApiSession<'_> {
    type Target = ApiClient;

    fn deref(&self) -> &Self::Target {
        self.client
    }
}

impl Drop for ApiSession<'_> {
    fn drop(&mut self) {
        self.client.close();
    }
}

/// Maps a response status onto the success/client/generic outcome.
pub(crate) fn classify_response(status: StatusCode, body: &[u8]) -> ApiResult<()> {
    let code = status.as_u16();
    match code {
        200..=299 => Ok(()),
        400..=499 => Err(ApiError::client(code, error_payload(body))),
        _ => Err(ApiError::status(code, error_payload(body))),
    }
}

fn error_payload(body: &[u8]) -> Value {
    if body.is_empty() {
        return empty_payload();
    }
    serde_json::from_slice(body).unwrap_or_else(|_| empty_payload())
}

/// Timeout first, then connect. A failed name lookup also reports
/// `is_connect()`, but no connection was attempted, so it stays generic.
fn transport_error(url: &str, err: reqwest_middleware::Error) -> ApiError {
    let (is_timeout, is_connect) = find_reqwest_error(&err)
        .map(|e| (e.is_timeout(), e.is_connect() && !is_dns_failure(e)))
        .unwrap_or((false, false));

    if is_timeout {
        ApiError::timeout(url, err)
    } else if is_connect {
        ApiError::connection(url, err)
    } else {
        ApiError::request(url, err)
    }
}

/// hyper's connector reports resolver failures as a `dns error` cause, with
/// the resolver's own `failed to lookup address` error beneath it.
fn is_dns_failure(err: &reqwest::Error) -> bool {
    let mut cause = std::error::Error::source(err);
    while let Some(e) = cause {
        let msg = e.to_string();
        if msg.starts_with("dns error") || msg.contains("failed to lookup address") {
            return true;
        }
        cause = std::error::Error::source(e);
    }
    false
}

/// Digs the `reqwest` error out of a middleware error, including errors the
/// retry middleware wrapped after its last attempt.
fn find_reqwest_error(err: &reqwest_middleware::Error) -> Option<&reqwest::Error> {
    match err {
        reqwest_middleware::Error::Reqwest(e) => Some(e),
        reqwest_middleware::Error::Middleware(e) => e.chain().find_map(|cause| {
            cause
                .downcast_ref::<reqwest::Error>()
                .or_else(|| cause.downcast_ref::<reqwest_middleware::Error>().and_then(find_reqwest_error))
        }),
    }
}

fn log_failure(err: &ApiError) {
    error!(
        kind:% = err.kind(),
        status:? = err.status_code(),
        error:% = err;
        "API request failed"
    );
}
