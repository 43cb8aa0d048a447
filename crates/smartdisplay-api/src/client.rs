// Backend HTTP client
//
// Wraps `reqwest::Client` with base-URL resolution, request-ID tagging,
// per-request timeouts and envelope classification. Endpoint wrappers live
// in `endpoints.rs` as inherent methods to keep this module about transport.

use std::time::{Duration, Instant};

use reqwest::StatusCode;
use reqwest::header::ACCEPT;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};
use url::Url;

use crate::envelope::{self, Envelope};
use crate::error::{ClientBuildError, Error};
use crate::request::{Method, RequestId, RequestOptions};
use crate::transport::TransportConfig;

/// Header carrying the per-request ID.
pub const REQUEST_ID_HEADER: &str = "X-Request-ID";

/// Raw result of a completed exchange, before classification.
struct RawResponse {
    status: StatusCode,
    text: String,
}

/// A classified success, still carrying its request identity.
struct Settled {
    request_id: RequestId,
    body: Value,
}

/// Async client for the smart display backend.
///
/// Cheap to clone: the inner `reqwest::Client` is reference counted.
/// Each call settles exactly once: the exchange runs on its own task and is
/// raced against the timeout; whichever finishes first decides the outcome
/// and the loser is cancelled.
#[derive(Debug, Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: Url,
    default_timeout: Duration,
}

impl ApiClient {
    /// Build a client for `base_url` from a `TransportConfig`.
    pub fn new(base_url: &str, transport: &TransportConfig) -> Result<Self, ClientBuildError> {
        let base_url = Url::parse(base_url)?;
        let http = transport.build_client()?;
        Ok(Self {
            http,
            base_url,
            default_timeout: transport.default_timeout,
        })
    }

    /// Wrap a pre-built `reqwest::Client`.
    pub fn with_client(http: reqwest::Client, base_url: Url, default_timeout: Duration) -> Self {
        Self {
            http,
            base_url,
            default_timeout,
        }
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    pub fn default_timeout(&self) -> Duration {
        self.default_timeout
    }

    // ── URL resolution ───────────────────────────────────────────────

    /// Resolve an endpoint against the base URL.
    ///
    /// Absolute `http(s)://` endpoints are used verbatim; anything else is
    /// appended to the base URL (keeping any path prefix the base carries).
    pub fn resolve_url(&self, endpoint: &str) -> Result<Url, url::ParseError> {
        if endpoint.starts_with("http://") || endpoint.starts_with("https://") {
            return Url::parse(endpoint);
        }
        let base = self.base_url.as_str().trim_end_matches('/');
        let path = endpoint.trim_start_matches('/');
        Url::parse(&format!("{base}/{path}"))
    }

    // ── Public verbs ─────────────────────────────────────────────────

    /// `GET` an endpoint and return the parsed success payload.
    pub async fn get(&self, endpoint: &str, options: RequestOptions) -> Result<Value, Error> {
        Ok(self.execute(Method::Get, endpoint, None, options).await?.body)
    }

    /// `POST` a JSON body and return the parsed success payload.
    pub async fn post<B: Serialize + ?Sized>(
        &self,
        endpoint: &str,
        body: &B,
        options: RequestOptions,
    ) -> Result<Value, Error> {
        let body = encode_body(endpoint, body)?;
        Ok(self
            .execute(Method::Post, endpoint, Some(body), options)
            .await?
            .body)
    }

    /// `GET` and decode the success payload into `T`.
    pub async fn get_json<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        options: RequestOptions,
    ) -> Result<T, Error> {
        let settled = self.execute(Method::Get, endpoint, None, options).await?;
        decode(endpoint, settled)
    }

    /// `POST` and decode the success payload into `T`.
    pub async fn post_json<T: DeserializeOwned, B: Serialize + ?Sized>(
        &self,
        endpoint: &str,
        body: &B,
        options: RequestOptions,
    ) -> Result<T, Error> {
        let body = encode_body(endpoint, body)?;
        let settled = self
            .execute(Method::Post, endpoint, Some(body), options)
            .await?;
        decode(endpoint, settled)
    }

    // ── Request lifecycle ────────────────────────────────────────────

    async fn execute(
        &self,
        method: Method,
        endpoint: &str,
        body: Option<Value>,
        options: RequestOptions,
    ) -> Result<Settled, Error> {
        let request_id = RequestId::generate();
        let timeout = options.timeout.unwrap_or(self.default_timeout);

        let url = self.resolve_url(endpoint).map_err(|e| {
            warn!(request_id = %request_id, endpoint, error = %e, "invalid request URL");
            Error::network(&request_id, endpoint, format!("invalid URL: {e}"), e)
        })?;

        debug!(
            request_id = %request_id,
            %method,
            %url,
            timeout_ms = %timeout.as_millis(),
            "request started"
        );
        let started = Instant::now();

        let mut builder = match method {
            Method::Get => self.http.get(url),
            Method::Post => self.http.post(url),
        }
        .header(REQUEST_ID_HEADER, request_id.as_str());
        if !options.sets_header(ACCEPT.as_str()) {
            builder = builder.header(ACCEPT, "application/json");
        }
        for (name, value) in &options.headers {
            if name.eq_ignore_ascii_case(REQUEST_ID_HEADER) {
                debug!(request_id = %request_id, "ignoring caller-supplied request ID");
                continue;
            }
            builder = builder.header(name.as_str(), value.as_str());
        }
        if let Some(ref body) = body {
            builder = builder.json(body);
        }

        // The exchange runs on its own task; the token cancels it on timeout
        // and the drop guard cancels it if this future is dropped mid-flight.
        let cancel = CancellationToken::new();
        let _guard = cancel.clone().drop_guard();
        let task_cancel = cancel.clone();
        let mut exchange = tokio::spawn(async move {
            tokio::select! {
                biased;
                () = task_cancel.cancelled() => None,
                result = send_and_read(builder) => Some(result),
            }
        });

        let joined = tokio::select! {
            joined = &mut exchange => joined,
            () = tokio::time::sleep(timeout) => {
                if let Some(ref hook) = options.on_timeout {
                    hook(&request_id, endpoint);
                }
                cancel.cancel();
                warn!(
                    request_id = %request_id,
                    endpoint,
                    timeout_ms = %timeout.as_millis(),
                    "request timed out"
                );
                return Err(Error::timeout(&request_id, endpoint, timeout));
            }
        };

        let raw = match joined {
            Ok(Some(Ok(raw))) => raw,
            Ok(Some(Err(e))) => {
                warn!(request_id = %request_id, endpoint, error = %e, "network error");
                return Err(Error::network(&request_id, endpoint, describe_transport(&e), e));
            }
            Ok(None) => {
                return Err(Error::network(
                    &request_id,
                    endpoint,
                    "request cancelled",
                    std::io::Error::from(std::io::ErrorKind::Interrupted),
                ));
            }
            Err(join_err) => {
                warn!(request_id = %request_id, endpoint, error = %join_err, "request task failed");
                return Err(Error::network(
                    &request_id,
                    endpoint,
                    "request task failed",
                    join_err,
                ));
            }
        };

        let result = classify(&request_id, endpoint, raw);
        match &result {
            Ok(_) => debug!(
                request_id = %request_id,
                endpoint,
                elapsed_ms = %started.elapsed().as_millis(),
                "request succeeded"
            ),
            Err(e) => warn!(
                request_id = %request_id,
                endpoint,
                kind = %e.kind,
                status = ?e.status,
                message = %e.message,
                "request failed"
            ),
        }
        result.map(|body| Settled { request_id, body })
    }
}

async fn send_and_read(builder: reqwest::RequestBuilder) -> Result<RawResponse, reqwest::Error> {
    let resp = builder.send().await?;
    let status = resp.status();
    let text = resp.text().await?;
    Ok(RawResponse { status, text })
}

/// Apply the success / HTTP / API / parse classification to a response.
fn classify(request_id: &RequestId, endpoint: &str, raw: RawResponse) -> Result<Value, Error> {
    let parsed = envelope::parse_body(&raw.text);

    if !raw.status.is_success() {
        return Err(Error::http(request_id, endpoint, raw.status, parsed.ok()));
    }

    let body = parsed
        .map_err(|e| Error::parse(request_id, endpoint, raw.status.as_u16(), e, &raw.text))?;

    match Envelope::classify(body.clone()) {
        Envelope::Success(value) => Ok(value),
        Envelope::Failure(env) => Err(Error::api(
            request_id,
            endpoint,
            raw.status.as_u16(),
            env,
            body,
        )),
    }
}

fn decode<T: DeserializeOwned>(endpoint: &str, settled: Settled) -> Result<T, Error> {
    serde_json::from_value(settled.body.clone())
        .map_err(|e| Error::decode(&settled.request_id, endpoint, e, settled.body))
}

fn encode_body<B: Serialize + ?Sized>(endpoint: &str, body: &B) -> Result<Value, Error> {
    serde_json::to_value(body).map_err(|e| {
        let request_id = RequestId::generate();
        Error::encode(&request_id, endpoint, e)
    })
}

fn describe_transport(err: &reqwest::Error) -> String {
    if err.is_connect() {
        format!("connection failed: {err}")
    } else if err.is_builder() {
        format!("invalid request: {err}")
    } else if err.is_body() || err.is_decode() {
        format!("response body could not be read: {err}")
    } else {
        format!("transport error: {err}")
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn client(base: &str) -> ApiClient {
        ApiClient::with_client(
            reqwest::Client::new(),
            Url::parse(base).unwrap(),
            Duration::from_secs(30),
        )
    }

    #[test]
    fn relative_endpoint_is_prefixed() {
        let c = client("http://kiosk.local:8090");
        assert_eq!(
            c.resolve_url("/ui/home/state").unwrap().as_str(),
            "http://kiosk.local:8090/ui/home/state"
        );
        assert_eq!(
            c.resolve_url("ui/home/state").unwrap().as_str(),
            "http://kiosk.local:8090/ui/home/state"
        );
    }

    #[test]
    fn base_path_prefix_is_kept() {
        let c = client("http://kiosk.local/backend/");
        assert_eq!(
            c.resolve_url("/api/login").unwrap().as_str(),
            "http://kiosk.local/backend/api/login"
        );
    }

    #[test]
    fn absolute_endpoint_is_used_verbatim() {
        let c = client("http://kiosk.local:8090");
        assert_eq!(
            c.resolve_url("https://other.host/ui/menu").unwrap().as_str(),
            "https://other.host/ui/menu"
        );
    }

    #[test]
    fn classify_error_envelope_on_ok_is_api_error() {
        let id = RequestId::generate();
        let err = classify(
            &id,
            "/api/login",
            RawResponse {
                status: StatusCode::OK,
                text: r#"{"error":"bad pin"}"#.into(),
            },
        )
        .unwrap_err();
        assert_eq!(err.kind, crate::ErrorKind::ApiError);
        assert_eq!(err.message, "bad pin");
    }

    #[test]
    fn classify_unparseable_non_2xx_is_http_error_without_body() {
        let id = RequestId::generate();
        let err = classify(
            &id,
            "/ui/home/state",
            RawResponse {
                status: StatusCode::BAD_GATEWAY,
                text: "<html>bad gateway</html>".into(),
            },
        )
        .unwrap_err();
        assert_eq!(err.kind, crate::ErrorKind::HttpError);
        assert_eq!(err.status, Some(502));
        assert!(err.body.is_none());
    }
}
