//! Product analytics and error reporting
//!
//! Best-effort event capture. Each event is posted from a detached task, so a
//! slow or unreachable sink never delays a response. Unexpected failures go
//! to the error-reporting sink as an envelope and to analytics as
//! `api.exception`.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use reqwest::{Client, Url};
use serde_json::{json, Map, Value};
use tokio::task::JoinHandle;
use tracing::warn;
use uuid::Uuid;

use crate::config::Config;
use crate::tasks::spawn_detached;

const SERVICE_NAME: &str = "api-gateway";
const SDK_NAME: &str = "trust-gateway-telemetry";
const SDK_VERSION: &str = env!("CARGO_PKG_VERSION");

// == Sinks ==
#[derive(Debug, Clone)]
struct CaptureSink {
    endpoint: String,
    api_key: String,
}

/// Error-reporting endpoint derived from a DSN
/// (`{scheme}://{public_key}@{host}/{project_id}`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorSink {
    endpoint: String,
    public_key: String,
}

impl ErrorSink {
    /// Parses a DSN, `None` when it lacks a key or project id.
    pub fn from_dsn(dsn: &str) -> Option<Self> {
        let url = Url::parse(dsn).ok()?;
        let public_key = url.username();
        let project_id = url.path().replace('/', "");
        let host = url.host_str()?;
        if public_key.is_empty() || project_id.is_empty() {
            return None;
        }

        let authority = match url.port() {
            Some(port) => format!("{}:{}", host, port),
            None => host.to_string(),
        };
        Some(Self {
            endpoint: format!(
                "{}://{}/api/{}/envelope/",
                url.scheme(),
                authority,
                project_id
            ),
            public_key: public_key.to_string(),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    fn auth_header(&self) -> String {
        format!(
            "Sentry sentry_version=7, sentry_key={}",
            self.public_key
        )
    }
}

// == Telemetry ==
/// Event tracker shared by all handlers. Each sink is disabled when its
/// setting is absent.
#[derive(Debug, Clone)]
pub struct Telemetry {
    client: Client,
    sink: Option<CaptureSink>,
    errors: Option<ErrorSink>,
    failures: Arc<AtomicU64>,
}

impl Telemetry {
    /// A tracker that drops every event.
    pub fn disabled() -> Self {
        Self {
            client: Client::new(),
            sink: None,
            errors: None,
            failures: Arc::new(AtomicU64::new(0)),
        }
    }

    /// A tracker posting to `{host}/capture/` with `api_key`.
    pub fn new(client: Client, host: &str, api_key: impl Into<String>) -> Self {
        Self {
            client,
            sink: Some(CaptureSink {
                endpoint: format!("{}/capture/", host.trim_end_matches('/')),
                api_key: api_key.into(),
            }),
            errors: None,
            failures: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Adds error reporting to `dsn`. An unusable DSN is logged and ignored.
    pub fn with_error_reporting(mut self, dsn: &str) -> Self {
        self.errors = ErrorSink::from_dsn(dsn);
        if self.errors.is_none() {
            warn!("SENTRY_DSN is not a usable DSN, error reporting disabled");
        }
        self
    }

    pub fn from_config(config: &Config) -> Self {
        let telemetry = match &config.posthog_key {
            Some(key) => Self::new(Client::new(), &config.posthog_host, key.clone()),
            None => Self::disabled(),
        };
        match &config.sentry_dsn {
            Some(dsn) => telemetry.with_error_reporting(dsn),
            None => telemetry,
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.sink.is_some()
    }

    pub fn reports_errors(&self) -> bool {
        self.errors.is_some()
    }

    /// Number of events whose delivery failed.
    pub fn failures(&self) -> u64 {
        self.failures.load(Ordering::Relaxed)
    }

    // == Capture ==
    /// Queues `event` with `properties` for delivery.
    ///
    /// Returns the delivery task's handle, or `None` when disabled.
    pub fn track(&self, event: &str, properties: Value) -> Option<JoinHandle<()>> {
        let sink = self.sink.clone()?;
        let payload = capture_payload(&sink.api_key, event, properties);
        let request = self.client.post(&sink.endpoint).json(&payload);
        Some(self.deliver("telemetry.capture", request))
    }

    /// Reports an unexpected failure with request `context` to both sinks.
    ///
    /// Returns the handles of the queued deliveries.
    pub fn capture_exception(&self, message: &str, context: Value) -> Vec<JoinHandle<()>> {
        let mut handles = Vec::new();

        if let Some(errors) = &self.errors {
            let request = self
                .client
                .post(errors.endpoint())
                .header("content-type", "application/x-sentry-envelope")
                .header("x-sentry-auth", errors.auth_header())
                .body(error_envelope(message, &context));
            handles.push(self.deliver("telemetry.exception", request));
        }

        let mut properties = as_object(context);
        properties.insert("message".to_string(), json!(message));
        properties.insert("level".to_string(), json!("error"));
        handles.extend(self.track("api.exception", Value::Object(properties)));

        handles
    }

    fn deliver(&self, label: &'static str, request: reqwest::RequestBuilder) -> JoinHandle<()> {
        let failures = self.failures.clone();
        spawn_detached(label, async move {
            let result = request
                .send()
                .await
                .and_then(|response| response.error_for_status())
                .map(|_| ());
            if result.is_err() {
                failures.fetch_add(1, Ordering::Relaxed);
            }
            result
        })
    }
}

// == Payloads ==
fn as_object(value: Value) -> Map<String, Value> {
    match value {
        Value::Object(map) => map,
        Value::Null => Map::new(),
        other => {
            let mut map = Map::new();
            map.insert("value".to_string(), other);
            map
        }
    }
}

fn capture_payload(api_key: &str, event: &str, properties: Value) -> Value {
    let mut props = as_object(properties);
    let distinct_id = props
        .get("distinctId")
        .and_then(Value::as_str)
        .unwrap_or(SERVICE_NAME)
        .to_string();
    props.insert("service".to_string(), json!(SERVICE_NAME));
    props.insert(
        "timestamp".to_string(),
        json!(chrono::Utc::now().to_rfc3339()),
    );

    json!({
        "api_key": api_key,
        "event": event,
        "distinct_id": distinct_id,
        "properties": props,
    })
}

/// Three newline-separated JSON documents: envelope header, item header and
/// the event itself.
fn error_envelope(message: &str, context: &Value) -> String {
    let event_id = Uuid::new_v4().simple().to_string();
    let now = chrono::Utc::now();

    let header = json!({
        "event_id": event_id,
        "sent_at": now.to_rfc3339(),
        "sdk": { "name": SDK_NAME, "version": SDK_VERSION },
    });
    let item = json!({ "type": "event" });
    let event = json!({
        "event_id": event_id,
        "timestamp": now.timestamp(),
        "level": "error",
        "platform": "other",
        "logger": SERVICE_NAME,
        "message": message,
        "extra": context,
        "exception": {
            "values": [{ "type": "panic", "value": message }]
        },
    });

    format!("{}\n{}\n{}", header, item, event)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{body::Bytes, extract::State, http::StatusCode, routing::post, Router};
    use std::sync::Mutex;

    async fn serve(app: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move { axum::serve(listener, app).await.unwrap() });
        format!("http://{}", addr)
    }

    #[test]
    fn test_disabled_tracker_drops_events() {
        let telemetry = Telemetry::disabled();
        assert!(!telemetry.is_enabled());
        assert!(!telemetry.reports_errors());
        assert!(telemetry.track("quiz.submitted", json!({})).is_none());
        assert!(telemetry.capture_exception("boom", json!({})).is_empty());
    }

    #[test]
    fn test_capture_payload_shape() {
        let payload = capture_payload("phc_key", "sip.generated", json!({"horizonMonths": 24}));

        assert_eq!(payload["api_key"], "phc_key");
        assert_eq!(payload["event"], "sip.generated");
        assert_eq!(payload["distinct_id"], "api-gateway");
        assert_eq!(payload["properties"]["horizonMonths"], 24);
        assert_eq!(payload["properties"]["service"], "api-gateway");
        assert!(payload["properties"]["timestamp"].is_string());
    }

    #[test]
    fn test_capture_payload_distinct_id_override() {
        let payload = capture_payload("k", "e", json!({"distinctId": "user-1"}));
        assert_eq!(payload["distinct_id"], "user-1");
    }

    #[test]
    fn test_error_sink_from_dsn() {
        let sink = ErrorSink::from_dsn("https://abc123@o1.ingest.example.io/42").unwrap();
        assert_eq!(sink.endpoint(), "https://o1.ingest.example.io/api/42/envelope/");
        assert_eq!(sink.auth_header(), "Sentry sentry_version=7, sentry_key=abc123");

        let sink = ErrorSink::from_dsn("http://key@127.0.0.1:9000/7").unwrap();
        assert_eq!(sink.endpoint(), "http://127.0.0.1:9000/api/7/envelope/");
    }

    #[test]
    fn test_error_sink_rejects_incomplete_dsn() {
        assert!(ErrorSink::from_dsn("https://o1.ingest.example.io/42").is_none());
        assert!(ErrorSink::from_dsn("https://abc@o1.ingest.example.io/").is_none());
        assert!(ErrorSink::from_dsn("not a dsn").is_none());
    }

    #[test]
    fn test_error_envelope_lines() {
        let envelope = error_envelope("boom", &json!({"path": "/api/quiz/submit"}));
        let lines: Vec<Value> = envelope
            .lines()
            .map(|line| serde_json::from_str(line).unwrap())
            .collect();

        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0]["event_id"], lines[2]["event_id"]);
        assert_eq!(lines[0]["event_id"].as_str().unwrap().len(), 32);
        assert_eq!(lines[1]["type"], "event");
        assert_eq!(lines[2]["level"], "error");
        assert_eq!(lines[2]["message"], "boom");
        assert_eq!(lines[2]["extra"]["path"], "/api/quiz/submit");
    }

    #[tokio::test]
    async fn test_rejected_capture_counts_failure() {
        let app = Router::new().route("/capture/", post(|| async { StatusCode::INTERNAL_SERVER_ERROR }));
        let base = serve(app).await;

        let telemetry = Telemetry::new(Client::new(), &base, "k");
        let handle = telemetry.track("trust_score.viewed", json!({})).unwrap();
        handle.await.unwrap();

        assert_eq!(telemetry.failures(), 1);
    }

    #[tokio::test]
    async fn test_capture_exception_reaches_both_sinks() {
        type Seen = Arc<Mutex<Vec<(String, String)>>>;
        let seen: Seen = Arc::default();

        async fn record(State(seen): State<Seen>, uri: axum::http::Uri, body: Bytes) -> StatusCode {
            let body = String::from_utf8_lossy(&body).to_string();
            seen.lock().unwrap().push((uri.path().to_string(), body));
            StatusCode::OK
        }

        let app = Router::new()
            .route("/capture/", post(record))
            .route("/api/42/envelope/", post(record))
            .with_state(seen.clone());
        let base = serve(app).await;
        let dsn = base.replacen("http://", "http://pubkey@", 1) + "/42";

        let telemetry = Telemetry::new(Client::new(), &base, "k").with_error_reporting(&dsn);
        let handles = telemetry.capture_exception("boom", json!({"method": "GET"}));
        assert_eq!(handles.len(), 2);
        for handle in handles {
            handle.await.unwrap();
        }

        let seen = seen.lock().unwrap();
        let envelope = seen.iter().find(|(path, _)| path == "/api/42/envelope/").unwrap();
        assert!(envelope.1.contains("\"message\":\"boom\""));
        let capture = seen.iter().find(|(path, _)| path == "/capture/").unwrap();
        let payload: Value = serde_json::from_str(&capture.1).unwrap();
        assert_eq!(payload["event"], "api.exception");
        assert_eq!(payload["properties"]["method"], "GET");
        assert_eq!(payload["properties"]["level"], "error");
        assert_eq!(telemetry.failures(), 0);
    }
}
