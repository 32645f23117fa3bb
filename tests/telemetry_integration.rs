//! Span export through OTLP/HTTP to an in-process collector.
//!
//! `telemetry::init` installs the global subscriber, so this file holds a
//! single test.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use axum::{Router, body::Bytes, extract::State, http::HeaderMap, routing::post};
use catalog_chat::config::{LogFormat, TelemetryConfig};
use catalog_chat::telemetry;

#[derive(Clone, Default)]
struct Collector {
    exports: Arc<Mutex<Vec<(HeaderMap, Bytes)>>>,
}

async fn traces_handler(State(collector): State<Collector>, headers: HeaderMap, body: Bytes) {
    collector.exports.lock().unwrap().push((headers, body));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_spans_exported_to_otlp_endpoint() {
    let collector = Collector::default();
    let app = Router::new()
        .route("/v1/traces", post(traces_handler))
        .with_state(collector.clone());
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    let cfg = TelemetryConfig {
        service_name: "catalog-chat-test".to_string(),
        log_format: LogFormat::Compact,
        otlp_endpoint: Some(format!("http://{addr}/v1/traces")),
        otlp_headers: HashMap::from([("x-api-key".to_string(), "abc".to_string())]),
    };
    let guard = telemetry::init(&cfg).unwrap();

    tracing::info_span!("seed_catalog_export_check", records = 3).in_scope(|| {
        tracing::info!("inside span");
    });

    // The OTLP exporter uses a blocking HTTP client; flush off the runtime.
    tokio::task::spawn_blocking(move || {
        let mut guard = guard;
        guard.shutdown()
    })
    .await
    .unwrap()
    .unwrap();

    let exports = collector.exports.lock().unwrap();
    assert!(!exports.is_empty(), "no spans reached the collector");

    let (headers, _) = &exports[0];
    assert_eq!(
        headers.get("x-api-key").and_then(|v| v.to_str().ok()),
        Some("abc")
    );

    // protobuf carries strings as raw UTF-8
    let contains = |needle: &[u8]| {
        exports
            .iter()
            .any(|(_, body)| body.windows(needle.len()).any(|w| w == needle))
    };
    assert!(contains(b"seed_catalog_export_check"));
    assert!(contains(b"catalog-chat-test"));
}
