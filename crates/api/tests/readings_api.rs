//! Integration tests for `/api/v1/predict`, `/status`, and `/history`.

mod common;

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use axum::http::StatusCode;
use common::{bare_pipeline, body_json, get, post_json, post_raw};
use hydrowatch_events::BroadcastHub;
use hydrowatch_pipeline::{
    CapabilityError, Classifier, Notifier, PipelineConfig, RawPrediction, ReadingPipeline,
};
use serde_json::json;

struct AlwaysUnsafe;

#[async_trait]
impl Classifier for AlwaysUnsafe {
    async fn predict(&self, _features: [f64; 6]) -> Result<RawPrediction, CapabilityError> {
        Ok(RawPrediction {
            label: 0,
            probabilities: vec![0.9, 0.1],
        })
    }
}

#[derive(Default)]
struct CountingNotifier(AtomicUsize);

#[async_trait]
impl Notifier for CountingNotifier {
    async fn notify(
        &self,
        _subject: &str,
        _body: &str,
        _recipient: &str,
    ) -> Result<(), CapabilityError> {
        self.0.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

#[tokio::test]
async fn predict_returns_enriched_result() {
    let app = common::build_test_app(bare_pipeline());

    let response = post_json(
        app,
        "/api/v1/predict",
        json!({"pH": 9.0, "TDS": "450", "timestamp": "2025-06-01T08:00:00"}),
    )
    .await;

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    let data = &json["data"];
    assert_eq!(data["reading"]["source"], "API");
    assert_eq!(data["reading"]["pH"], 9.0);
    assert_eq!(data["reading"]["TDS"], 450.0);
    assert_eq!(data["reading"]["Sulphate"], 250.0);
    assert_eq!(data["reading"]["timestamp"], "2025-06-01T08:00:00");
    assert_eq!(data["classification"]["label"], "Unsafe");
    assert_eq!(data["classification"]["confidence"], 0.0);
    assert_eq!(data["thresholds"]["pH"]["is_safe"], false);
    assert_eq!(data["thresholds"]["TDS"]["is_safe"], true);
    assert_eq!(data["consecutive_count"], 1);
    assert_eq!(data["alert_sent"], false);
}

#[tokio::test]
async fn predict_rejects_non_numeric_parameter() {
    let pipeline = bare_pipeline();
    let app = common::build_test_app(Arc::clone(&pipeline));

    let response = post_json(app, "/api/v1/predict", json!({"pH": "acidic"})).await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = body_json(response).await;
    assert_eq!(json["code"], "VALIDATION_ERROR");
    assert_eq!(pipeline.status().consecutive_count, 0);
}

#[tokio::test]
async fn predict_rejects_non_object_body() {
    let app = common::build_test_app(bare_pipeline());

    let response = post_json(app, "/api/v1/predict", json!([7.0, 250.0])).await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["code"], "BAD_REQUEST");
}

#[tokio::test]
async fn predict_rejects_malformed_json_with_error_body() {
    let app = common::build_test_app(bare_pipeline());

    let response = post_raw(
        app,
        "/api/v1/predict",
        Some("application/json"),
        r#"{"pH": 7."#,
    )
    .await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = body_json(response).await;
    assert_eq!(json["code"], "BAD_REQUEST");
    assert!(json["error"].is_string());
}

#[tokio::test]
async fn predict_without_content_type_returns_error_body() {
    let app = common::build_test_app(bare_pipeline());

    let response = post_raw(app, "/api/v1/predict", None, r#"{"pH": 7.0}"#).await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["code"], "BAD_REQUEST");
}

#[tokio::test]
async fn fifth_unsafe_reading_sends_alert() {
    let notifier = Arc::new(CountingNotifier::default());
    let pipeline = ReadingPipeline::new(
        &PipelineConfig::default(),
        Arc::new(BroadcastHub::default()),
    )
    .unwrap()
    .with_classifier(Arc::new(AlwaysUnsafe))
    .with_notifier(notifier.clone(), "ops@example.com");
    let pipeline = Arc::new(pipeline);

    let mut last = serde_json::Value::Null;
    for _ in 0..5 {
        let app = common::build_test_app(Arc::clone(&pipeline));
        let response = post_json(app, "/api/v1/predict", json!({"pH": 9.0})).await;
        assert_eq!(response.status(), StatusCode::OK);
        last = body_json(response).await;
    }

    assert_eq!(last["data"]["consecutive_count"], 5);
    assert_eq!(last["data"]["alert_sent"], true);
    assert_eq!(last["data"]["classification"]["confidence"], 90.0);
    assert_eq!(notifier.0.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn status_reports_degraded_capabilities() {
    let pipeline = bare_pipeline();
    let app = common::build_test_app(Arc::clone(&pipeline));
    post_json(
        common::build_test_app(Arc::clone(&pipeline)),
        "/api/v1/predict",
        json!({}),
    )
    .await;

    let response = get(app, "/api/v1/status").await;

    assert_eq!(response.status(), StatusCode::OK);
    let data = &body_json(response).await["data"];
    assert_eq!(data["classifier_loaded"], false);
    assert_eq!(data["notifier_configured"], false);
    assert_eq!(data["consecutive_count"], 1);
    assert_eq!(data["alert_armed"], false);
    assert_eq!(data["threshold"], 5);
    assert_eq!(data["mqtt_connected"], false);
    assert_eq!(data["database_enabled"], false);
}

#[tokio::test]
async fn history_without_database_is_empty() {
    let app = common::build_test_app(bare_pipeline());

    let response = get(app, "/api/v1/history").await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["data"], json!([]));
}

#[tokio::test]
async fn history_rejects_out_of_range_limit() {
    let app = common::build_test_app(bare_pipeline());

    let response = get(app, "/api/v1/history?limit=5000").await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["code"], "BAD_REQUEST");
}

#[tokio::test]
async fn history_rejects_non_numeric_limit() {
    let app = common::build_test_app(bare_pipeline());

    let response = get(app, "/api/v1/history?limit=lots").await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["code"], "BAD_REQUEST");
}
