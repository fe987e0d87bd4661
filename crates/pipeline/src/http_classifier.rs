//! [`Classifier`] backed by a remote model service over HTTP.
//!
//! The service receives `POST <CLASSIFIER_URL>` with
//! `{"features": [pH, Sulphate, Hardness, Conductivity, TDS, Turbidity]}`
//! and answers `{"label": 0|1, "probabilities": [p_unsafe, p_safe]}`.

use async_trait::async_trait;
use serde::Serialize;

use crate::capability::{Classifier, RawPrediction};
use crate::error::CapabilityError;

const CAPABILITY: &str = "classifier";

/// Location of the model service.
#[derive(Debug, Clone)]
pub struct ClassifierConfig {
    pub url: String,
}

impl ClassifierConfig {
    /// Returns `None` if `CLASSIFIER_URL` is unset or blank, in which case
    /// the pipeline runs without a model.
    pub fn from_env() -> Option<Self> {
        let url = std::env::var("CLASSIFIER_URL").ok()?;
        let url = url.trim();
        if url.is_empty() {
            return None;
        }
        Some(Self {
            url: url.to_string(),
        })
    }
}

#[derive(Debug, Serialize)]
struct PredictRequest<'a> {
    features: &'a [f64; 6],
}

/// HTTP client for the model service.
pub struct HttpClassifier {
    client: reqwest::Client,
    url: String,
}

impl HttpClassifier {
    pub fn new(config: ClassifierConfig) -> Self {
        Self::with_client(reqwest::Client::new(), config)
    }

    /// Reuse an existing [`reqwest::Client`] connection pool.
    pub fn with_client(client: reqwest::Client, config: ClassifierConfig) -> Self {
        Self {
            client,
            url: config.url,
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl Classifier for HttpClassifier {
    async fn predict(&self, features: [f64; 6]) -> Result<RawPrediction, CapabilityError> {
        let response = self
            .client
            .post(&self.url)
            .json(&PredictRequest {
                features: &features,
            })
            .send()
            .await
            .map_err(|e| CapabilityError::failed(CAPABILITY, e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "<unreadable body>".to_string());
            return Err(CapabilityError::failed(
                CAPABILITY,
                format!("HTTP {}: {body}", status.as_u16()),
            ));
        }

        response
            .json::<RawPrediction>()
            .await
            .map_err(|e| CapabilityError::malformed(CAPABILITY, e))
    }
}
