//! The reading pipeline: one entry point for every ingestion source.
//!
//! [`ReadingPipeline::process`] runs classify, evaluate, tracker transition
//! (with alert dispatch), assembly and fan-out for one reading while holding
//! the tracker lock. Concurrent producers are therefore serialized, and
//! observers receive results in the order the tracker applied them.
//!
//! An accepted reading is applied on a spawned task, so it always runs to
//! completion even when the caller stops waiting for it.

use std::sync::Arc;
use std::time::Duration;

use chrono::Local;
use hydrowatch_core::contamination::{ContaminationTracker, Transition};
use hydrowatch_core::error::CoreError;
use hydrowatch_core::reading::{missing_parameters, Reading, ReadingDefaults};
use hydrowatch_core::result::EnrichedResult;
use hydrowatch_core::thresholds::{evaluate, SafeRangeTable};
use hydrowatch_events::{AlertFired, BroadcastHub, HubEvent};
use serde::Serialize;
use serde_json::{Map, Value};
use tokio::sync::Mutex;

use crate::alert::AlertDispatcher;
use crate::capability::{with_timeout, Classifier, Notifier, ReadingStore};
use crate::classifier::ClassifierAdapter;
use crate::config::PipelineConfig;

/// Operator-facing view of the pipeline's health and contamination state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PipelineStatus {
    pub classifier_loaded: bool,
    pub notifier_configured: bool,
    pub consecutive_count: u32,
    pub alert_armed: bool,
    pub threshold: u32,
}

/// Orchestrates the per-reading sequence.
///
/// Build with [`new`](Self::new), then attach optional capabilities:
///
/// ```rust,ignore
/// let pipeline = ReadingPipeline::new(&config, hub)?
///     .with_classifier(Arc::new(HttpClassifier::new(classifier_config)))
///     .with_notifier(Arc::new(email), "ops@example.com")
///     .with_store(Arc::new(PgReadingStore::new(pool)));
/// ```
pub struct ReadingPipeline {
    tracker: Arc<Mutex<ContaminationTracker>>,
    stages: Arc<Stages>,
    defaults: ReadingDefaults,
    threshold: u32,
}

/// Everything a reading passes through once it holds the tracker lock.
#[derive(Clone)]
struct Stages {
    classifier: ClassifierAdapter,
    dispatcher: AlertDispatcher,
    store: Option<Arc<dyn ReadingStore>>,
    hub: Arc<BroadcastHub>,
    safe_ranges: SafeRangeTable,
    persist_timeout: Duration,
}

impl ReadingPipeline {
    /// A pipeline with no classifier, notifier, or store.
    pub fn new(config: &PipelineConfig, hub: Arc<BroadcastHub>) -> Result<Self, CoreError> {
        let tracker = ContaminationTracker::new(config.contamination_threshold)?;
        Ok(Self {
            threshold: tracker.threshold(),
            tracker: Arc::new(Mutex::new(tracker)),
            stages: Arc::new(Stages {
                classifier: ClassifierAdapter::new(None, config.classifier_timeout),
                dispatcher: AlertDispatcher::unconfigured(config.notify_timeout),
                store: None,
                hub,
                safe_ranges: config.safe_ranges.clone(),
                persist_timeout: config.persist_timeout,
            }),
            defaults: config.defaults.clone(),
        })
    }

    pub fn with_classifier(mut self, classifier: Arc<dyn Classifier>) -> Self {
        let stages = Arc::make_mut(&mut self.stages);
        stages.classifier = ClassifierAdapter::new(Some(classifier), stages.classifier.timeout());
        self
    }

    pub fn with_notifier(mut self, notifier: Arc<dyn Notifier>, recipient: impl Into<String>) -> Self {
        let stages = Arc::make_mut(&mut self.stages);
        stages.dispatcher = AlertDispatcher::new(notifier, recipient, stages.dispatcher.timeout());
        self
    }

    pub fn with_store(mut self, store: Arc<dyn ReadingStore>) -> Self {
        Arc::make_mut(&mut self.stages).store = Some(store);
        self
    }

    pub fn hub(&self) -> &Arc<BroadcastHub> {
        &self.stages.hub
    }

    /// Worst-case time one reading spends in its capabilities once it holds
    /// the tracker lock.
    pub fn capability_budget(&self) -> Duration {
        self.stages.classifier.timeout()
            + self.stages.dispatcher.timeout()
            + self.stages.persist_timeout
    }

    /// Process one decoded reading from `source`.
    ///
    /// Only malformed input fails; it is logged and leaves the contamination
    /// state untouched. Classifier, notifier, store, and broadcast failures
    /// are logged and never reach the caller.
    ///
    /// Once the reading is accepted it is applied on its own task. Dropping
    /// the returned future (a timed-out or disconnected HTTP caller) does not
    /// stop the tracker transition, alert dispatch, or fan-out.
    pub async fn process(
        &self,
        payload: &Map<String, Value>,
        source: &str,
    ) -> Result<EnrichedResult, CoreError> {
        let reading = Reading::from_payload(payload, source, &self.defaults, Local::now())
            .map_err(|e| {
                tracing::warn!(source, error = %e, "Rejected malformed reading");
                e
            })?;

        let missing = missing_parameters(payload);
        if !missing.is_empty() {
            tracing::debug!(source, ?missing, "Defaulted missing parameters");
        }

        let tracker = Arc::clone(&self.tracker);
        let stages = Arc::clone(&self.stages);
        let source = source.to_owned();
        tokio::spawn(async move { stages.apply(&tracker, reading, &source).await })
            .await
            .map_err(|e| {
                tracing::error!(error = %e, "Reading task did not complete");
                CoreError::InvariantViolation(format!("reading task failed: {e}"))
            })
    }

    /// Current capability availability and contamination state.
    ///
    /// Reads the last published state so it never waits on a reading in
    /// flight.
    pub fn status(&self) -> PipelineStatus {
        let state = self.stages.hub.snapshot();
        PipelineStatus {
            classifier_loaded: self.stages.classifier.is_loaded(),
            notifier_configured: self.stages.dispatcher.is_configured(),
            consecutive_count: state.consecutive_count,
            alert_armed: state.alert_armed,
            threshold: self.threshold,
        }
    }
}

impl Stages {
    async fn apply(
        &self,
        tracker: &Mutex<ContaminationTracker>,
        reading: Reading,
        source: &str,
    ) -> EnrichedResult {
        let mut tracker = tracker.lock().await;

        if let Err(e) = tracker.verify() {
            tracing::error!(
                error = %e,
                state = ?tracker.state(),
                "Contamination state corrupted, resetting to nominal"
            );
            tracker.reset();
        }

        let classification = self.classifier.classify(&reading).await;
        let thresholds = evaluate(&reading, &self.safe_ranges);

        let transition = tracker.observe(classification.label);
        let mut alert = None;
        match transition {
            Transition::DispatchDue => {
                let count = tracker.state().consecutive_count;
                if self.dispatcher.dispatch(&reading, &thresholds, count).await {
                    tracker.confirm_dispatch();
                    alert = Some(AlertFired {
                        consecutive_count: count,
                        reading_timestamp: reading.timestamp.clone(),
                        timestamp: Local::now().to_rfc3339(),
                    });
                }
            }
            Transition::Reset { previous_count } if previous_count > 0 => {
                tracing::info!(previous_count, "Contamination streak cleared");
            }
            _ => {}
        }

        let state = tracker.state();
        let result = EnrichedResult {
            reading,
            classification,
            thresholds,
            consecutive_count: state.consecutive_count,
            alert_sent: state.alert_armed,
        };

        if let Some(alert) = alert {
            self.hub.publish(HubEvent::AlertFired(alert));
        }

        let (_, observers) = tokio::join!(self.persist(&result), async {
            self.hub.publish(HubEvent::PredictionUpdate(result.clone()))
        });

        // Release only after fan-out so observers see readings in order.
        drop(tracker);

        tracing::info!(
            source,
            label = %result.classification.label,
            confidence = result.classification.confidence,
            consecutive_count = result.consecutive_count,
            alert_sent = result.alert_sent,
            observers,
            "Reading processed"
        );

        result
    }

    async fn persist(&self, result: &EnrichedResult) {
        let Some(store) = &self.store else {
            return;
        };
        let call = store.persist(result);
        if let Err(e) = with_timeout("store", self.persist_timeout, call).await {
            tracing::error!(
                error = %e,
                timestamp = %result.reading.timestamp,
                "Failed to persist reading"
            );
        }
    }
}
