//! Hydrowatch reading pipeline.
//!
//! Every ingestion source hands decoded readings to
//! [`ReadingPipeline::process`], which classifies them, evaluates safe
//! ranges, advances the contamination tracker, dispatches alerts, and fans
//! results out to persistence and the observer hub.
//!
//! External collaborators sit behind the traits in [`capability`]:
//! [`Classifier`], [`Notifier`], and [`ReadingStore`]. Production
//! implementations are [`HttpClassifier`], the SMTP
//! [`EmailDelivery`](hydrowatch_events::EmailDelivery), and
//! [`PgReadingStore`].

pub mod alert;
pub mod capability;
pub mod classifier;
pub mod config;
pub mod engine;
pub mod error;
pub mod http_classifier;
pub mod store;

pub use alert::{AlertDispatcher, AlertMessage};
pub use capability::{Classifier, Notifier, RawPrediction, ReadingStore};
pub use classifier::ClassifierAdapter;
pub use config::PipelineConfig;
pub use engine::{PipelineStatus, ReadingPipeline};
pub use error::CapabilityError;
pub use http_classifier::{ClassifierConfig, HttpClassifier};
pub use store::PgReadingStore;
