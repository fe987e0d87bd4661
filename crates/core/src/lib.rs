//! Hydrowatch domain model.
//!
//! Pure types and logic shared by every other crate: readings, safe-range
//! evaluation, classification results, and the contamination state machine.
//! Nothing here performs I/O.

pub mod classification;
pub mod contamination;
pub mod error;
pub mod parameter;
pub mod reading;
pub mod result;
pub mod thresholds;
pub mod types;
