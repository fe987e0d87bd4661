/// Database primary keys are PostgreSQL BIGSERIAL.
pub type DbId = i64;

/// Server-side timestamps are UTC.
pub type Timestamp = chrono::DateTime<chrono::Utc>;
