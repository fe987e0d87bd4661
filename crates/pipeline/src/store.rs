//! Postgres-backed [`ReadingStore`].

use async_trait::async_trait;
use hydrowatch_core::result::EnrichedResult;
use hydrowatch_db::models::reading::CreateReading;
use hydrowatch_db::repositories::ReadingRepo;
use hydrowatch_db::DbPool;

use crate::capability::ReadingStore;
use crate::error::CapabilityError;

/// Writes each processed reading as one row of the `readings` table.
#[derive(Clone)]
pub struct PgReadingStore {
    pool: DbPool,
}

impl PgReadingStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ReadingStore for PgReadingStore {
    async fn persist(&self, result: &EnrichedResult) -> Result<(), CapabilityError> {
        let input = CreateReading::from(result);
        let id = ReadingRepo::insert(&self.pool, &input)
            .await
            .map_err(|e| CapabilityError::failed("store", e))?;
        tracing::debug!(reading_id = id, "Reading persisted");
        Ok(())
    }
}
