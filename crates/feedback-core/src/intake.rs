//! Feedback intake pipeline: parse, validate, stamp, persist.

use chrono::{DateTime, Utc};

use crate::models::{FeedbackRecord, FeedbackSubmission};
use crate::storage::EntityStore;
use crate::Result;

/// Table that receives feedback records
pub const FEEDBACK_TABLE: &str = "FeedbackTable";

/// Turns request bodies into persisted feedback records.
#[derive(Debug, Clone)]
pub struct FeedbackIntake<S> {
    store: S,
    table: String,
}

impl<S: EntityStore> FeedbackIntake<S> {
    /// Intake writing to [`FEEDBACK_TABLE`]
    pub fn new(store: S) -> Self {
        Self::with_table(store, FEEDBACK_TABLE)
    }

    pub fn with_table(store: S, table: impl Into<String>) -> Self {
        Self {
            store,
            table: table.into(),
        }
    }

    pub fn table(&self) -> &str {
        &self.table
    }

    /// Process one submission received now.
    pub async fn submit(&self, body: &[u8]) -> Result<FeedbackRecord> {
        self.submit_at(body, Utc::now()).await
    }

    /// Process one submission stamped with `now`.
    ///
    /// Nothing is written unless the body decodes and validates. A row key
    /// collision is returned as-is; no new key is generated.
    pub async fn submit_at(&self, body: &[u8], now: DateTime<Utc>) -> Result<FeedbackRecord> {
        let feedback = FeedbackSubmission::from_json(body)?.validate()?;
        let record = FeedbackRecord::new(feedback, now);
        self.store
            .create_entity(&self.table, &record.to_entity())
            .await?;
        Ok(record)
    }
}
