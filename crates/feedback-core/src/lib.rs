//! feedback-core - Core library for feedback intake
//!
//! This crate contains the feedback models, the intake pipeline, and the
//! partitioned table storage backends used by the HTTP service.

pub mod error;
pub mod intake;
pub mod models;
pub mod storage;
mod util;

pub use error::{Error, Result};
pub use intake::{FeedbackIntake, FEEDBACK_TABLE};
pub use models::{FeedbackRecord, FeedbackSubmission, ValidFeedback, FEEDBACK_PARTITION};
pub use storage::{EntityStore, MemoryStore, StorageConnection, TableEntity, TableServiceClient};
