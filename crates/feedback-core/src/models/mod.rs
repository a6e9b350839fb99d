//! Data models for feedback intake

mod feedback;

pub use feedback::{
    row_key_for, FeedbackRecord, FeedbackSubmission, ValidFeedback, FEEDBACK_PARTITION,
};
