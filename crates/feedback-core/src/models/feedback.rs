//! Feedback submission and record models

use std::num::FpCategory;

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Number, Value};

use crate::error::{Error, Result};
use crate::storage::TableEntity;

/// Partition shared by every feedback record
pub const FEEDBACK_PARTITION: &str = "Feedback";

const ROW_KEY_FORMAT: &str = "%Y%m%d%H%M%S%6f";

/// Feedback as submitted by a client, before validation.
///
/// Fields hold whatever JSON value the client sent so that absent keys,
/// `null`s and other falsy values all reach [`FeedbackSubmission::validate`].
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct FeedbackSubmission {
    #[serde(default)]
    pub name: Option<Value>,
    #[serde(default)]
    pub email: Option<Value>,
    #[serde(default)]
    pub message: Option<Value>,
}

impl FeedbackSubmission {
    /// Decode a request body.
    ///
    /// The body must be a JSON object. Unknown keys are ignored.
    pub fn from_json(body: &[u8]) -> Result<Self> {
        let object: Map<String, Value> = serde_json::from_slice(body).map_err(Error::InvalidJson)?;
        serde_json::from_value(Value::Object(object)).map_err(Error::InvalidJson)
    }

    /// Check that name, email and message are all present and truthy.
    pub fn validate(self) -> Result<ValidFeedback> {
        match (present(self.name), present(self.email), present(self.message)) {
            (Some(name), Some(email), Some(message)) => Ok(ValidFeedback {
                name,
                email,
                message,
            }),
            _ => Err(Error::MissingFields),
        }
    }
}

/// Text of a truthy value; `None` for absent, `null`, `false`, zero and empty values.
///
/// Non-string values are kept as their JSON text.
fn present(value: Option<Value>) -> Option<String> {
    match value? {
        Value::Null | Value::Bool(false) => None,
        Value::Number(number) if is_zero(&number) => None,
        Value::String(text) if text.is_empty() => None,
        Value::Array(items) if items.is_empty() => None,
        Value::Object(fields) if fields.is_empty() => None,
        Value::String(text) => Some(text),
        other => Some(other.to_string()),
    }
}

fn is_zero(number: &Number) -> bool {
    number
        .as_f64()
        .is_some_and(|value| value.classify() == FpCategory::Zero)
}

/// A submission that passed the presence checks
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidFeedback {
    name: String,
    email: String,
    message: String,
}

/// A persisted feedback record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeedbackRecord {
    /// Always [`FEEDBACK_PARTITION`]
    pub partition_key: String,
    /// Submission time at microsecond resolution, `YYYYMMDDhhmmssffffff`
    pub row_key: String,
    pub name: String,
    pub email: String,
    pub message: String,
    /// Submission time as RFC 3339 UTC
    pub timestamp: String,
}

impl FeedbackRecord {
    /// Build a record stamped with `now`.
    ///
    /// Row key and timestamp are both derived from the same instant.
    #[must_use]
    pub fn new(feedback: ValidFeedback, now: DateTime<Utc>) -> Self {
        Self {
            partition_key: FEEDBACK_PARTITION.to_string(),
            row_key: row_key_for(now),
            name: feedback.name,
            email: feedback.email,
            message: feedback.message,
            timestamp: now.to_rfc3339_opts(SecondsFormat::Micros, true),
        }
    }

    /// Store-level view of this record
    #[must_use]
    pub fn to_entity(&self) -> TableEntity {
        TableEntity::new(&self.partition_key, &self.row_key)
            .with_attribute("name", &self.name)
            .with_attribute("email", &self.email)
            .with_attribute("message", &self.message)
            .with_attribute("timestamp", &self.timestamp)
    }
}

/// Row key for a submission received at `now`
#[must_use]
pub fn row_key_for(now: DateTime<Utc>) -> String {
    now.format(ROW_KEY_FORMAT).to_string()
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, TimeZone};
    use pretty_assertions::assert_eq;
    use serde_json::json;

    use super::*;

    fn instant() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 9, 14, 5, 7).unwrap() + Duration::microseconds(42)
    }

    fn valid() -> ValidFeedback {
        FeedbackSubmission::from_json(
            br#"{"name":"Ana","email":"ana@x.com","message":"Great service"}"#,
        )
        .unwrap()
        .validate()
        .unwrap()
    }

    #[test]
    fn from_json_reads_known_fields_and_ignores_extras() {
        let submission = FeedbackSubmission::from_json(
            br#"{"name":"Ana","email":"ana@x.com","message":"hi","rating":5}"#,
        )
        .unwrap();
        assert_eq!(submission.name, Some(json!("Ana")));
        assert_eq!(submission.email, Some(json!("ana@x.com")));
        assert_eq!(submission.message, Some(json!("hi")));
    }

    #[test]
    fn from_json_rejects_malformed_and_non_object_bodies() {
        let bodies: [&[u8]; 5] = [
            b"{not json",
            b"",
            br#"["Ana","a@b.com","hi"]"#,
            br#""text""#,
            b"42",
        ];
        for body in bodies {
            let err = FeedbackSubmission::from_json(body).unwrap_err();
            assert!(matches!(err, Error::InvalidJson(_)), "body {body:?}");
        }
    }

    #[test]
    fn validate_rejects_absent_and_falsy_fields() {
        let bodies: [&[u8]; 11] = [
            br#"{"email":"a@b.com","message":"hi"}"#,
            br#"{"name":null,"email":"a@b.com","message":"hi"}"#,
            br#"{"name":"","email":"a@b.com","message":"hi"}"#,
            br#"{"name":false,"email":"a@b.com","message":"hi"}"#,
            br#"{"name":0,"email":"a@b.com","message":"hi"}"#,
            br#"{"name":0.0,"email":"a@b.com","message":"hi"}"#,
            br#"{"name":[],"email":"a@b.com","message":"hi"}"#,
            br#"{"name":{},"email":"a@b.com","message":"hi"}"#,
            br#"{"name":"Ana","email":"a@b.com","message":-0.0}"#,
            br#"{"name":5}"#,
            br"{}",
        ];
        for body in bodies {
            let submission = FeedbackSubmission::from_json(body).unwrap();
            assert!(
                matches!(submission.validate(), Err(Error::MissingFields)),
                "body {}",
                String::from_utf8_lossy(body)
            );
        }
    }

    #[test]
    fn truthy_non_string_fields_keep_their_json_text() {
        let record = FeedbackRecord::new(
            FeedbackSubmission::from_json(
                br#"{"name":5,"email":true,"message":["hi",0.5]}"#,
            )
            .unwrap()
            .validate()
            .unwrap(),
            instant(),
        );
        assert_eq!(record.name, "5");
        assert_eq!(record.email, "true");
        assert_eq!(record.message, r#"["hi",0.5]"#);
    }

    #[test]
    fn validate_does_not_check_email_format_or_trim() {
        let feedback = FeedbackSubmission {
            name: Some(json!(" ")),
            email: Some(json!("not-an-email")),
            message: Some(json!("hi")),
        }
        .validate()
        .unwrap();
        let record = FeedbackRecord::new(feedback, instant());
        assert_eq!(record.name, " ");
        assert_eq!(record.email, "not-an-email");
    }

    #[test]
    fn record_derives_keys_from_one_instant() {
        let record = FeedbackRecord::new(valid(), instant());
        assert_eq!(
            record,
            FeedbackRecord {
                partition_key: "Feedback".to_string(),
                row_key: "20240309140507000042".to_string(),
                name: "Ana".to_string(),
                email: "ana@x.com".to_string(),
                message: "Great service".to_string(),
                timestamp: "2024-03-09T14:05:07.000042Z".to_string(),
            }
        );
        assert!(DateTime::parse_from_rfc3339(&record.timestamp).is_ok());
    }

    #[test]
    fn row_keys_differ_one_microsecond_apart() {
        let first = row_key_for(instant());
        let second = row_key_for(instant() + Duration::microseconds(1));
        assert_ne!(first, second);
        assert_eq!(first.len(), 20);
        assert!(first.chars().all(|c| c.is_ascii_digit()));
        assert!(first < second);
    }

    #[test]
    fn to_entity_carries_all_attributes() {
        let entity = FeedbackRecord::new(valid(), instant()).to_entity();
        assert_eq!(entity.partition_key(), "Feedback");
        assert_eq!(entity.row_key(), "20240309140507000042");
        assert_eq!(entity.attribute("name"), Some("Ana"));
        assert_eq!(entity.attribute("email"), Some("ana@x.com"));
        assert_eq!(entity.attribute("message"), Some("Great service"));
        assert_eq!(
            entity.attribute("timestamp"),
            Some("2024-03-09T14:05:07.000042Z")
        );
    }

    #[test]
    fn record_serializes_with_snake_case_keys() {
        let json = serde_json::to_value(FeedbackRecord::new(valid(), instant())).unwrap();
        assert_eq!(json["partition_key"], "Feedback");
        assert_eq!(json["row_key"], "20240309140507000042");
        assert_eq!(json["name"], "Ana");
    }
}
