//! Azure Table service REST client.

use std::time::Duration;

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use chrono::Utc;
use hmac::{Hmac, Mac};
use reqwest::header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE};
use reqwest::{StatusCode, Url};
use serde::Deserialize;
use sha2::Sha256;

use super::{EntityStore, StorageConnection, StorageCredential, TableEntity};
use crate::util::{compact_text, sanitize};
use crate::{Error, Result};

const API_VERSION: &str = "2019-02-02";
const DATA_SERVICE_VERSION: &str = "3.0;NetFx";
const ACCEPT_NO_METADATA: &str = "application/json;odata=nometadata";
const ENTITY_EXISTS_CODE: &str = "EntityAlreadyExists";

type HmacSha256 = Hmac<Sha256>;

/// Client for the table service, built once and shared across requests.
#[derive(Debug, Clone)]
pub struct TableServiceClient {
    client: reqwest::Client,
    connection: StorageConnection,
}

impl TableServiceClient {
    pub fn new(connection: StorageConnection, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|error| {
                Error::Storage(format!("Failed to build HTTP client: {}", sanitize(&error)))
            })?;
        Ok(Self { client, connection })
    }

    pub fn from_connection_string(connection_string: &str, timeout: Duration) -> Result<Self> {
        Self::new(StorageConnection::parse(connection_string)?, timeout)
    }

    pub const fn connection(&self) -> &StorageConnection {
        &self.connection
    }

    fn table_url(&self, table: &str) -> Result<Url> {
        let mut url = Url::parse(&format!("{}/{table}", self.connection.table_endpoint()))
            .map_err(|error| {
                Error::ConnectionString(format!("invalid table endpoint: {error}"))
            })?;
        if let StorageCredential::Sas { token } = self.connection.credential() {
            url.set_query(Some(token));
        }
        Ok(url)
    }

    fn authorization(&self, url: &Url, date: &str) -> Result<Option<String>> {
        match self.connection.credential() {
            StorageCredential::SharedKey { account_key } => {
                let account = self.connection.account_name().ok_or_else(|| {
                    Error::ConnectionString(
                        "AccountName is required for account key authentication".to_string(),
                    )
                })?;
                let payload = string_to_sign(date, account, url.path());
                let signature = shared_key_lite_signature(account_key, &payload)?;
                Ok(Some(format!("SharedKeyLite {account}:{signature}")))
            }
            StorageCredential::Sas { .. } => Ok(None),
        }
    }
}

impl EntityStore for TableServiceClient {
    async fn create_entity(&self, table: &str, entity: &TableEntity) -> Result<()> {
        let url = self.table_url(table)?;
        let date = Utc::now().format("%a, %d %b %Y %H:%M:%S GMT").to_string();
        let body = serde_json::to_vec(&entity.to_wire_json())?;

        let mut request = self
            .client
            .post(url.clone())
            .header("x-ms-date", &date)
            .header("x-ms-version", API_VERSION)
            .header(ACCEPT, ACCEPT_NO_METADATA)
            .header(CONTENT_TYPE, "application/json")
            .header("Prefer", "return-no-content")
            .header("DataServiceVersion", DATA_SERVICE_VERSION)
            .header("MaxDataServiceVersion", DATA_SERVICE_VERSION)
            .body(body);
        if let Some(authorization) = self.authorization(&url, &date)? {
            request = request.header(AUTHORIZATION, authorization);
        }

        let response = request.send().await.map_err(|error| {
            Error::Storage(format!("Table insert request failed: {}", sanitize(&error)))
        })?;

        let status = response.status();
        if status.is_success() {
            tracing::debug!(
                table,
                partition_key = entity.partition_key(),
                row_key = entity.row_key(),
                "Inserted table entity"
            );
            return Ok(());
        }

        let body = response.text().await.unwrap_or_default();
        let service_error = ServiceError::from_body(&body);
        if status == StatusCode::CONFLICT
            && service_error
                .as_ref()
                .is_none_or(|error| error.code == ENTITY_EXISTS_CODE)
        {
            return Err(Error::EntityExists {
                partition_key: entity.partition_key().to_string(),
                row_key: entity.row_key().to_string(),
            });
        }

        Err(Error::Storage(describe_failure(
            status,
            service_error.as_ref(),
            &body,
        )))
    }
}

fn string_to_sign(date: &str, account: &str, path: &str) -> String {
    format!("{date}\n/{account}{path}")
}

fn shared_key_lite_signature(account_key: &[u8], payload: &str) -> Result<String> {
    let mut mac = HmacSha256::new_from_slice(account_key)
        .map_err(|_| Error::ConnectionString("AccountKey cannot be used for signing".to_string()))?;
    mac.update(payload.as_bytes());
    Ok(STANDARD.encode(mac.finalize().into_bytes()))
}

fn describe_failure(
    status: StatusCode,
    service_error: Option<&ServiceError>,
    body: &str,
) -> String {
    match service_error {
        Some(error) => format!(
            "Table storage request failed with HTTP {} ({}): {}",
            status.as_u16(),
            error.code,
            error.message
        ),
        None if body.trim().is_empty() => {
            format!("Table storage request failed with HTTP {}", status.as_u16())
        }
        None => format!(
            "Table storage request failed with HTTP {}: {}",
            status.as_u16(),
            compact_text(body)
        ),
    }
}

#[derive(Debug, PartialEq, Eq)]
struct ServiceError {
    code: String,
    message: String,
}

impl ServiceError {
    fn from_body(body: &str) -> Option<Self> {
        let envelope: ODataErrorEnvelope = serde_json::from_str(body).ok()?;
        let message = match envelope.error.message {
            Some(ODataMessage::Localized { value } | ODataMessage::Text(value)) => value,
            None => String::new(),
        };
        Some(Self {
            code: envelope.error.code,
            // The service appends RequestId/Time lines after the first line.
            message: message.lines().next().unwrap_or_default().trim().to_string(),
        })
    }
}

#[derive(Debug, Deserialize)]
struct ODataErrorEnvelope {
    #[serde(rename = "odata.error")]
    error: ODataError,
}

#[derive(Debug, Deserialize)]
struct ODataError {
    code: String,
    message: Option<ODataMessage>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ODataMessage {
    Localized { value: String },
    Text(String),
}
