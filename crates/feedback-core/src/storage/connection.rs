//! Storage account connection strings.

use std::collections::HashMap;
use std::fmt;

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;

use crate::util::non_empty_trimmed;
use crate::{Error, Result};

const DEFAULT_PROTOCOL: &str = "https";
const DEFAULT_ENDPOINT_SUFFIX: &str = "core.windows.net";

const DEV_ACCOUNT_NAME: &str = "devstoreaccount1";
const DEV_ACCOUNT_KEY: &str =
    "Eby8vdM02xNOcqFlqUwJPLlmEtlCDXJ1OUzFT50uSRZ6IFsuFq2UVErCz4I6tq/K1SZFPTOtr/KBHBeksoGMGw==";
const DEV_TABLE_ENDPOINT: &str = "http://127.0.0.1:10002/devstoreaccount1";

/// How requests to the table endpoint are authorized.
#[derive(Clone, PartialEq, Eq)]
pub enum StorageCredential {
    /// Account key used for Shared Key Lite signing
    SharedKey { account_key: Vec<u8> },
    /// Pre-issued shared access signature query string
    Sas { token: String },
}

impl fmt::Debug for StorageCredential {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SharedKey { .. } => formatter
                .debug_struct("SharedKey")
                .field("account_key", &"[REDACTED]")
                .finish(),
            Self::Sas { .. } => formatter
                .debug_struct("Sas")
                .field("token", &"[REDACTED]")
                .finish(),
        }
    }
}

/// Parsed storage connection string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageConnection {
    account_name: Option<String>,
    table_endpoint: String,
    credential: StorageCredential,
}

impl StorageConnection {
    /// Parse a `Key=Value;Key=Value` connection string.
    ///
    /// Recognizes account-key strings, `TableEndpoint` overrides, SAS strings
    /// and `UseDevelopmentStorage=true`.
    pub fn parse(connection_string: &str) -> Result<Self> {
        let settings = parse_settings(connection_string)?;
        let setting = |name: &str| settings.get(name).map(String::as_str);

        if setting("usedevelopmentstorage").is_some_and(|value| value.eq_ignore_ascii_case("true"))
        {
            return Self::development();
        }

        let account_name = setting("accountname").map(ToOwned::to_owned);
        let explicit_endpoint = setting("tableendpoint").map(|value| value.trim_end_matches('/'));

        let table_endpoint = match (explicit_endpoint, account_name.as_deref()) {
            (Some(endpoint), _) => endpoint.to_string(),
            (None, Some(account)) => format!(
                "{}://{account}.table.{}",
                setting("defaultendpointsprotocol").unwrap_or(DEFAULT_PROTOCOL),
                setting("endpointsuffix").unwrap_or(DEFAULT_ENDPOINT_SUFFIX),
            ),
            (None, None) => {
                return Err(Error::ConnectionString(
                    "AccountName or TableEndpoint is required".to_string(),
                ))
            }
        };
        if !is_http_url(&table_endpoint) {
            return Err(Error::ConnectionString(
                "table endpoint must start with http:// or https://".to_string(),
            ));
        }

        let credential = if let Some(token) = setting("sharedaccesssignature") {
            StorageCredential::Sas {
                token: token.trim_start_matches('?').to_string(),
            }
        } else {
            if account_name.is_none() {
                return Err(Error::ConnectionString(
                    "AccountName is required for account key authentication".to_string(),
                ));
            }
            let encoded = setting("accountkey").ok_or_else(|| {
                Error::ConnectionString(
                    "AccountKey or SharedAccessSignature is required".to_string(),
                )
            })?;
            let account_key = STANDARD.decode(encoded).map_err(|_| {
                Error::ConnectionString("AccountKey must be valid base64".to_string())
            })?;
            StorageCredential::SharedKey { account_key }
        };

        Ok(Self {
            account_name,
            table_endpoint,
            credential,
        })
    }

    /// Connection to the local storage emulator.
    pub fn development() -> Result<Self> {
        let account_key = STANDARD.decode(DEV_ACCOUNT_KEY).map_err(|_| {
            Error::ConnectionString("emulator account key is not valid base64".to_string())
        })?;
        Ok(Self {
            account_name: Some(DEV_ACCOUNT_NAME.to_string()),
            table_endpoint: DEV_TABLE_ENDPOINT.to_string(),
            credential: StorageCredential::SharedKey { account_key },
        })
    }

    pub fn account_name(&self) -> Option<&str> {
        self.account_name.as_deref()
    }

    /// Table service base URL without a trailing slash
    pub fn table_endpoint(&self) -> &str {
        &self.table_endpoint
    }

    pub const fn credential(&self) -> &StorageCredential {
        &self.credential
    }
}

fn parse_settings(connection_string: &str) -> Result<HashMap<String, String>> {
    let mut settings = HashMap::new();
    for segment in connection_string.split(';') {
        let Some(segment) = non_empty_trimmed(segment) else {
            continue;
        };
        let (key, value) = segment.split_once('=').ok_or_else(|| {
            Error::ConnectionString(format!("segment without '=': {}", redacted_key(segment)))
        })?;
        if let Some(value) = non_empty_trimmed(value) {
            settings.insert(key.trim().to_ascii_lowercase(), value.to_string());
        }
    }
    Ok(settings)
}

// Segments may carry secrets; only the leading characters are echoed back.
fn redacted_key(segment: &str) -> String {
    let prefix: String = segment.chars().take(12).collect();
    if prefix.len() < segment.len() {
        format!("{prefix}...")
    } else {
        prefix
    }
}

fn is_http_url(value: &str) -> bool {
    value.starts_with("http://") || value.starts_with("https://")
}
