//! # Backup Request Parsing
//!
//! Extracts a [`BackupRequest`] from the untyped key-value payload a socket
//! client submits.
//!
//! Parsing never fails: malformed or missing fields surface as empty
//! defaults, and validation (absolute local path, resolvable account) happens
//! downstream in the coordinator. The one normalization applied here is
//! rooting the remote path with a leading separator.

use serde_json::Value;
use uuid::Uuid;

/// Identity of the account a request targets.
///
/// The stable uuid is the supported selector; the display name is a
/// deprecated fallback. The raw payload is retained so resolution failures
/// can echo back exactly what the client submitted.
#[derive(Debug, Clone, PartialEq)]
pub struct AccountSelector {
    /// Display name, possibly empty.
    pub name: String,
    /// Stable unique id, `None` when absent or unparseable.
    pub uuid: Option<Uuid>,
    raw: Value,
}

impl AccountSelector {
    /// The submitted account payload as JSON text, for diagnostics.
    pub fn raw_json(&self) -> String {
        self.raw.to_string()
    }
}

/// One parsed "back up this local folder to this remote path" request.
#[derive(Debug, Clone, PartialEq)]
pub struct BackupRequest {
    /// Local folder to back up. Not validated here.
    pub local_path: String,
    /// Remote destination folder. Always begins with `/`.
    pub remote_path: String,
    /// File-name filter pattern, possibly empty.
    pub file_pattern: String,
    /// Manual exclusion list, in submission order.
    pub exclude_patterns: Vec<String>,
    /// Target account identity.
    pub account: AccountSelector,
}

impl BackupRequest {
    /// Parse a request from an untyped payload.
    ///
    /// Expected shape:
    ///
    /// ```json
    /// { "localPath": "...", "remotePath": "...", "pattern": "...",
    ///   "excludes": ["..."],
    ///   "account": { "name": "...", "uuid": "..." } }
    /// ```
    ///
    /// Never fails; anything missing or of the wrong type becomes an empty
    /// default. Non-string exclude entries are skipped.
    pub fn from_payload(payload: &Value) -> Self {
        let string_field = |key: &str| {
            payload
                .get(key)
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string()
        };

        let mut remote_path = string_field("remotePath");
        if !remote_path.starts_with('/') {
            remote_path.insert(0, '/');
        }

        let exclude_patterns = payload
            .get("excludes")
            .and_then(Value::as_array)
            .map(|entries| {
                entries
                    .iter()
                    .filter_map(Value::as_str)
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default();

        let raw_account = payload.get("account").cloned().unwrap_or(Value::Null);
        let name = raw_account
            .get("name")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();
        let uuid = raw_account
            .get("uuid")
            .and_then(Value::as_str)
            .and_then(|text| Uuid::parse_str(text).ok());

        Self {
            local_path: string_field("localPath"),
            remote_path,
            file_pattern: string_field("pattern"),
            exclude_patterns,
            account: AccountSelector {
                name,
                uuid,
                raw: raw_account,
            },
        }
    }
}
