//! Account identity types.

use crate::{AccountError, Result};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

/// Unique identifier for a configured account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AccountId(Uuid);

impl AccountId {
    /// Create a new random account ID
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Parse an account ID from a string
    ///
    /// # Errors
    ///
    /// Returns an error if the string is not a valid UUID
    pub fn from_string(s: &str) -> Result<Self> {
        Ok(Self(
            Uuid::parse_str(s).map_err(|e| AccountError::InvalidId(e.to_string()))?,
        ))
    }
}

impl Default for AccountId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for AccountId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<Uuid> for AccountId {
    fn from(uuid: Uuid) -> Self {
        Self(uuid)
    }
}

impl From<AccountId> for Uuid {
    fn from(id: AccountId) -> Self {
        id.0
    }
}

/// One configured server account.
///
/// Accounts are owned by the process-wide [`AccountManager`](crate::AccountManager);
/// consumers hold [`AccountHandle`]s for the duration of an operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Account {
    /// Stable unique identifier.
    pub id: AccountId,
    /// User-visible name shown in the client. Not stable; name-based lookup
    /// is deprecated.
    pub display_name: String,
    /// Base URL of the account's server.
    pub server_url: String,
    /// Login the account authenticates as.
    pub login: String,
}

impl Account {
    pub fn new(
        display_name: impl Into<String>,
        server_url: impl Into<String>,
        login: impl Into<String>,
    ) -> Self {
        Self {
            id: AccountId::new(),
            display_name: display_name.into(),
            server_url: server_url.into(),
            login: login.into(),
        }
    }
}

/// Shared reference to a resolved account.
pub type AccountHandle = Arc<Account>;
