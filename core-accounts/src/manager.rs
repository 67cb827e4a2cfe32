//! # Account Registry
//!
//! Process-wide registry of configured accounts.
//!
//! ## Overview
//!
//! The `AccountManager` owns every account the client is signed in to and
//! hands out shared [`AccountHandle`]s to consumers. Resolution by stable
//! unique id is the supported path; resolution by display name exists for
//! legacy callers and is deprecated, since display names are neither stable
//! nor guaranteed unique.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use core_accounts::{Account, AccountManager};
//! use std::sync::Arc;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let manager = Arc::new(AccountManager::new());
//! let handle = manager
//!     .add_account(Account::new("work", "https://cloud.example.com", "jdoe"))
//!     .await?;
//!
//! let resolved = manager.account_by_id(handle.id.into()).await;
//! assert!(resolved.is_some());
//! # Ok(())
//! # }
//! ```

use crate::types::{Account, AccountHandle, AccountId};
use crate::{AccountError, Result};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{info, warn};
use uuid::Uuid;

/// Process-wide account registry.
#[derive(Debug, Default)]
pub struct AccountManager {
    accounts: RwLock<HashMap<AccountId, AccountHandle>>,
}

impl AccountManager {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self {
            accounts: RwLock::new(HashMap::new()),
        }
    }

    /// Register an account and return its shared handle.
    ///
    /// # Errors
    ///
    /// Returns an error if an account with the same id is already registered.
    pub async fn add_account(&self, account: Account) -> Result<AccountHandle> {
        let mut accounts = self.accounts.write().await;
        if accounts.contains_key(&account.id) {
            return Err(AccountError::AlreadyRegistered(account.id.to_string()));
        }

        info!(
            account_id = %account.id,
            display_name = %account.display_name,
            "Registered account"
        );

        let handle = Arc::new(account);
        accounts.insert(handle.id, Arc::clone(&handle));
        Ok(handle)
    }

    /// Remove an account, returning its handle if it was registered.
    pub async fn remove_account(&self, id: AccountId) -> Option<AccountHandle> {
        let removed = self.accounts.write().await.remove(&id);
        match &removed {
            Some(handle) => info!(account_id = %handle.id, "Removed account"),
            None => warn!(account_id = %id, "Attempted to remove unknown account"),
        }
        removed
    }

    /// Resolve an account by its stable unique id.
    pub async fn account_by_id(&self, id: Uuid) -> Option<AccountHandle> {
        self.accounts.read().await.get(&AccountId::from(id)).cloned()
    }

    /// Resolve an account by display name.
    ///
    /// Deprecated lookup path: display names are mutable and need not be
    /// unique; when several accounts share a name, which one is returned is
    /// unspecified. Callers should resolve by id.
    pub async fn account_by_name(&self, name: &str) -> Option<AccountHandle> {
        self.accounts
            .read()
            .await
            .values()
            .find(|account| account.display_name == name)
            .cloned()
    }

    /// All registered accounts.
    pub async fn accounts(&self) -> Vec<AccountHandle> {
        self.accounts.read().await.values().cloned().collect()
    }
}
