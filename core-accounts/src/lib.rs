//! # Account Management
//!
//! Process-wide account registry for the sync client.
//!
//! ## Overview
//!
//! This crate holds the identities the client is signed in to and resolves
//! them for consumers such as the backup orchestrator:
//! - Stable uuid-based resolution (supported path)
//! - Display-name resolution (deprecated, kept for legacy socket clients)
//!
//! ## Components
//!
//! - **Account Types** (`types`): `AccountId`, `Account`, shared `AccountHandle`
//! - **Account Manager** (`manager`): concurrent registry with add/remove/resolve

pub mod error;
pub mod manager;
pub mod types;

pub use error::{AccountError, Result};
pub use manager::AccountManager;
pub use types::{Account, AccountHandle, AccountId};
