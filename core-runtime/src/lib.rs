//! # Core Runtime Module
//!
//! Provides foundational runtime infrastructure for the sync client core:
//! - Logging and tracing infrastructure
//! - Client configuration management
//! - Progress dispatcher (broadcast event bus)
//!
//! ## Overview
//!
//! This crate contains the runtime utilities the other core crates depend
//! on. It establishes the logging conventions and the progress-broadcast
//! mechanism used throughout the client.

pub mod config;
pub mod error;
pub mod events;
pub mod logging;

pub use error::{Error, Result};
