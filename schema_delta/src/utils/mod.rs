//! Utilities for schema_delta
//!
//! This module provides utility functions used across the library.

pub mod logging;
pub mod naming;

// Re-export key utility functions
pub use naming::{format_name, index_name, quote_identifier, unique_index_name};
