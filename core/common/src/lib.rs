//! Common utilities and types shared across ChainVault modules.
//!
//! This module provides the error taxonomy and the small value types that
//! every other crate passes around.

pub mod error;
pub mod types;

pub use error::{Error, Result};
pub use types::{SensitiveBytes, SiteAddress, TokenId};
