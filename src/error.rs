//! Error handling for XPKF decoding
//!
//! This module re-exports the error type used throughout the crate.
//! It uses thiserror and keeps the three format failure kinds (missing header,
//! missing palette, corrupt stream) distinct from the I/O and export errors.

pub use crate::common::Result;
pub use crate::common::XpkfError;
