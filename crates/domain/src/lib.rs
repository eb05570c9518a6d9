//! # TradeLink Domain
//!
//! Domain types shared by every TradeLink crate.
//!
//! This crate contains:
//! - The `ApiError` type, its kinds and the `Result` alias
//! - Session value types (environment, auth scheme, app credential)
//! - Reply value types (ack status, remote error entries)
//! - Client configuration structures
//! - Wire-level constants
//!
//! ## Architecture
//! - No dependencies on other TradeLink crates
//! - No I/O

pub mod config;
pub mod constants;
pub mod errors;
pub mod macros;
pub mod types;

// Re-export commonly used items
pub use config::*;
pub use errors::*;
pub use types::*;
