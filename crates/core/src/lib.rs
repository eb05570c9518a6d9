//! # TradeLink Core
//!
//! Request/response normalization and auto-pagination engine - no
//! infrastructure dependencies.
//!
//! This crate contains:
//! - Port interfaces for the transport and the XML codec
//! - Envelope builder and options-tree merge rules
//! - Credential & header manager (`Session`)
//! - Operation catalog, response classifier and pagination engine
//! - `TradingClient`, the generic dispatch over the catalog
//!
//! ## Architecture Principles
//! - Only depends on `tradelink-domain`
//! - No HTTP or XML parsing code
//! - All external capabilities via traits

pub mod catalog;
pub mod classifier;
pub mod client;
pub mod envelope;
pub mod pagination;
pub mod ports;
pub mod session;
pub mod tree;

pub use catalog::{Endpoint, Operation, OperationDescriptor};
pub use classifier::{classify, error_entries};
pub use client::{CallOptions, Exchange, ExchangeObserver, TradingClient};
pub use envelope::build_envelope;
pub use pagination::{PageInfo, PagePlan};
pub use ports::{OutboundRequest, Transport, XmlCodec};
pub use session::Session;
pub use tree::OptionsTree;
