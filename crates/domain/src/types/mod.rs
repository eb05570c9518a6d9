//! Domain types shared by the client layers

pub mod reply;
pub mod session;

use std::collections::BTreeMap;

pub use reply::{AckStatus, RemoteErrorEntry, Severity};
pub use session::{AppCredential, AuthScheme, Environment};

/// Outbound HTTP header set, keyed by header name
pub type Headers = BTreeMap<String, String>;
