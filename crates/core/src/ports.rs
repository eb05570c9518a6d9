//! Port interfaces consumed by the client
//!
//! The engine never talks to the network or parses XML itself. Both
//! capabilities are injected per client instance through these traits.

use std::collections::BTreeSet;

use async_trait::async_trait;
use serde_json::{Map, Value};
use tradelink_domain::{Headers, Result};

/// One fully-built outbound request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutboundRequest {
    pub method: String,
    pub url: String,
    pub headers: Headers,
    pub body: String,
}

impl OutboundRequest {
    pub fn post(url: impl Into<String>, headers: Headers, body: impl Into<String>) -> Self {
        Self { method: "POST".to_string(), url: url.into(), headers, body: body.into() }
    }
}

/// Issues a request and returns the raw response body
///
/// Implementations fail with `ApiError::Transport` on network failure or a
/// non-success HTTP status. The engine never retries.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn send(&self, request: OutboundRequest) -> Result<String>;
}

/// Converts between XML text and structured trees
pub trait XmlCodec: Send + Sync {
    /// Parse a document into `{ RootName: content }`.
    ///
    /// Every element whose name is in `force_array` is materialized as a
    /// sequence regardless of how many times it occurs.
    ///
    /// A name from `force_array` that occurs nowhere in the document is
    /// added once, as `[]`, directly under the root content. Callers see
    /// these keys in every reply and in merged results (merging `[]` pages
    /// keeps `[]`). A name that occurs at any depth gets no root entry.
    ///
    /// # Errors
    /// Returns `ApiError::Decode` when the text is not well-formed XML.
    fn to_structured(&self, xml: &str, force_array: &BTreeSet<String>) -> Result<Value>;

    /// Serialize `body` as the children of a root element, preceded by an
    /// XML declaration.
    ///
    /// # Errors
    /// Returns `ApiError::InvalidOptions` when a value has a shape that cannot
    /// be expressed as XML.
    fn to_xml(&self, root: &str, attributes: &[(&str, &str)], body: &Map<String, Value>)
        -> Result<String>;
}
