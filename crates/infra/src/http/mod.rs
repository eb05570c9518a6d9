//! HTTP transport

pub mod client;

pub use client::{header_map, HttpClient, HttpClientBuilder, HttpTransport, DEFAULT_USER_AGENT};
