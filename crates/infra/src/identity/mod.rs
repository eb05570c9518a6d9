//! OAuth token issuance for the bearer scheme

pub mod client;

pub use client::{IdentityClient, IssuedToken};
