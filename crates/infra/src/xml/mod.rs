//! XML codec adapter

pub mod codec;

pub use codec::QuickXmlCodec;
