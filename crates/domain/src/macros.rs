//! Macro for implementing Display and FromStr for wire-level enums
//!
//! Configuration values such as the environment and auth scheme arrive as
//! free-form strings. This macro gives each enum a canonical spelling for
//! `Display` and a case-insensitive `FromStr` that also accepts aliases.
//!
//! # Example
//!
//! ```rust
//! use tradelink_domain::impl_wire_enum_conversions;
//!
//! #[derive(Debug, Clone, Copy, PartialEq, Eq)]
//! pub enum Region {
//!     Us,
//!     Uk,
//! }
//!
//! impl_wire_enum_conversions!(Region {
//!     Us => "us" | "united-states",
//!     Uk => "uk",
//! });
//!
//! assert_eq!("UNITED-STATES".parse::<Region>(), Ok(Region::Us));
//! assert_eq!(Region::Uk.to_string(), "uk");
//! ```

/// Implements Display and FromStr traits for wire-level enums
///
/// The first string of each variant is its canonical spelling; any further
/// `| "alias"` strings are accepted when parsing. Parsing is
/// case-insensitive and fails with the unrecognized input as the error.
#[macro_export]
macro_rules! impl_wire_enum_conversions {
    ($enum_name:ident { $($variant:ident => $canonical:literal $(| $alias:literal)*),+ $(,)? }) => {
        impl std::fmt::Display for $enum_name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                match self {
                    $(Self::$variant => f.write_str($canonical),)+
                }
            }
        }

        impl std::str::FromStr for $enum_name {
            type Err = String;

            fn from_str(s: &str) -> ::std::result::Result<Self, Self::Err> {
                match s.trim().to_lowercase().as_str() {
                    $($canonical $(| $alias)* => Ok(Self::$variant),)+
                    _ => Err(s.to_string()),
                }
            }
        }
    };
}
