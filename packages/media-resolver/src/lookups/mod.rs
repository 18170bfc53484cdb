//! Media lookup implementations.
//!
//! # Available Lookups
//!
//! - `HttpMediaLookup` - JSON endpoint over HTTP
//! - `NoopMediaLookup` - no service configured, always DOM path
//! - `MockMediaLookup` - for testing (in `crate::testing`)

mod http;
mod noop;

pub use http::HttpMediaLookup;
pub use noop::NoopMediaLookup;

// Re-export from traits for convenience
pub use crate::traits::lookup::{ApiMediaRecord, ApiMediaType, MediaLookup};
