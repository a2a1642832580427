//! Route handlers for the REST API
//!
//! - [`enhance`] - The enhance-and-voice pipeline
//! - [`system`] - Health, index, OpenAPI

mod enhance;
mod system;

pub use enhance::*;
pub use system::*;
