//! Mapbridge – typed command bridge for script-hosted map engines
//!
//! This crate drives a map engine that lives inside an embedded script host
//! (typically a JavaScript map library in a web view):
//! - Typed commands rendered to script text, with per-command escaping
//! - A serializing bridge that submits scripts to a pluggable executor
//! - Total decoding of dynamically typed results into a closed value type
//! - A stable error taxonomy for host failures
//! - An event pipeline that classifies host notifications and synthesizes
//!   double-taps from touch timing

#![warn(missing_docs)]
#![warn(rust_2018_idioms)]

/// Command bridge, executor seam, and result decoding
pub mod bridge;

/// Typed commands and script rendering
pub mod command;

/// Session configuration
pub mod config;

/// Error taxonomy and construction errors
pub mod error;

/// Host event classification and gesture synthesis
pub mod events;

/// Coordinate types
pub mod types;

// Re-export key types for convenience
pub use bridge::{Bridge, DecodedValue, Executor, RawResult};
pub use config::BridgeConfig;
pub use error::{BridgeError, BridgeResult};
pub use events::{ClassifiedEvent, EventKind, EventProcessor, RawEvent};

/// Current version of mapbridge
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
