//! High-level application primitives.
//!
//! This crate provides the pieces a process embedding the reporter needs before it starts reporting, such as
//! initializing logging.
#![deny(warnings)]
#![deny(missing_docs)]

pub mod logging;

/// Common imports.
pub mod prelude {
    pub use super::logging::{initialize_logging, LoggingConfiguration};
}
