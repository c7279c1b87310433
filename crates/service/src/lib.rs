//! Gateway service for capvault.
//!
//! Serves files to authenticated principals by capability token:
//! - Config (TOML, defaults, validation)
//! - State (the request gate plus caller identification settings)
//! - HTTP handlers (download, view listing, health checks)
//! - Process setup (logging, signals, serving)

pub mod config;
pub mod http;
pub mod process;
pub mod state;

// Re-export key types for convenience
pub use config::{Config as ServiceConfig, ConfigError};
pub use state::{State as ServiceState, StateSetupError};
