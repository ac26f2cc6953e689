//! Reel Core - Playback session library for the Reel streaming client
//!
//! This crate provides the watch-session pipeline behind the player view:
//! - Playback token acquisition for a (profile, content) pair
//! - Manifest resolution into playable stream variants
//! - Quality catalog and resume position lookups (best effort)
//! - Periodic and completion progress reporting
//! - A coordinator exposing one observable session state
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                           Reel Core                             │
//! ├─────────────────────────────────────────────────────────────────┤
//! │                                                                 │
//! │  ┌──────────────┐  ┌──────────────┐  ┌──────────────┐           │
//! │  │    Token     │─▶│   Manifest   │  │   Quality    │           │
//! │  │   Service    │  │   Resolver   │  │   Catalog    │           │
//! │  └──────┬───────┘  └──────┬───────┘  └──────┬───────┘           │
//! │         │                 │                 │ (best effort)     │
//! │         └─────────────────┼─────────────────┘                   │
//! │                           │                                     │
//! │                    ┌──────┴──────┐         ┌──────────────┐     │
//! │                    │  Playback   │◀────────│    Resume    │     │
//! │                    │ Coordinator │         │   Position   │     │
//! │                    └──────┬──────┘         │    Store     │     │
//! │                           │                └──────▲───────┘     │
//! │                    ┌──────┴──────┐                │             │
//! │                    │  Progress   │────────────────┘             │
//! │                    │  Reporter   │                              │
//! │                    └─────────────┘                              │
//! └─────────────────────────────────────────────────────────────────┘
//! ```

pub mod config;
pub mod coordinator;
pub mod error;
pub mod http;
pub mod progress;
pub mod services;
pub mod state;
pub mod types;

pub use config::{ApiConfig, Config, PlaybackConfig};
pub use coordinator::{InitOutcome, PlaybackCoordinator};
pub use error::{Error, Result};
pub use http::HttpApi;
pub use progress::ProgressReporter;
pub use services::{
    ManifestResolver, PlaybackServices, QualityCatalog, ResumePositionStore, TokenService,
};
pub use state::{SessionPhase, SessionSnapshot};
pub use types::*;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Initialize the library
pub fn init() {
    tracing::info!(version = VERSION, "Reel Core initialized");
}
