//! # RigShare API
//!
//! JSON REST backend for the web client.
//!
//! ## Architecture
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        RigShare API Server                              │
//! │                                                                         │
//! │  Web client ──► HTTP (3001) ──► Router ──► handlers ──► rigshare-db     │
//! │                                   │                        │            │
//! │                            CorsLayer, TraceLayer        SQLite          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

pub mod config;
pub mod error;
pub mod routes;

pub use config::{ApiConfig, ConfigError};
pub use error::{ApiError, ApiResult};
pub use routes::{build_router, AppState, USER_ID_HEADER};
