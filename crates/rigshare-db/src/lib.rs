//! # rigshare-db: Database Layer for the RigShare backend
//!
//! SQLite storage for the REST backend, via sqlx.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        RigShare Backend Data Flow                       │
//! │                                                                         │
//! │  HTTP handler (GET /equipment)                                          │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐    │
//! │  │                   rigshare-db (THIS CRATE)                      │    │
//! │  │                                                                 │    │
//! │  │   ┌───────────────┐    ┌────────────────┐   ┌──────────────┐    │    │
//! │  │   │   Database    │    │  Repositories  │   │  Migrations  │    │    │
//! │  │   │   (pool.rs)   │    │                │   │  (embedded)  │    │    │
//! │  │   │               │    │ UserRepo       │   │              │    │    │
//! │  │   │ SqlitePool    │◄───│ EquipmentRepo  │   │ 001_init.sql │    │    │
//! │  │   └───────────────┘    └────────────────┘   └──────────────┘    │    │
//! │  │                                                                 │    │
//! │  └─────────────────────────────────────────────────────────────────┘    │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  SQLite file (rigshare.db)                                              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`pool`] - Connection pool creation and configuration
//! - [`migrations`] - Embedded database migrations
//! - [`error`] - Database error types
//! - [`repository`] - User and equipment repositories
//!
//! ## Usage
//!
//! ```rust,ignore
//! use rigshare_db::{Database, DbConfig};
//!
//! let db = Database::new(DbConfig::new("rigshare.db")).await?;
//! let catalog = db.equipment().list().await?;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod migrations;
pub mod pool;
pub mod repository;

// =============================================================================
// Re-exports
// =============================================================================

pub use error::{DbError, DbResult};
pub use pool::{Database, DbConfig};

pub use repository::equipment::EquipmentRepository;
pub use repository::user::{hash_password, UserRepository};
