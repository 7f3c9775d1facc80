//! # Repository Module
//!
//! Database repository implementations for the RigShare backend.
//!
//! ## Repository Pattern
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Repository Pattern                                   │
//! │                                                                         │
//! │  HTTP handler                                                           │
//! │       │                                                                 │
//! │       │  db.equipment().list()                                          │
//! │       ▼                                                                 │
//! │  EquipmentRepository                                                    │
//! │  ├── list / list_by_owner / get                                         │
//! │  ├── create / update / set_image                                        │
//! │  └── delete                                                             │
//! │       │                                                                 │
//! │       │  SQL (owner name JOINed from users on every read)               │
//! │       ▼                                                                 │
//! │  SQLite Database                                                        │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Available Repositories
//!
//! - [`UserRepository`](user::UserRepository) - Accounts and profiles
//! - [`EquipmentRepository`](equipment::EquipmentRepository) - Listings

pub mod equipment;
pub mod user;
