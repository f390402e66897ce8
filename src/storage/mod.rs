//! SQLite storage module for F1 data
//!
//! Provides the schema, row types and the repository used by the API
//! handlers and the seeding command.

pub mod models;
pub mod repository;
pub mod schema;

pub use repository::F1Repository;
