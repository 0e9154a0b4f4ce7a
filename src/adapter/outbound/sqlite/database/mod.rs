//! SQLite connection setup, schema, and row models.

pub mod connection;
pub mod model;
pub mod schema;
