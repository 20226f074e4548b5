//! Repository implementations for database access

pub mod news;

pub use news::PgNewsStore;
