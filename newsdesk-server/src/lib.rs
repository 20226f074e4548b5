//! newsdesk-server: HTTP API for news articles
//!
//! CRUD over news articles, one rating per user per article, and
//! user-based collaborative filtering recommendations. Storage sits
//! behind [`db::NewsStore`] with Postgres and in-memory implementations.

pub mod db;
pub mod http;
pub mod models;
pub mod recommend;

pub use db::{DbError, MemoryNewsStore, NewsStore, PgNewsStore};
pub use http::{build_router, run_server, ApiError, AppState, ServerConfig, ServerError};
