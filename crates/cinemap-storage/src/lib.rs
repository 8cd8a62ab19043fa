//! Cinemap Storage crate - SQLite persistence for the movie catalog.
//!
//! Provides a WAL-mode SQLite database with migrations and a repository
//! that hands catalog rows (metadata plus raw embedding bytes) to the
//! vector layer.

pub mod db;
pub mod migrations;
pub mod repository;

pub use db::Database;
pub use repository::{MovieFilter, MovieRepository};
