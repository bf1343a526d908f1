//! Core library surface for the Digital Library TUI application.
//!
//! `library` holds the domain operations, `db` the SQLite-backed store they
//! run against, and `ui` the terminal front-end driving both.
pub mod config;
pub mod db;
pub mod error;
pub mod library;
pub mod logging;
pub mod models;
pub mod ui;

pub use config::Config;
pub use db::LibraryStore;
pub use error::{LibraryError, LibraryResult};

/// The domain types that other layers manipulate.
pub use models::{Action, Book, Role, Transaction, User};

/// The interactive application entry point and state container.
pub use ui::{run_app, App};
