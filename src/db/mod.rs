//! Persistence module split across logical submodules.

mod connection;
mod seed;
mod store;

pub use connection::{ensure_schema, open_database};
pub use seed::{default_books, default_users, RESERVED_ADMIN};
pub use store::LibraryStore;
