//! SQLite-backed store implementations
//!
//! All TaxPilot services share one database file: the agent writes sessions
//! and review items, the reviewer service reads and resolves review items.

mod init;
mod reviews;
mod sessions;

pub use init::init_database;
pub use reviews::SqliteReviewStore;
pub use sessions::SqliteSessionStore;
