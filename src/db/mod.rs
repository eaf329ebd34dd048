//! Database layer (SQLite).

pub mod sqlite;

pub use sqlite::Db;

/// Table names as constants.
pub mod tables {
    pub const USERS: &str = "users";
    pub const GOOGLE_ADS_ACCOUNTS: &str = "google_ads_accounts";
}
