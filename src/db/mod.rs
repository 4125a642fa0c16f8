//! Database layer
//!
//! Storage for users, posts and comments. SQLite is the default backend for
//! single-binary deployment; MySQL is available through configuration.
//!
//! # Usage
//!
//! ```ignore
//! use feder::config::DatabaseConfig;
//! use feder::db::{create_pool, migrations};
//!
//! let pool = create_pool(&DatabaseConfig::default()).await?;
//! migrations::run_migrations(&pool).await?;
//! pool.ping().await?;
//! ```

pub mod migrations;
pub mod pool;
pub mod repositories;

pub use pool::{
    create_pool, create_test_pool, DatabasePool, DynDatabasePool, MysqlDatabase, SqliteDatabase,
};
