//! Database module

pub mod operations;
pub mod schema;

pub use operations::DatabaseManager;
pub use schema::initialize_database;
