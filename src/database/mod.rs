/// SQLite pool setup and migrations
pub mod connection;
/// In-memory repository for tests and fault injection
pub mod memory;
/// Row types and SQL for each table
pub mod models;
/// SQLite implementation of the domain repository traits
pub mod repository;
