pub mod config;
pub mod content_store;
pub mod database;
pub mod logging;
pub mod security;
