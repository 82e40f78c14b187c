pub mod application;
pub mod data;
pub mod domain;
pub mod infrastructure;
pub mod presentation;
pub mod server;

#[cfg(test)]
pub(crate) mod testing;
