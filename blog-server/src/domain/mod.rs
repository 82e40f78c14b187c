pub mod error;
pub mod follow;
pub mod media;
pub mod page;
pub mod post;
pub mod profile;
pub mod stats;
pub mod user;
pub mod vote;
