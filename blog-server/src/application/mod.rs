pub mod admin_service;
pub mod auth_service;
pub mod comment_service;
pub mod follow_service;
pub mod media_service;
pub mod post_service;
pub mod profile_service;
pub mod vote_ledger;
