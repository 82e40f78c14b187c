pub mod admin;
pub mod auth;
pub mod comment;
pub mod follow;
pub mod media;
pub mod post;
pub mod profile;
pub mod search;
pub mod vote;

use actix_web::web;

/// Every route under `/api` except auth and health.
pub fn routes(cfg: &mut web::ServiceConfig) {
    cfg.configure(post::routes)
        .configure(vote::routes)
        .configure(comment::routes)
        .configure(profile::routes)
        .configure(follow::routes)
        .configure(search::routes)
        .configure(admin::routes);
}
