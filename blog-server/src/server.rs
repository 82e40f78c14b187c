use std::sync::Arc;

use crate::application::admin_service::AdminService;
use crate::application::auth_service::AuthService;
use crate::application::comment_service::CommentService;
use crate::application::follow_service::FollowService;
use crate::application::media_service::MediaService;
use crate::application::post_service::PostService;
use crate::application::profile_service::ProfileService;
use crate::application::vote_ledger::VoteLedger;
use crate::data::comment_repository::PostgresCommentRepository;
use crate::data::follow_repository::PostgresFollowRepository;
use crate::data::media_repository::PostgresMediaRepository;
use crate::data::post_repository::PostgresPostRepository;
use crate::data::profile_repository::PostgresProfileRepository;
use crate::data::stats_repository::PostgresStatsRepository;
use crate::data::user_repository::PostgresUserRepository;
use crate::data::vote_repository::PostgresVoteRepository;
use crate::domain::error::DomainError;
use crate::infrastructure::config::AppConfig;
use crate::infrastructure::content_store::LocalContentStore;
use crate::infrastructure::security::JwtKeys;
use crate::presentation::handlers;
use crate::presentation::middleware::{JwtAuthMiddleware, RequestIdMiddleware, TimingMiddleware};
use actix_cors::Cors;
use actix_web::middleware::{DefaultHeaders, Logger};
use actix_web::{App, HttpResponse, HttpServer, Responder, web};
use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::PgPool;
use tracing::info;

const JSON_LIMIT_BYTES: usize = 256 * 1024;

pub async fn start_rest_server(config: AppConfig, pool: PgPool) -> anyhow::Result<()> {
    let users = Arc::new(PostgresUserRepository::new(pool.clone()));
    let profiles = Arc::new(PostgresProfileRepository::new(pool.clone()));
    let posts = Arc::new(PostgresPostRepository::new(pool.clone()));
    let follows = Arc::new(PostgresFollowRepository::new(pool.clone()));

    let store = LocalContentStore::new(&config.media_root, &config.media_url);
    store.ensure_root().await?;

    let auth_service = web::Data::new(AuthService::new(
        Arc::clone(&users),
        Arc::clone(&profiles),
        JwtKeys::new(config.jwt_secret.clone(), config.token_ttl_seconds),
    ));
    let post_service = web::Data::new(PostService::new(Arc::clone(&posts)));
    let comment_service = web::Data::new(CommentService::new(
        Arc::new(PostgresCommentRepository::new(pool.clone())),
        Arc::clone(&posts),
    ));
    let vote_ledger = web::Data::new(VoteLedger::new(Arc::new(PostgresVoteRepository::new(
        pool.clone(),
    ))));
    let media_service = web::Data::new(MediaService::new(
        Arc::new(PostgresMediaRepository::new(pool.clone())),
        Arc::new(store),
    ));
    media_service.install_placeholders().await?;
    let profile_service = ProfileService::new(
        Arc::clone(&users),
        Arc::clone(&profiles),
        Arc::clone(&follows),
    );
    let follow_service = web::Data::new(FollowService::new(
        profile_service.clone(),
        Arc::clone(&follows),
    ));
    let profile_service = web::Data::new(profile_service);
    let admin_service = web::Data::new(AdminService::new(Arc::new(
        PostgresStatsRepository::new(pool.clone()),
    )));

    let bind_address = (config.host.clone(), config.port);
    info!(host = %bind_address.0, port = bind_address.1, "HTTP server starting");

    HttpServer::new(move || {
        let cors = build_cors(&config);

        App::new()
            .wrap(Logger::default())
            .wrap(TimingMiddleware)
            .wrap(RequestIdMiddleware)
            .wrap(
                DefaultHeaders::new()
                    .add(("X-Content-Type-Options", "nosniff"))
                    .add(("Referrer-Policy", "no-referrer"))
                    .add(("Permissions-Policy", "geolocation=()"))
                    .add(("Cross-Origin-Opener-Policy", "same-origin")),
            )
            .wrap(cors)
            .app_data(json_config())
            .app_data(query_config())
            .app_data(auth_service.clone())
            .app_data(post_service.clone())
            .app_data(comment_service.clone())
            .app_data(vote_ledger.clone())
            .app_data(media_service.clone())
            .app_data(profile_service.clone())
            .app_data(follow_service.clone())
            .app_data(admin_service.clone())
            .service(
                web::scope("/api")
                    .wrap(JwtAuthMiddleware::<
                        PostgresUserRepository,
                        PostgresProfileRepository,
                    >::new())
                    .route("/health", web::get().to(health))
                    .service(handlers::auth::scope())
                    .configure(handlers::routes),
            )
            .service(handlers::media::serve_media)
    })
    .bind(bind_address)?
    .run()
    .await
    .map_err(anyhow::Error::new)?;

    Ok(())
}

fn json_config() -> web::JsonConfig {
    web::JsonConfig::default()
        .limit(JSON_LIMIT_BYTES)
        .error_handler(|err, _| DomainError::Validation(err.to_string()).into())
}

fn query_config() -> web::QueryConfig {
    web::QueryConfig::default()
        .error_handler(|err, _| DomainError::Validation(err.to_string()).into())
}

fn build_cors(config: &AppConfig) -> Cors {
    let mut cors = Cors::default()
        .allowed_methods(vec!["GET", "POST", "PUT", "DELETE"])
        .allowed_headers(vec![
            actix_web::http::header::CONTENT_TYPE,
            actix_web::http::header::AUTHORIZATION,
        ])
        .expose_headers(vec!["x-request-id", "server-timing"])
        .supports_credentials()
        .max_age(3600);

    for origin in &config.cors_origins {
        cors = if origin == "*" {
            cors.allow_any_origin()
        } else {
            cors.allowed_origin(origin)
        };
    }

    cors
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub timestamp: DateTime<Utc>,
}

async fn health() -> impl Responder {
    HttpResponse::Ok().json(HealthResponse {
        status: "ok",
        timestamp: Utc::now(),
    })
}
