use social_blog_server::infrastructure::config::AppConfig;
use social_blog_server::infrastructure::database::{create_pool, run_migrations};
use social_blog_server::infrastructure::logging::{LogFormat, init_logging};
use social_blog_server::server::start_rest_server;

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    init_logging(LogFormat::from_env_or(LogFormat::Json));

    let config = AppConfig::from_env()?;
    let pool = create_pool(&config.database_url, config.database_max_connections).await?;
    run_migrations(&pool).await?;

    start_rest_server(config, pool).await
}
