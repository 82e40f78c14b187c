use serde::Deserialize;

#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub database_url: String,
    pub database_max_connections: u32,
    pub jwt_secret: String,
    pub token_ttl_seconds: i64,
    #[serde(default)]
    pub cors_origins: Vec<String>,
    pub media_root: String,
    pub media_url: String,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let host = std::env::var("HOST").unwrap_or_else(|_| "127.0.0.1".into());
        let port = std::env::var("PORT")
            .unwrap_or_else(|_| "8080".into())
            .parse()
            .map_err(|e| anyhow::anyhow!("invalid PORT: {}", e))?;
        let database_url = std::env::var("DATABASE_URL")
            .map_err(|_| anyhow::anyhow!("DATABASE_URL must be set"))?;
        let database_max_connections = std::env::var("DATABASE_MAX_CONNECTIONS")
            .unwrap_or_else(|_| "20".into())
            .parse()
            .map_err(|e| anyhow::anyhow!("invalid DATABASE_MAX_CONNECTIONS: {}", e))?;
        let jwt_secret =
            std::env::var("JWT_SECRET").map_err(|_| anyhow::anyhow!("JWT_SECRET must be set"))?;
        let token_ttl_seconds = std::env::var("TOKEN_TTL_SECONDS")
            .unwrap_or_else(|_| "3600".into())
            .parse()
            .map_err(|e| anyhow::anyhow!("invalid TOKEN_TTL_SECONDS: {}", e))?;
        let cors_origins = parse_origins(
            &std::env::var("CORS_ORIGINS").unwrap_or_else(|_| "*".into()),
        );
        let media_root = std::env::var("MEDIA_ROOT").unwrap_or_else(|_| "./media".into());
        let media_url = std::env::var("MEDIA_URL").unwrap_or_else(|_| "/media/".into());

        Ok(Self {
            host,
            port,
            database_url,
            database_max_connections,
            jwt_secret,
            token_ttl_seconds,
            cors_origins,
            media_root,
            media_url,
        })
    }
}

fn parse_origins(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}
