use std::env;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub database_max_connections: u32,
    pub host: String,
    pub port: u16,
    pub jwt_secret: String,
    pub jwt_ttl_hours: i64,
    pub upload_dir: String,
    pub upload_max_bytes: usize,
    pub cors_origin: Option<String>,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url =
            env::var("DATABASE_URL").unwrap_or_else(|_| "sqlite://storefront.db".to_string());
        let jwt_secret = env::var("JWT_SECRET")
            .map_err(|_| anyhow::anyhow!("JWT_SECRET must be set"))?;
        if jwt_secret.trim().is_empty() {
            anyhow::bail!("JWT_SECRET must not be empty");
        }
        let host = env::var("APP_HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let port = parse_or("APP_PORT", 3000);
        let database_max_connections = parse_or("DATABASE_MAX_CONNECTIONS", 5);
        let jwt_ttl_hours = parse_or("JWT_TTL_HOURS", 24);
        let upload_dir = env::var("UPLOAD_DIR").unwrap_or_else(|_| "uploads".to_string());
        let upload_max_bytes = parse_or("UPLOAD_MAX_BYTES", 5 * 1024 * 1024);
        let cors_origin = env::var("CORS_ORIGIN").ok().filter(|s| !s.is_empty());

        Ok(Self {
            port,
            database_url,
            database_max_connections,
            host,
            jwt_secret,
            jwt_ttl_hours,
            upload_dir,
            upload_max_bytes,
            cors_origin,
        })
    }
}

fn parse_or<T: std::str::FromStr>(key: &str, default: T) -> T {
    env::var(key)
        .ok()
        .and_then(|v| v.parse::<T>().ok())
        .unwrap_or(default)
}
