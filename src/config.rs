use std::env;

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub port: u16,
    pub database_url: String,
    pub admin_username: String,
    pub admin_password_hash: String,
    pub session_secret: String,
    pub session_ttl_hours: i64,
    pub login_max_attempts: u32,
    pub login_window_secs: u64,
    pub cors_origin: Option<String>,
}

fn parsed<T: std::str::FromStr>(key: &str, default: T) -> T {
    env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

impl AppConfig {
    pub fn from_env() -> Self {
        Self {
            port: parsed("PORT", 3000),
            database_url: env::var("DATABASE_URL").unwrap_or_else(|_| "rentacar.db".to_string()),
            admin_username: env::var("ADMIN_USERNAME").unwrap_or_default(),
            admin_password_hash: env::var("ADMIN_PASSWORD_HASH").unwrap_or_default(),
            session_secret: env::var("SESSION_SECRET").unwrap_or_default(),
            session_ttl_hours: parsed("SESSION_TTL_HOURS", 8),
            login_max_attempts: parsed("LOGIN_MAX_ATTEMPTS", 5),
            login_window_secs: parsed("LOGIN_WINDOW_SECS", 60),
            cors_origin: env::var("CORS_ORIGIN").ok().filter(|v| !v.is_empty()),
        }
    }
}
