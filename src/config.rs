use std::env;

#[derive(Clone, Debug)]
pub struct Config {
    pub database_url: String,
    pub bind_addr: String,
    pub jwt_secret: String,
    pub environment: String,
    pub token_ttl_days: i64,
    pub rate_limit_window_secs: u64,
    pub rate_limit_global_max: u32,
    pub rate_limit_appointments_max: u32,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url = env::var("DATABASE_URL")?;
        let bind_addr = env::var("BIND_ADDR").unwrap_or_else(|_| "127.0.0.1:5050".to_string());
        let jwt_secret = env::var("JWT_SECRET").unwrap_or_else(|_| "default-secret".to_string());
        let environment = env::var("APP_ENV").unwrap_or_else(|_| "development".to_string());
        let token_ttl_days = env::var("TOKEN_TTL_DAYS")
            .ok()
            .and_then(|s| s.parse::<i64>().ok())
            .unwrap_or(7);
        let rate_limit_window_secs = env::var("RATE_LIMIT_WINDOW_SECS")
            .ok()
            .and_then(|s| s.parse::<u64>().ok())
            .unwrap_or(15 * 60);
        let rate_limit_global_max = env::var("RATE_LIMIT_GLOBAL_MAX")
            .ok()
            .and_then(|s| s.parse::<u32>().ok())
            .unwrap_or(100);
        let rate_limit_appointments_max = env::var("RATE_LIMIT_APPOINTMENTS_MAX")
            .ok()
            .and_then(|s| s.parse::<u32>().ok())
            .unwrap_or(500);

        Ok(Self {
            database_url,
            bind_addr,
            jwt_secret,
            environment,
            token_ttl_days,
            rate_limit_window_secs,
            rate_limit_global_max,
            rate_limit_appointments_max,
        })
    }

    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }
}
