//! Server configuration, read once from the environment at startup.

use std::env;

#[derive(Debug, Clone)]
pub struct Config {
    /// SQLite database URL (e.g. "sqlite:data/cardstock.db").
    pub database_url: String,
    /// Secret used to sign and verify caller identity tokens.
    pub jwt_secret: String,
    pub host: String,
    pub port: u16,
}

impl Config {
    /// `DATABASE_URL` and `JWT_SECRET` are required; the rest have defaults.
    pub fn from_env() -> Result<Self, env::VarError> {
        Ok(Self {
            database_url: env::var("DATABASE_URL")?,
            jwt_secret: env::var("JWT_SECRET")?,
            host: env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            port: env::var("PORT")
                .unwrap_or_else(|_| "3000".to_string())
                .parse()
                .unwrap_or(3000),
        })
    }
}
