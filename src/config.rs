use crate::errors::{AppError, Result};

/// Process configuration, read once in `main` and passed down explicitly.
/// Missing AI keys or session secret abort startup instead of surfacing as
/// per-request failures later.
#[derive(Debug, Clone)]
pub struct Config {
    pub openai_api_key: String,
    pub gemini_api_key: String,
    pub session_secret: String,
    /// SQLite file path. `None` selects the in-memory storage backend
    /// (local/dev only).
    pub database_path: Option<String>,
    pub port: u16,
}

fn require_env(name: &str) -> Result<String> {
    std::env::var(name)
        .map_err(|_| AppError::ConfigError(format!("{} must be set in environment", name)))
}

impl Config {
    pub fn from_env() -> Result<Self> {
        let port = std::env::var("PORT")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(8080);

        Ok(Self {
            openai_api_key: require_env("OPENAI_API_KEY")?,
            gemini_api_key: require_env("GOOGLE_GEMINI_API_KEY")?,
            session_secret: require_env("SESSION_SECRET")?,
            database_path: std::env::var("DATABASE_PATH").ok(),
            port,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_key_is_a_config_error() {
        std::env::remove_var("OPENAI_API_KEY");
        let err = require_env("OPENAI_API_KEY").unwrap_err();
        assert!(matches!(err, AppError::ConfigError(_)));
    }
}
