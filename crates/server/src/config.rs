use std::env;

use puzzle_core::score::DEFAULT_BONUS_MULTIPLIER;

#[derive(Clone, Debug)]
pub struct Config {
    pub jwt_secret: String,
    pub host: String,
    pub port: u16,
    /// Path of the append-only activity log; empty disables it.
    pub activity_log_path: String,
    /// Speed-bonus multiplier applied by the scoring engine.
    pub bonus_multiplier: f64,
}

impl Config {
    pub fn from_env() -> Self {
        Self {
            jwt_secret: env::var("JWT_SECRET_KEY")
                .unwrap_or_else(|_| "dev-secret-key-change-in-production".to_string()),
            host: env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            port: env::var("PORT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(8000),
            activity_log_path: env::var("ACTIVITY_LOG_PATH")
                .unwrap_or_else(|_| "session_activity_log.jsonl".to_string()),
            bonus_multiplier: env::var("SCORE_BONUS_MULTIPLIER")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(DEFAULT_BONUS_MULTIPLIER),
        }
    }
}
