// --- File: src/config.rs ---

use std::env;

use crate::pili::PiliConfig;

// --- Unified Configuration Struct ---
#[derive(Clone, Debug)]
pub struct AppConfig {
    // --- Server ---
    pub server_host: String,
    pub server_port: u16,

    // --- Storage ---
    pub database_url: String,

    // --- Logging ---
    pub log_level: String,
    pub log_file: Option<String>,

    // --- Rate Limiting ---
    pub governor_burst: u32,
    pub governor_per_second: u64,

    // --- Hub ---
    pub pili: PiliConfig,

    // --- Expiry Sweep ---
    pub sweep_on_startup: bool,
}

impl AppConfig {
    // Load configuration from environment variables
    pub fn load() -> Result<Self, String> {
        Self::from_lookup(&|key: &str| env::var(key).ok())
    }

    /// Builds the configuration from any key lookup, so tests need not touch
    /// the process environment.
    pub fn from_lookup<F>(lookup: &F) -> Result<Self, String>
    where
        F: Fn(&str) -> Option<String>,
    {
        let flag = |key: &str, default: bool| {
            lookup(key)
                .map(|v| v.eq_ignore_ascii_case("true"))
                .unwrap_or(default)
        };

        let server_port = lookup("SERVER_PORT")
            .unwrap_or_else(|| "6666".into())
            .parse::<u16>()
            .map_err(|_| "Invalid SERVER_PORT".to_string())?;

        // Rate limits fall back to defaults rather than failing startup.
        let governor_burst = lookup("GOVERNOR_BURST")
            .and_then(|v| v.parse().ok())
            .unwrap_or(5);
        let governor_per_second = lookup("GOVERNOR_PER_SECOND")
            .and_then(|v| v.parse().ok())
            .unwrap_or(2);

        let pili = PiliConfig::from_lookup(lookup)?;

        Ok(AppConfig {
            server_host: lookup("SERVER_HOST").unwrap_or_else(|| "127.0.0.1".into()),
            server_port,
            database_url: lookup("DATABASE_URL")
                .unwrap_or_else(|| "sqlite://accounts.db?mode=rwc".into()),
            log_level: lookup("LOG_LEVEL").unwrap_or_else(|| "info".into()),
            log_file: lookup("LOG_FILE").filter(|v| !v.is_empty()),
            governor_burst,
            governor_per_second,
            pili,
            sweep_on_startup: flag("SWEEP_ON_STARTUP", true),
        })
    }
}
