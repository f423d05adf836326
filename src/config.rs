use std::env;
use std::path::PathBuf;

use crate::error::ConfigError;

/// Fallback signing key for local development only. Production refuses to start without
/// an explicit `JWT_SECRET`.
const LOCAL_JWT_SECRET: &str = "local-development-signing-key";

/// AppConfig
///
/// Holds the application's entire configuration state. Loaded once at startup and immutable
/// afterwards; the signing key in particular is never rotated mid-process.
#[derive(Clone, Debug)]
pub struct AppConfig {
    // Runtime environment marker. Selects the log format and whether a secret is mandatory.
    pub env: Env,
    // Secret key used to sign and verify bearer tokens.
    pub jwt_secret: String,
    // Directory holding `items.json` and `users.json`.
    pub data_dir: PathBuf,
    // Socket address the HTTP listener binds to.
    pub bind_addr: String,
}

/// Env
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Env {
    Local,
    Production,
}

impl Default for AppConfig {
    /// Safe, non-panicking values for test state setup.
    fn default() -> Self {
        Self {
            env: Env::Local,
            jwt_secret: LOCAL_JWT_SECRET.to_string(),
            data_dir: PathBuf::from("./data"),
            bind_addr: "127.0.0.1:3000".to_string(),
        }
    }
}

impl AppConfig {
    /// load
    ///
    /// Reads the configuration from environment variables.
    ///
    /// # Errors
    /// Fails fast with [`ConfigError`] if `JWT_SECRET` is missing in production, or is set
    /// but empty in any environment.
    pub fn load() -> Result<Self, ConfigError> {
        let env = match env::var("APP_ENV").as_deref() {
            Ok("production") => Env::Production,
            _ => Env::Local,
        };

        let jwt_secret = match (env, env::var("JWT_SECRET")) {
            (_, Ok(secret)) if secret.trim().is_empty() => {
                return Err(ConfigError::EmptyVar("JWT_SECRET"));
            }
            (_, Ok(secret)) => secret,
            (Env::Production, Err(_)) => return Err(ConfigError::MissingVar("JWT_SECRET")),
            (Env::Local, Err(_)) => LOCAL_JWT_SECRET.to_string(),
        };

        let data_dir = env::var("DATA_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("./data"));

        let bind_addr = env::var("BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:3000".to_string());

        Ok(Self {
            env,
            jwt_secret,
            data_dir,
            bind_addr,
        })
    }

    pub fn items_path(&self) -> PathBuf {
        self.data_dir.join("items.json")
    }

    pub fn users_path(&self) -> PathBuf {
        self.data_dir.join("users.json")
    }
}
