//! Configuration manager for induk.

use std::fs::File;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use axum::extract::FromRef;
use serde::{Deserialize, Serialize};

use crate::AppState;

const DEFAULT_CONFIG_PATH: &str = "config.yaml";
const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Development mode enables verbose logs.
pub const DEVELOPMENT: &str = "development";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Configuration {
    /// Instance name.
    pub name: String,
    #[serde(skip_deserializing)]
    version: String,
    #[serde(skip)]
    path: PathBuf,
    /// HTTP listener configuration.
    pub server: Server,
    /// Related to PostgreSQL configuration.
    #[serde(skip_serializing)]
    pub postgres: Option<Postgres>,
    /// Related to JsonWebToken configuration.
    #[serde(skip_serializing)]
    pub token: Token,
    /// Related to per-client rate limiting.
    pub rate_limit: RateLimit,
    /// Related to Argon2 configuration.
    #[serde(skip_serializing)]
    pub argon2: Option<Argon2>,
    /// Related to OTLP exporters.
    #[serde(skip_serializing)]
    pub telemetry: Option<Telemetry>,
}

impl Default for Configuration {
    fn default() -> Self {
        Self {
            name: env!("CARGO_PKG_NAME").to_owned(),
            version: VERSION.to_owned(),
            path: PathBuf::default(),
            server: Server::default(),
            postgres: None,
            token: Token::default(),
            rate_limit: RateLimit::default(),
            argon2: None,
            telemetry: None,
        }
    }
}

/// HTTP listener configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Server {
    pub address: String,
    pub port: u16,
    /// `development` or `production`.
    pub mode: String,
    /// Maximum request body size, in bytes.
    pub body_limit: usize,
    /// Request timeout, in seconds.
    pub timeout_secs: u64,
    /// Listener serving Prometheus `/metrics`, kept off the public API.
    pub metrics_address: String,
}

impl Default for Server {
    fn default() -> Self {
        Self {
            address: "0.0.0.0".into(),
            port: 8080,
            mode: DEVELOPMENT.into(),
            body_limit: 10 << 20, // 10 MiB.
            timeout_secs: 10,
            metrics_address: "127.0.0.1:9100".into(),
        }
    }
}

/// PostgreSQL configuration.
#[derive(Debug, Default, PartialEq, Clone, Serialize, Deserialize)]
pub struct Postgres {
    /// Hostname:(?port) for PostgreSQL instance.
    pub address: String,
    /// Database name.
    pub database: Option<String>,
    /// Username credential to connect.
    pub username: Option<String>,
    /// Password credential to connect.
    pub password: Option<String>,
    /// Maximum pool connections.
    pub pool_size: Option<u32>,
}

/// Json Web Token configuration.
#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Token {
    /// HMAC secret. Prefer `JWT_SECRET` environment variable.
    pub secret: String,
    pub expiry_hours: u64,
}

impl Default for Token {
    fn default() -> Self {
        Self {
            secret: String::default(),
            expiry_hours: 24,
        }
    }
}

/// Per-client rate limiting configuration.
#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RateLimit {
    /// Requests admitted per client within the window.
    pub limit: usize,
    pub window_secs: u64,
    /// Delay between two sweeps of idle clients.
    pub sweep_interval_secs: u64,
    /// Use `X-Forwarded-For` and `X-Real-IP` to identify clients.
    /// Only enable behind a trusted reverse proxy.
    pub trust_forwarded_headers: bool,
}

impl Default for RateLimit {
    fn default() -> Self {
        Self {
            limit: 100,
            window_secs: 60,
            sweep_interval_secs: 60,
            trust_forwarded_headers: false,
        }
    }
}

impl RateLimit {
    pub fn window(&self) -> Duration {
        Duration::from_secs(self.window_secs)
    }

    pub fn sweep_interval(&self) -> Duration {
        Duration::from_secs(self.sweep_interval_secs)
    }
}

/// Argon2 configuration.
#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
pub struct Argon2 {
    /// Memory used while hashing.
    pub memory_cost: u32,
    /// Iterations of hash.
    pub iterations: u32,
    /// Parallelism degree.
    pub parallelism: u32,
    /// Output hash length.
    pub hash_length: usize,
}

impl Default for Argon2 {
    fn default() -> Self {
        Self {
            memory_cost: 1024 * 64, // 64 MiB.
            iterations: 4,
            parallelism: 2,
            hash_length: 32,
        }
    }
}

/// OpenTelemetry configuration.
#[derive(Debug, Default, PartialEq, Clone, Serialize, Deserialize)]
pub struct Telemetry {
    /// gRPC endpoint of the OTLP collector.
    pub otlp_endpoint: String,
}

impl FromRef<AppState> for Arc<Configuration> {
    fn from_ref(state: &AppState) -> Arc<Configuration> {
        Arc::clone(&state.config)
    }
}

impl Configuration {
    pub fn path(mut self, path: PathBuf) -> Self {
        self.path = path;
        self
    }

    /// Application version.
    pub fn version(&self) -> &str {
        &self.version
    }

    /// Whether the server runs in development mode.
    pub fn is_development(&self) -> bool {
        self.server.mode == DEVELOPMENT
    }

    /// Reads the `config.yaml` file from the specified path or the default
    /// location, then applies environment overrides.
    pub fn read(self) -> Arc<Self> {
        let file_path = if self.path.is_file() {
            self.path.clone()
        } else {
            std::env::var("CONFIG_PATH")
                .map(PathBuf::from)
                .unwrap_or_else(|_| Path::new(DEFAULT_CONFIG_PATH).to_path_buf())
        };

        let mut config = match File::open(&file_path) {
            Ok(file) => match serde_yaml::from_reader::<_, Configuration>(file) {
                Ok(config) => config,
                Err(err) => self.error(err),
            },
            Err(err) => self.error(err),
        };

        // set app version.
        config.version = VERSION.to_owned();
        config.path = file_path;
        config.apply_env(|key| std::env::var(key).ok());

        Arc::new(config)
    }

    /// Override values using `lookup`, usually backed by the environment.
    pub fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        fn parse<T: std::str::FromStr>(key: &str, value: String) -> Option<T> {
            match value.parse() {
                Ok(value) => Some(value),
                Err(_) => {
                    tracing::warn!(%key, %value, "ignoring malformed environment variable");
                    None
                },
            }
        }

        if let Some(name) = lookup("SERVER_NAME") {
            self.name = name;
        }
        if let Some(port) = lookup("SERVER_PORT").and_then(|v| parse::<u16>("SERVER_PORT", v)) {
            self.server.port = port;
        }
        if let Some(mode) = lookup("SERVER_MODE") {
            self.server.mode = mode;
        }
        if let Some(address) = lookup("METRICS_ADDRESS") {
            self.server.metrics_address = address;
        }

        if let Some(host) = lookup("DB_HOST") {
            let postgres = self.postgres.get_or_insert_with(Postgres::default);
            postgres.address = match lookup("DB_PORT") {
                Some(port) => format!("{host}:{port}"),
                None => host,
            };
        }
        if let Some(postgres) = self.postgres.as_mut() {
            if let Some(name) = lookup("DB_NAME") {
                postgres.database = Some(name);
            }
            if let Some(user) = lookup("DB_USER") {
                postgres.username = Some(user);
            }
            if let Some(password) = lookup("DB_PASSWORD") {
                postgres.password = Some(password);
            }
        }

        if let Some(secret) = lookup("JWT_SECRET") {
            self.token.secret = secret;
        }
        if let Some(hours) = lookup("JWT_EXPIRY_HOURS").and_then(|v| parse::<u64>("JWT_EXPIRY_HOURS", v)) {
            self.token.expiry_hours = hours;
        }

        if let Some(limit) = lookup("RATE_LIMIT").and_then(|v| parse::<usize>("RATE_LIMIT", v)) {
            self.rate_limit.limit = limit;
        }
        if let Some(secs) =
            lookup("RATE_LIMIT_WINDOW_SECS").and_then(|v| parse::<u64>("RATE_LIMIT_WINDOW_SECS", v))
        {
            self.rate_limit.window_secs = secs;
        }
    }

    /// Return a default configuration as fallback.
    fn error(&self, err: impl std::error::Error) -> Self {
        tracing::error!(error = %err, "`config.yaml` file not found or invalid, using defaults");
        Self::default()
    }
}
