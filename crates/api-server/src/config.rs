//! Server configuration read from the environment

use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use tb_core::trash::{TrashPolicy, DEFAULT_RETENTION_DAYS, DEFAULT_SNAPSHOT_MAX_CHARS};

const DEFAULT_DATA_DIR: &str = ".tb-data";
const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8081";
const DEFAULT_JWT_SECRET: &str = "dev-jwt-secret-change-me";
const DEFAULT_PURGE_INTERVAL_SECS: u64 = 60 * 60;
const DEFAULT_BULK_RATE_LIMIT: usize = 30;
const DEFAULT_BULK_RATE_WINDOW_SECS: u64 = 60;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitConfig {
    pub max_requests: usize,
    pub window: Duration,
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub data_dir: PathBuf,
    pub bind_addr: SocketAddr,
    pub jwt_secret: String,
    pub trash_policy: TrashPolicy,
    /// `None` disables the background purge job
    pub purge_interval: Option<Duration>,
    pub bulk_rate_limit: RateLimitConfig,
}

fn env_string(name: &str) -> Option<String> {
    std::env::var(name)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

fn env_parse<T: std::str::FromStr>(name: &str, default: T) -> T {
    match env_string(name) {
        Some(raw) => match raw.parse::<T>() {
            Ok(value) => value,
            Err(_) => {
                tracing::warn!("Ignoring invalid value for {}: {:?}", name, raw);
                default
            }
        },
        None => default,
    }
}

impl ServerConfig {
    pub fn from_env() -> Self {
        let data_dir = env_string("TB_DATA_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_DATA_DIR));
        let bind_addr = env_parse(
            "TB_BIND_ADDR",
            DEFAULT_BIND_ADDR
                .parse()
                .unwrap_or_else(|_| SocketAddr::from(([0, 0, 0, 0], 8081))),
        );
        let jwt_secret =
            env_string("TB_JWT_SECRET").unwrap_or_else(|| DEFAULT_JWT_SECRET.to_string());

        let retention_days = env_parse("TB_TRASH_RETENTION_DAYS", DEFAULT_RETENTION_DAYS as u32);
        let snapshot_max_chars = env_parse("TB_SNAPSHOT_MAX_CHARS", DEFAULT_SNAPSHOT_MAX_CHARS);
        let trash_policy = TrashPolicy::default()
            .with_retention_days(retention_days)
            .with_snapshot_max_chars(snapshot_max_chars);

        let purge_secs = env_parse("TB_PURGE_INTERVAL_SECS", DEFAULT_PURGE_INTERVAL_SECS);
        let purge_interval = (purge_secs > 0).then(|| Duration::from_secs(purge_secs));

        let bulk_rate_limit = RateLimitConfig {
            max_requests: env_parse("TB_BULK_RATE_LIMIT", DEFAULT_BULK_RATE_LIMIT).max(1),
            window: Duration::from_secs(
                env_parse("TB_BULK_RATE_WINDOW_SECS", DEFAULT_BULK_RATE_WINDOW_SECS).max(1),
            ),
        };

        Self {
            data_dir,
            bind_addr,
            jwt_secret,
            trash_policy,
            purge_interval,
            bulk_rate_limit,
        }
    }

    /// Defaults rooted at `data_dir`, without consulting the environment.
    #[cfg(test)]
    pub fn with_data_dir(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
            bind_addr: SocketAddr::from(([127, 0, 0, 1], 0)),
            jwt_secret: DEFAULT_JWT_SECRET.to_string(),
            trash_policy: TrashPolicy::default(),
            purge_interval: None,
            bulk_rate_limit: RateLimitConfig {
                max_requests: DEFAULT_BULK_RATE_LIMIT,
                window: Duration::from_secs(DEFAULT_BULK_RATE_WINDOW_SECS),
            },
        }
    }

    pub fn store_path(&self) -> PathBuf {
        self.data_dir.join("store.json")
    }

    pub fn audit_dir(&self) -> PathBuf {
        self.data_dir.join("audit")
    }
}
