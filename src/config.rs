use clap::Parser;
use std::time::Duration;

/// Bounded retry for idempotent reads.
///
/// Writes are never retried: a retried conditional write could race a competing writer
/// that landed in between.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReadRetryPolicy {
    /// Total attempts, including the first one.
    pub max_attempts: u32,
    pub base_backoff_ms: u64,
    pub max_backoff_ms: u64,
}

impl Default for ReadRetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_backoff_ms: 10,
            max_backoff_ms: 200,
        }
    }
}

impl ReadRetryPolicy {
    pub fn none() -> Self {
        Self {
            max_attempts: 1,
            ..Self::default()
        }
    }

    pub fn attempts(&self) -> u32 {
        self.max_attempts.max(1)
    }

    /// Exponential backoff after the given (1-based) failed attempt.
    pub fn backoff(&self, attempt: u32) -> Duration {
        let base = self.base_backoff_ms.max(1);
        let max = self.max_backoff_ms.max(base);
        let factor = 2u64.saturating_pow(attempt.saturating_sub(1));
        Duration::from_millis(base.saturating_mul(factor).min(max))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CollectionNames {
    pub people: String,
    pub businesses: String,
    pub cohorts: String,
    pub measurements: String,
}

impl Default for CollectionNames {
    fn default() -> Self {
        Self {
            people: "people".to_string(),
            businesses: "businesses".to_string(),
            cohorts: "cohorts".to_string(),
            measurements: "measurements".to_string(),
        }
    }
}

/// Settings shared by every family store.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct StoreConfig {
    pub collections: CollectionNames,
    pub read_retry: ReadRetryPolicy,
    /// Applied by `save` when the caller passes no deadline of its own.
    pub save_timeout: Option<Duration>,
}

impl StoreConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn collections(mut self, collections: CollectionNames) -> Self {
        self.collections = collections;
        self
    }

    /// Prefix every collection name, e.g. to isolate tenants in one store.
    pub fn collection_prefix(mut self, prefix: &str) -> Self {
        let names = &mut self.collections;
        for name in [
            &mut names.people,
            &mut names.businesses,
            &mut names.cohorts,
            &mut names.measurements,
        ] {
            *name = format!("{prefix}{name}");
        }
        self
    }

    pub fn read_retry(mut self, policy: ReadRetryPolicy) -> Self {
        self.read_retry = policy;
        self
    }

    pub fn save_timeout(mut self, timeout: Duration) -> Self {
        self.save_timeout = Some(timeout);
        self
    }
}

/// Command line and environment settings of the server binary.
#[derive(Debug, Clone, Parser)]
#[command(name = "fitcoach")]
#[command(about = "Fitness coaching store served over HTTP")]
pub struct ServerConfig {
    #[arg(long, env = "FITCOACH_HOST", default_value = "127.0.0.1")]
    pub host: String,

    #[arg(long, env = "FITCOACH_PORT", default_value_t = 8080)]
    pub port: u16,

    /// Upper bound for one save, cascade included.
    #[arg(long, env = "FITCOACH_SAVE_TIMEOUT_MS")]
    pub save_timeout_ms: Option<u64>,

    #[arg(long, env = "FITCOACH_READ_ATTEMPTS", default_value_t = 3)]
    pub read_attempts: u32,

    #[arg(long, env = "RUST_LOG", default_value = "fitcoach=debug,tower_http=info")]
    pub log_filter: String,
}

impl ServerConfig {
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn store_config(&self) -> StoreConfig {
        let config = StoreConfig::new().read_retry(ReadRetryPolicy {
            max_attempts: self.read_attempts,
            ..ReadRetryPolicy::default()
        });
        match self.save_timeout_ms {
            Some(ms) => config.save_timeout(Duration::from_millis(ms)),
            None => config,
        }
    }
}
