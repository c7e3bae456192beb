//! Pool configuration.
//!
//! [`PoolConfig`] can be embedded in an application's own serde config, or read
//! from the environment with [`PoolConfig::from_env`]:
//!
//! - `DATABASE_URL` (required)
//! - `PGKIT_POOL_MAX_SIZE` (optional, default 16)
//! - `PGKIT_POOL_RECYCLING` (optional: `fast`, `verified` or `clean`)

use crate::error::{PgError, PgResult};
use serde::Deserialize;

pub const DATABASE_URL_ENV: &str = "DATABASE_URL";
pub const MAX_SIZE_ENV: &str = "PGKIT_POOL_MAX_SIZE";
pub const RECYCLING_ENV: &str = "PGKIT_POOL_RECYCLING";

const DEFAULT_MAX_SIZE: usize = 16;

/// How a pooled connection is checked before reuse.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Recycling {
    /// Only check that the connection is not closed.
    #[default]
    Fast,
    /// Run a test query before handing the connection out.
    Verified,
    /// Discard session state before reuse.
    Clean,
}

impl std::str::FromStr for Recycling {
    type Err = PgError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "fast" => Ok(Self::Fast),
            "verified" => Ok(Self::Verified),
            "clean" => Ok(Self::Clean),
            other => Err(PgError::Config(format!(
                "unknown recycling method '{other}' (expected fast, verified or clean)"
            ))),
        }
    }
}

#[cfg(feature = "pool")]
impl From<Recycling> for deadpool_postgres::RecyclingMethod {
    fn from(r: Recycling) -> Self {
        match r {
            Recycling::Fast => Self::Fast,
            Recycling::Verified => Self::Verified,
            Recycling::Clean => Self::Clean,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct PoolConfig {
    pub url: String,
    #[serde(default = "default_max_size")]
    pub max_size: usize,
    #[serde(default)]
    pub recycling: Recycling,
}

fn default_max_size() -> usize {
    DEFAULT_MAX_SIZE
}

impl PoolConfig {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            max_size: DEFAULT_MAX_SIZE,
            recycling: Recycling::default(),
        }
    }

    pub fn max_size(mut self, max_size: usize) -> Self {
        self.max_size = max_size;
        self
    }

    pub fn recycling(mut self, recycling: Recycling) -> Self {
        self.recycling = recycling;
        self
    }

    /// Load from process environment variables.
    pub fn from_env() -> PgResult<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load using an arbitrary key lookup (environment, secrets store, test map).
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> PgResult<Self> {
        let url = lookup(DATABASE_URL_ENV)
            .filter(|v| !v.trim().is_empty())
            .ok_or_else(|| PgError::Config(format!("{DATABASE_URL_ENV} is not set")))?;

        let mut config = Self::new(url);

        if let Some(raw) = lookup(MAX_SIZE_ENV) {
            let max_size: usize = raw.trim().parse().map_err(|e| {
                PgError::Config(format!("invalid {MAX_SIZE_ENV} '{raw}': {e}"))
            })?;
            config = config.max_size(max_size);
        }

        if let Some(raw) = lookup(RECYCLING_ENV) {
            config = config.recycling(raw.parse()?);
        }

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> PgResult<()> {
        if self.max_size == 0 {
            return Err(PgError::Config("max_size must be greater than zero".into()));
        }
        Ok(())
    }
}
