use std::{env, fmt::Display, str::FromStr};

use anyhow::Context;
use chrono::FixedOffset;
use tracing::info;

pub struct Config {
    pub port: u16,
    pub database_url: Option<String>,
    pub static_dir: String,
    /// Offset of the site's calendar day: date filters, export dates.
    pub utc_offset: FixedOffset,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        Ok(Self {
            port: try_load("PORT", "8081")?,
            database_url: env::var("DATABASE_URL").ok().filter(|s| !s.trim().is_empty()),
            static_dir: try_load("STATIC_DIR", "./public")?,
            utc_offset: try_load("SITE_UTC_OFFSET", "+03:00")?,
        })
    }
}

fn try_load<T: FromStr>(key: &str, default: &str) -> anyhow::Result<T>
where
    T::Err: Display,
{
    let raw = env::var(key).unwrap_or_else(|_| {
        info!("{key} not set, using default: {default}");
        default.to_string()
    });
    raw.parse::<T>()
        .map_err(|e| anyhow::anyhow!("{e}"))
        .with_context(|| format!("invalid {key} value {raw:?}"))
}
