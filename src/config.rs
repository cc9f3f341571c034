//! Tunables for detection and delivery.
//!
//! Defaults work without any setup. [`DeliveryConfig::from_env`] layers
//! `MIMEDROP_*` environment variables on top of the defaults.

use std::env;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::warn;

pub const DEFAULT_CHUNK_SIZE: usize = 8192;
pub const DEFAULT_SNIFF_LEN: usize = 8192;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectorConfig {
    /// Leading bytes of a file read for sniffing.
    pub sniff_len: usize,
    /// Refine a bare `application/octet-stream` result from the file name.
    pub name_fallback: bool,
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            sniff_len: DEFAULT_SNIFF_LEN,
            name_fallback: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DeliveryConfig {
    /// Read size of the file body loop.
    pub chunk_size: usize,
    /// Emit `Content-Length` for in-memory sources too.
    pub buffer_content_length: bool,
    pub detector: DetectorConfig,
}

impl Default for DeliveryConfig {
    fn default() -> Self {
        Self {
            chunk_size: DEFAULT_CHUNK_SIZE,
            buffer_content_length: true,
            detector: DetectorConfig::default(),
        }
    }
}

impl DeliveryConfig {
    /// Defaults overridden by `MIMEDROP_CHUNK_SIZE`, `MIMEDROP_BUFFER_CONTENT_LENGTH`,
    /// `MIMEDROP_SNIFF_LEN` and `MIMEDROP_NAME_FALLBACK`.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub(crate) fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();
        override_from(&lookup, "MIMEDROP_CHUNK_SIZE", &mut config.chunk_size);
        override_from(
            &lookup,
            "MIMEDROP_BUFFER_CONTENT_LENGTH",
            &mut config.buffer_content_length,
        );
        override_from(&lookup, "MIMEDROP_SNIFF_LEN", &mut config.detector.sniff_len);
        override_from(
            &lookup,
            "MIMEDROP_NAME_FALLBACK",
            &mut config.detector.name_fallback,
        );

        if config.chunk_size == 0 {
            warn!("MIMEDROP_CHUNK_SIZE must be positive, using default");
            config.chunk_size = DEFAULT_CHUNK_SIZE;
        }
        config
    }
}

fn override_from<F, T>(lookup: &F, key: &str, slot: &mut T)
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    let Some(raw) = lookup(key) else {
        return;
    };
    match raw.trim().parse::<T>() {
        Ok(value) => *slot = value,
        Err(_) => warn!(key, value = %raw, "ignoring invalid config value"),
    }
}
