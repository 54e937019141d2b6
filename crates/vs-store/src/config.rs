//! `vs.toml` loading and data directory resolution.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::{env, fs};

use serde::{Deserialize, Serialize};

use vs_core::constants::{DEFAULT_BONUS_MULTIPLIER, DEFAULT_RECOGNITION_SCALE};
use vs_core::{SimulationConfig, TieBreak, region_code, us_electoral_units};

use crate::error::{Result, StoreError};

pub const CONFIG_FILE: &str = "vs.toml";
pub const CACHE_FILE: &str = "cache.db";
pub const DEFAULT_CACHE_TTL_SECS: u64 = 86_400;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub bonus_multiplier: f64,
    pub recognition_scale: f64,
    pub tie_break: TieBreak,
    /// Seconds a cached result stays valid. `0` keeps entries forever.
    pub cache_ttl_secs: u64,
    /// Overrides and additions to the stock unit table.
    pub units: BTreeMap<String, u32>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bonus_multiplier: DEFAULT_BONUS_MULTIPLIER,
            recognition_scale: DEFAULT_RECOGNITION_SCALE,
            tie_break: TieBreak::default(),
            cache_ttl_secs: DEFAULT_CACHE_TTL_SECS,
            units: BTreeMap::new(),
        }
    }
}

impl Config {
    /// Load from `path`. A missing file yields the defaults.
    pub fn load(path: &Path) -> Result<Self> {
        let content = match fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = %path.display(), "no config file, using defaults");
                return Ok(Self::default());
            }
            Err(e) => {
                return Err(StoreError::Config(format!(
                    "failed to read {}: {e}",
                    path.display()
                )));
            }
        };
        let config = Self::parse(&content).map_err(|e| match e {
            StoreError::Config(msg) => StoreError::Config(format!("{}: {msg}", path.display())),
            other => other,
        })?;
        tracing::debug!(path = %path.display(), "loaded config");
        Ok(config)
    }

    pub fn parse(content: &str) -> Result<Self> {
        let config: Self =
            toml::from_str(content).map_err(|e| StoreError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if !self.bonus_multiplier.is_finite() || !(0.0..=1.0).contains(&self.bonus_multiplier) {
            return Err(StoreError::Config(format!(
                "bonus_multiplier must be within [0, 1], got {}",
                self.bonus_multiplier
            )));
        }
        if !self.recognition_scale.is_finite() || self.recognition_scale <= 0.0 {
            return Err(StoreError::Config(format!(
                "recognition_scale must be positive, got {}",
                self.recognition_scale
            )));
        }
        Ok(())
    }

    pub fn simulation(&self) -> SimulationConfig {
        SimulationConfig {
            bonus_multiplier: self.bonus_multiplier,
            recognition_scale: self.recognition_scale,
            tie_break: self.tie_break,
        }
    }

    /// Stock table with the configured overrides applied. Region codes are
    /// uppercased.
    pub fn effective_units(&self) -> BTreeMap<String, u32> {
        let mut units = us_electoral_units();
        for (region, count) in &self.units {
            units.insert(region_code(region), *count);
        }
        units
    }
}

// ---------------------------------------------------------------------------
// Paths
// ---------------------------------------------------------------------------

/// `$VS_DATA_DIR`, else `~/.votecast`.
pub fn default_base_dir() -> PathBuf {
    if let Some(dir) = env::var_os("VS_DATA_DIR").filter(|d| !d.is_empty()) {
        return PathBuf::from(dir);
    }
    dirs_home().join(".votecast")
}

fn dirs_home() -> PathBuf {
    env::var("HOME")
        .or_else(|_| env::var("USERPROFILE"))
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("."))
}

pub fn cache_path(base_dir: &Path) -> PathBuf {
    base_dir.join(CACHE_FILE)
}

/// Explicit path, else `$VS_CONFIG`, else `<base_dir>/vs.toml`.
pub fn resolve_config_path(explicit: Option<&Path>, base_dir: &Path) -> PathBuf {
    pick_config_path(explicit, env::var_os("VS_CONFIG").map(PathBuf::from), base_dir)
}

fn pick_config_path(explicit: Option<&Path>, from_env: Option<PathBuf>, base_dir: &Path) -> PathBuf {
    explicit
        .map(Path::to_path_buf)
        .or(from_env.filter(|p| !p.as_os_str().is_empty()))
        .unwrap_or_else(|| base_dir.join(CONFIG_FILE))
}
