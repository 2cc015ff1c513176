// ============================================================
// Layer 6 - Config Store
// ============================================================
// Reads and writes `PipelineConfig` as pretty-printed JSON.
//
// Which file?
//   $SMS_SPAM_CONFIG when set, otherwise ./pipeline.json
//
// A missing file is not an error: the run uses the defaults and
// says so in the log. A file that exists but does not parse is
// an error, so a typo never silently falls back to defaults.
//
// Reference: Rust Book §9 (Error Handling)
//            serde_json documentation

use anyhow::{Context, Result};
use std::{
    fs,
    path::{Path, PathBuf},
};

use crate::application::config::PipelineConfig;

/// Environment variable naming the config file
pub const CONFIG_ENV: &str = "SMS_SPAM_CONFIG";

/// Config file used when the variable is unset
pub const DEFAULT_CONFIG_FILE: &str = "pipeline.json";

pub struct ConfigStore {
    path: PathBuf,
}

impl ConfigStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Store at $SMS_SPAM_CONFIG, or `pipeline.json` in the working directory
    pub fn from_env() -> Self {
        let path = std::env::var(CONFIG_ENV).unwrap_or_else(|_| DEFAULT_CONFIG_FILE.to_string());
        Self::new(path)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the config, or the defaults when the file does not exist.
    pub fn load(&self) -> Result<PipelineConfig> {
        if !self.path.exists() {
            tracing::info!(
                "No config file at '{}', using defaults",
                self.path.display()
            );
            return Ok(PipelineConfig::default());
        }

        let json = fs::read_to_string(&self.path)
            .with_context(|| format!("Cannot read config from '{}'", self.path.display()))?;

        let cfg: PipelineConfig = serde_json::from_str(&json)
            .with_context(|| format!("Invalid config in '{}'", self.path.display()))?;

        tracing::info!("Loaded config from '{}'", self.path.display());
        Ok(cfg)
    }

    pub fn save(&self, cfg: &PipelineConfig) -> Result<()> {
        if let Some(dir) = self.path.parent().filter(|d| !d.as_os_str().is_empty()) {
            fs::create_dir_all(dir)
                .with_context(|| format!("Cannot create '{}'", dir.display()))?;
        }

        let json = serde_json::to_string_pretty(cfg)?;
        fs::write(&self.path, json)
            .with_context(|| format!("Cannot write config to '{}'", self.path.display()))?;

        tracing::debug!("Saved config to '{}'", self.path.display());
        Ok(())
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_missing_file_gives_defaults() {
        let dir   = TempDir::new().unwrap();
        let store = ConfigStore::new(dir.path().join("absent.json"));
        let cfg   = store.load().unwrap();
        assert_eq!(cfg.seed, PipelineConfig::default().seed);
    }

    #[test]
    fn test_save_then_load() {
        let dir   = TempDir::new().unwrap();
        let store = ConfigStore::new(dir.path().join("nested").join("pipeline.json"));

        let cfg = PipelineConfig {
            seed:       7,
            report_dir: Some("reports".to_string()),
            ..PipelineConfig::default()
        };
        store.save(&cfg).unwrap();

        let back = store.load().unwrap();
        assert_eq!(back.seed, 7);
        assert_eq!(back.report_dir.as_deref(), Some("reports"));
        assert_eq!(back.variants, cfg.variants);
        assert_eq!(back.stacking_final, cfg.stacking_final);
    }

    #[test]
    fn test_malformed_file_is_an_error() {
        let dir  = TempDir::new().unwrap();
        let path = dir.path().join("pipeline.json");
        fs::write(&path, "{ not json").unwrap();
        assert!(ConfigStore::new(path).load().is_err());
    }
}
