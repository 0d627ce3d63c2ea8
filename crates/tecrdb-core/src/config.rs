use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Root application configuration, loaded from `~/.config/tecrdb/config.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub merge: MergeConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MergeConfig {
    /// Surface every candidate rejection as a warning, not only in the report.
    pub verbose: bool,
    pub output_dir: String,
    pub merged_file_name: String,
    /// Upper bound on charge-notation rewrites applied to one reaction.
    pub max_charge_rewrites: usize,
}

impl Default for MergeConfig {
    fn default() -> Self {
        Self {
            verbose: false,
            output_dir: "TECRDB".to_string(),
            merged_file_name: "merged_TECRDB.csv".to_string(),
            max_charge_rewrites: 64,
        }
    }
}

// ─── Load / Save ───────────────────────────────────────────

impl AppConfig {
    /// Standard config file path: `~/.config/tecrdb/config.toml`
    pub fn config_path() -> PathBuf {
        if let Ok(path) = std::env::var("TECRDB_CONFIG") {
            return PathBuf::from(path);
        }

        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("~/.config"))
            .join("tecrdb")
            .join("config.toml")
    }

    /// Load config from disk, falling back to defaults if file doesn't exist.
    pub fn load() -> Result<Self> {
        let path = Self::config_path();
        Self::load_from(&path)
    }

    /// Load config from a specific path.
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let contents = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&contents)?;
        Ok(config)
    }

    /// Save config to a specific path.
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let toml_str = toml::to_string_pretty(self)?;
        std::fs::write(path, toml_str)?;
        Ok(())
    }

    // ─── Derived paths ─────────────────────────────────────

    /// Path of the merged master table.
    pub fn merged_path(&self) -> PathBuf {
        PathBuf::from(&self.merge.output_dir).join(&self.merge.merged_file_name)
    }

    /// Path of the unmatched-datum diagnostics for one source.
    pub fn unmatched_path(&self, source: crate::SourceKind) -> PathBuf {
        PathBuf::from(&self.merge.output_dir).join(format!("unmatched_{source}_TECRDB_datums.json"))
    }

    /// Path of the full pass report for one source.
    pub fn report_path(&self, source: crate::SourceKind) -> PathBuf {
        PathBuf::from(&self.merge.output_dir).join(format!("merge_report_{source}.json"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::SourceKind;
    use tempfile::TempDir;

    #[test]
    fn test_default_config_is_valid() {
        let cfg = AppConfig::default();
        assert!(!cfg.merge.verbose);
        assert_eq!(cfg.merge.output_dir, "TECRDB");
        assert_eq!(cfg.merge.max_charge_rewrites, 64);
    }

    #[test]
    fn test_config_toml_roundtrip() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");

        let mut cfg = AppConfig::default();
        cfg.merge.verbose = true;
        cfg.save_to(&path).unwrap();

        let loaded = AppConfig::load_from(&path).unwrap();
        assert!(loaded.merge.verbose);
        assert_eq!(loaded.merge.merged_file_name, cfg.merge.merged_file_name);
    }

    #[test]
    fn test_partial_config_uses_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[merge]\noutput_dir = \"out\"\n").unwrap();

        let loaded = AppConfig::load_from(&path).unwrap();
        assert_eq!(loaded.merge.output_dir, "out");
        assert_eq!(loaded.merge.merged_file_name, "merged_TECRDB.csv");
    }

    #[test]
    fn test_load_nonexistent_returns_default() {
        let cfg = AppConfig::load_from(Path::new("/tmp/nonexistent_tecrdb_config.toml")).unwrap();
        assert_eq!(cfg.merge.output_dir, "TECRDB");
    }

    #[test]
    fn test_derived_paths() {
        let cfg = AppConfig::default();
        assert!(cfg.merged_path().ends_with("merged_TECRDB.csv"));
        assert!(
            cfg.unmatched_path(SourceKind::Noor)
                .to_string_lossy()
                .contains("unmatched_noor_TECRDB_datums.json")
        );
    }
}
