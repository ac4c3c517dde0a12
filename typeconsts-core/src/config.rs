//! Configuration loading from typeconsts.toml.

use crate::constraint::BuildContext;
use anyhow::{Context, Result};
use serde::Deserialize;
use std::{fs, path::Path};

/// Name of the configuration file looked up in the package directory.
pub const CONFIG_FILE: &str = "typeconsts.toml";

/// Main configuration structure for typeconsts.toml.
#[derive(Debug, Deserialize, Default, Clone, PartialEq)]
pub struct TypeconstsConfig {
    /// Whether `_test.go` files are loaded.
    pub include_tests: Option<bool>,
    /// File names to leave out of the package.
    pub exclude: Option<Vec<String>>,
    /// Target OS for build constraints (defaults to the host).
    pub goos: Option<String>,
    /// Target architecture for build constraints (defaults to the host).
    pub goarch: Option<String>,
    /// Output configuration.
    pub output: Option<OutputConfig>,
}

/// Output format configuration.
#[derive(Debug, Deserialize, Default, Clone, PartialEq)]
pub struct OutputConfig {
    /// Output format: "plain" or "json".
    pub format: Option<String>,
}

impl TypeconstsConfig {
    /// Build context from `goos`/`goarch`, each falling back to the host.
    pub fn build_context(&self) -> BuildContext {
        let host = BuildContext::default();
        BuildContext::new(
            self.goos.clone().unwrap_or(host.goos),
            self.goarch.clone().unwrap_or(host.goarch),
        )
    }

    /// Whether the configured output format is JSON.
    pub fn wants_json(&self) -> bool {
        self.output
            .as_ref()
            .and_then(|o| o.format.as_deref())
            .is_some_and(|f| f.eq_ignore_ascii_case("json"))
    }
}

/// Loads configuration from typeconsts.toml if it exists.
pub fn load_config(dir: &Path) -> Result<Option<TypeconstsConfig>> {
    let path = dir.join(CONFIG_FILE);
    if !path.exists() {
        return Ok(None);
    }

    let content = fs::read_to_string(&path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let cfg = toml::from_str(&content).context("Invalid typeconsts.toml")?;
    Ok(Some(cfg))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_full_config() {
        let cfg: TypeconstsConfig = toml::from_str(
            "include_tests = true\nexclude = [\"zz_generated.go\"]\n[output]\nformat = \"JSON\"\n",
        )
        .unwrap();
        assert_eq!(cfg.include_tests, Some(true));
        assert_eq!(cfg.exclude.as_deref(), Some(&["zz_generated.go".to_string()][..]));
        assert!(cfg.wants_json());
    }

    #[test]
    fn test_target_overrides_host() {
        let cfg: TypeconstsConfig = toml::from_str("goos = \"windows\"\n").unwrap();
        let ctx = cfg.build_context();
        assert_eq!(ctx.goos, "windows");
        assert_eq!(ctx.goarch, BuildContext::default().goarch);
    }

    #[test]
    fn test_empty_config() {
        let cfg: TypeconstsConfig = toml::from_str("").unwrap();
        assert_eq!(cfg, TypeconstsConfig::default());
        assert!(!cfg.wants_json());
    }

    #[test]
    fn test_missing_file_is_none() {
        let dir = std::env::temp_dir().join("typeconsts_config_missing_dir");
        assert!(load_config(&dir).unwrap().is_none());
    }
}
