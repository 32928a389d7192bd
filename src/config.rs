use std::collections::HashMap;
use std::path::Path;

use anyhow::{Context, Result};
use log::warn;
use serde::Deserialize;

use crate::i18n::Catalog;
use crate::models::CoverageTarget;
use crate::report::{ComplexityRule, InstructionRate};

pub const CONFIG_FILE: &str = "tapcheck.toml";

#[derive(Debug, Default, Deserialize)]
pub struct Config {
    /// Language used for coverage target names when `--lang` is not given.
    pub language: Option<String>,
    #[serde(default)]
    pub jacoco: JacocoConfig,
    #[serde(default)]
    pub cobertura: CoberturaConfig,
    /// Extra or overriding phrase catalogs, keyed by language code.
    #[serde(default)]
    pub i18n: HashMap<String, Catalog>,
}

#[derive(Debug, Default, Deserialize)]
pub struct JacocoConfig {
    #[serde(default)]
    pub complexity: ComplexityRule,
}

#[derive(Debug, Default, Deserialize)]
pub struct CoberturaConfig {
    /// Rate that `instruction` conditions are compared against.
    #[serde(default)]
    pub instruction_rate: InstructionRate,
}

impl Config {
    /// Load `tapcheck.toml` from `dir`, falling back to defaults if absent or invalid.
    pub fn load(dir: &Path) -> Self {
        let path = dir.join(CONFIG_FILE);
        let Ok(content) = std::fs::read_to_string(&path) else {
            return Self::default();
        };
        toml::from_str(&content).unwrap_or_else(|e| {
            warn!("ignoring invalid {}: {}", path.display(), e);
            Self::default()
        })
    }

    pub fn language(&self) -> &str {
        self.language.as_deref().unwrap_or("en")
    }
}

/// Load the coverage target list (a YAML sequence).
pub fn load_targets(path: &Path) -> Result<Vec<CoverageTarget>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read targets from {}", path.display()))?;
    serde_yaml::from_str(&content)
        .with_context(|| format!("failed to parse targets in {}", path.display()))
}

/// Load a test-name mapping (a YAML mapping of name to display name).
/// A missing or unusable file yields an empty mapping.
pub fn load_mappings(path: Option<&Path>) -> HashMap<String, String> {
    let Some(path) = path else {
        return HashMap::new();
    };
    let parsed = std::fs::read_to_string(path)
        .context("failed to read mappings")
        .and_then(|content| {
            serde_yaml::from_str::<serde_yaml::Mapping>(&content)
                .context("failed to parse mappings")
        });
    match parsed {
        Ok(mapping) => mapping
            .into_iter()
            .filter_map(|(k, v)| Some((scalar(k)?, scalar(v)?)))
            .collect(),
        Err(e) => {
            warn!("{}: {:#}", path.display(), e);
            HashMap::new()
        }
    }
}

fn scalar(value: serde_yaml::Value) -> Option<String> {
    match value {
        serde_yaml::Value::String(s) => Some(s),
        serde_yaml::Value::Number(n) => Some(n.to_string()),
        serde_yaml::Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}
