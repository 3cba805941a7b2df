//! Configuration system for ProductCompare.
//!
//! Uses `figment` for layered configuration: defaults -> config file -> environment -> overrides.
//! Configuration is loaded from `~/.config/prodcompare/config.toml` and/or
//! `.prodcompare/config.toml` in the workspace directory.

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::ConfigError;
use crate::types::{MAX_COMPARED_PRODUCTS, PLACEHOLDER_IMAGE};

/// Top-level configuration for ProductCompare.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CompareConfig {
    #[serde(default)]
    pub rules: RulesConfig,
    #[serde(default)]
    pub selection: SelectionConfig,
    #[serde(default)]
    pub catalog: CatalogConfig,
    #[serde(default)]
    pub storage: StorageConfig,
}

impl CompareConfig {
    /// Reject configurations the engine cannot work with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.selection.max_items == 0 || self.selection.max_items > MAX_COMPARED_PRODUCTS {
            return Err(ConfigError::Invalid {
                message: format!(
                    "selection.max_items must be within 1..={MAX_COMPARED_PRODUCTS}, got {}",
                    self.selection.max_items
                ),
            });
        }
        if self.catalog.default_price_max < self.catalog.default_price_min {
            return Err(ConfigError::Invalid {
                message: "catalog.default_price_max is below catalog.default_price_min".into(),
            });
        }
        let blank = self
            .rules
            .higher_is_better
            .iter()
            .chain(&self.rules.lower_is_better)
            .chain(self.rules.keywords.iter().flat_map(|(_, words)| words.iter()))
            .any(|label| label.trim().is_empty());
        if blank {
            return Err(ConfigError::Invalid {
                message: "rule labels and keywords must not be blank".into(),
            });
        }
        Ok(())
    }
}

/// Attribute directionality lists and category keywords used for ranking.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RulesConfig {
    /// Attribute names where a larger value wins.
    pub higher_is_better: Vec<String>,
    /// Attribute names where a smaller value wins.
    pub lower_is_better: Vec<String>,
    /// Label keywords selecting the extraction pattern for each category.
    #[serde(default)]
    pub keywords: CategoryKeywords,
}

impl Default for RulesConfig {
    fn default() -> Self {
        Self {
            higher_is_better: [
                "Оперативная память",
                "Встроенная память",
                "Камера",
                "Батарея",
                "Время работы",
                "Быстрая зарядка",
                "Диагональ экрана",
                "Частотный диапазон",
                "Рейтинг",
            ]
            .into_iter()
            .map(String::from)
            .collect(),
            lower_is_better: ["Вес", "Цена"].into_iter().map(String::from).collect(),
            keywords: CategoryKeywords::default(),
        }
    }
}

/// Label keywords per extraction category. A label selects a category when it
/// contains any of that category's keywords, ignoring case.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CategoryKeywords {
    pub memory: Vec<String>,
    pub camera: Vec<String>,
    pub battery: Vec<String>,
    pub time: Vec<String>,
    pub weight: Vec<String>,
    pub screen: Vec<String>,
    pub frequency: Vec<String>,
    pub charging: Vec<String>,
    pub rating: Vec<String>,
}

impl CategoryKeywords {
    /// Keyword lists paired with their category name, in matching priority order.
    pub fn iter(&self) -> impl Iterator<Item = (&'static str, &Vec<String>)> {
        [
            ("memory", &self.memory),
            ("camera", &self.camera),
            ("battery", &self.battery),
            ("time", &self.time),
            ("weight", &self.weight),
            ("screen", &self.screen),
            ("frequency", &self.frequency),
            ("charging", &self.charging),
            ("rating", &self.rating),
        ]
        .into_iter()
    }
}

impl Default for CategoryKeywords {
    fn default() -> Self {
        fn words(list: &[&str]) -> Vec<String> {
            list.iter().map(|w| w.to_string()).collect()
        }
        Self {
            memory: words(&["память"]),
            camera: words(&["камера"]),
            battery: words(&["батарея"]),
            time: words(&["время"]),
            weight: words(&["вес"]),
            screen: words(&["экрана"]),
            frequency: words(&["частотный"]),
            charging: words(&["зарядка"]),
            rating: words(&["рейтинг"]),
        }
    }
}

/// Configuration for the persisted comparison selection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SelectionConfig {
    /// Maximum number of selected products; the oldest is evicted beyond it.
    pub max_items: usize,
}

impl Default for SelectionConfig {
    fn default() -> Self {
        Self {
            max_items: MAX_COMPARED_PRODUCTS,
        }
    }
}

/// Catalog defaults.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogConfig {
    /// Image substituted for products created without images.
    pub placeholder_image: String,
    /// Lower bound of the default price filter.
    pub default_price_min: f64,
    /// Upper bound of the default price filter.
    pub default_price_max: f64,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            placeholder_image: PLACEHOLDER_IMAGE.to_string(),
            default_price_min: 0.0,
            default_price_max: 200_000.0,
        }
    }
}

/// Where the JSON-directory key-value store keeps its files.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Storage directory; defaults to the platform data dir when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_dir: Option<PathBuf>,
}

impl StorageConfig {
    /// Resolve the storage directory, falling back to `<workspace>/.prodcompare/data`.
    pub fn resolve_data_dir(&self, workspace: &Path) -> PathBuf {
        if let Some(dir) = &self.data_dir {
            return dir.clone();
        }
        directories::ProjectDirs::from("dev", "prodcompare", "prodcompare")
            .map(|d| d.data_dir().join("store"))
            .unwrap_or_else(|| workspace.join(".prodcompare").join("data"))
    }
}

/// Location of the workspace-local configuration file.
pub fn workspace_config_path(workspace: &Path) -> PathBuf {
    workspace.join(".prodcompare").join("config.toml")
}

/// Load configuration from layered sources.
///
/// Priority (highest to lowest):
/// 1. Explicit overrides (passed as argument)
/// 2. Environment variables (prefixed with `PRODCOMPARE_`)
/// 3. Explicit config file, when given (must exist)
/// 4. Workspace-local config (`.prodcompare/config.toml`)
/// 5. User config (`~/.config/prodcompare/config.toml`)
/// 6. Built-in defaults
pub fn load_config(
    workspace: Option<&Path>,
    config_file: Option<&Path>,
    overrides: Option<&CompareConfig>,
) -> Result<CompareConfig, ConfigError> {
    let mut figment = Figment::from(Serialized::defaults(CompareConfig::default()));

    // User-level config
    if let Some(config_dir) = directories::ProjectDirs::from("dev", "prodcompare", "prodcompare") {
        let user_config = config_dir.config_dir().join("config.toml");
        if user_config.exists() {
            figment = figment.merge(Toml::file(&user_config));
        }
    }

    // Workspace-level config
    if let Some(ws) = workspace {
        let ws_config = workspace_config_path(ws);
        if ws_config.exists() {
            figment = figment.merge(Toml::file(&ws_config));
        }
    }

    if let Some(path) = config_file {
        if !path.exists() {
            return Err(ConfigError::FileNotFound {
                path: path.to_path_buf(),
            });
        }
        figment = figment.merge(Toml::file(path));
    }

    // Environment variables (PRODCOMPARE_SELECTION__MAX_ITEMS, etc.)
    figment = figment.merge(Env::prefixed("PRODCOMPARE_").split("__"));

    if let Some(overrides) = overrides {
        figment = figment.merge(Serialized::defaults(overrides));
    }

    let config: CompareConfig = figment.extract().map_err(|e| ConfigError::ParseError {
        message: e.to_string(),
    })?;
    config.validate()?;
    Ok(config)
}

/// Check whether any ProductCompare configuration file exists.
pub fn config_exists(workspace: Option<&Path>) -> bool {
    if let Some(config_dir) = directories::ProjectDirs::from("dev", "prodcompare", "prodcompare") {
        if config_dir.config_dir().join("config.toml").exists() {
            return true;
        }
    }
    if let Some(ws) = workspace {
        if workspace_config_path(ws).exists() {
            return true;
        }
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = CompareConfig::default();
        assert_eq!(config.selection.max_items, 4);
        assert_eq!(config.rules.lower_is_better, vec!["Вес", "Цена"]);
        assert_eq!(config.rules.higher_is_better.len(), 9);
        assert_eq!(config.catalog.default_price_max, 200_000.0);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_keyword_priority_order() {
        let keywords = CategoryKeywords::default();
        let order: Vec<&str> = keywords.iter().map(|(name, _)| name).collect();
        assert_eq!(
            order,
            vec![
                "memory",
                "camera",
                "battery",
                "time",
                "weight",
                "screen",
                "frequency",
                "charging",
                "rating"
            ]
        );
    }

    #[test]
    fn test_config_serialization_roundtrip() {
        let config = CompareConfig::default();
        let toml_str = toml::to_string(&config).unwrap();
        let deserialized: CompareConfig = toml::from_str(&toml_str).unwrap();
        assert_eq!(
            deserialized.rules.higher_is_better,
            config.rules.higher_is_better
        );
        assert_eq!(deserialized.rules.keywords.memory, vec!["память"]);
        assert_eq!(deserialized.selection.max_items, config.selection.max_items);
    }

    #[test]
    fn test_validate_rejects_zero_selection() {
        let mut config = CompareConfig::default();
        config.selection.max_items = 0;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::Invalid { .. })
        ));
    }

    #[test]
    fn test_validate_rejects_blank_keyword() {
        let mut config = CompareConfig::default();
        config.rules.keywords.camera.push("  ".into());
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_load_config_with_overrides() {
        let dir = tempfile::tempdir().unwrap();
        let mut overrides = CompareConfig::default();
        overrides.selection.max_items = 3;

        let config = load_config(Some(dir.path()), None, Some(&overrides)).unwrap();
        assert_eq!(config.selection.max_items, 3);
    }

    #[test]
    fn test_load_config_from_workspace() {
        let dir = tempfile::tempdir().unwrap();
        let config_dir = dir.path().join(".prodcompare");
        std::fs::create_dir_all(&config_dir).unwrap();
        std::fs::write(
            config_dir.join("config.toml"),
            r#"
[rules]
higher_is_better = ["Рейтинг", "Мощность"]
lower_is_better = ["Цена"]

[selection]
max_items = 2
"#,
        )
        .unwrap();

        let config = load_config(Some(dir.path()), None, None).unwrap();
        assert_eq!(config.rules.higher_is_better, vec!["Рейтинг", "Мощность"]);
        assert_eq!(config.selection.max_items, 2);
        // Keywords were not overridden.
        assert_eq!(config.rules.keywords.weight, vec!["вес"]);
        assert!(config_exists(Some(dir.path())));
    }

    #[test]
    fn test_load_config_missing_explicit_file() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope.toml");
        let err = load_config(None, Some(&missing), None).unwrap_err();
        assert!(matches!(err, ConfigError::FileNotFound { .. }));
    }

    #[test]
    fn test_resolve_data_dir_prefers_explicit() {
        let storage = StorageConfig {
            data_dir: Some(PathBuf::from("/tmp/pc-store")),
        };
        assert_eq!(
            storage.resolve_data_dir(Path::new(".")),
            PathBuf::from("/tmp/pc-store")
        );
    }
}
