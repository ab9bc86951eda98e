//! Optional user configuration for generated mocks.
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

use crate::merge::Merge;
use crate::module_cache::ModuleCache;

pub mod evaluator;
pub mod resolver;

pub use evaluator::ConfigModuleLoader;
pub use resolver::ConfigResolver;

/// Configuration files searched for in order.
pub const CONFIG_FILES: &[&str] = &[
    "utools.mock.json",
    "utools/utools.mock.ts",
    "utools.mock.ts",
    "utools.mock.mjs",
    "utools.mock.js",
    "utools/_mock/index.ts",
];

/// Settings for the preload mock.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct PreloadApiConfig {
    /// Generate and mount the preload mock.
    pub enabled: bool,
    /// Namespace overriding the configured global name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mount_name: Option<String>,
    /// Source text of custom implementations keyed by export name.
    pub custom_methods: IndexMap<String, Value>,
}

impl Default for PreloadApiConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            mount_name: None,
            custom_methods: Default::default(),
        }
    }
}

impl PreloadApiConfig {
    /// Custom implementations that are written as source text.
    pub fn overrides(&self) -> IndexMap<String, String> {
        self.custom_methods
            .iter()
            .filter_map(|(name, value)| match value {
                Value::String(source) => Some((name.clone(), source.clone())),
                _ => None,
            })
            .collect()
    }
}

/// Mock configuration.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct MockConfig {
    /// Enable mocks.
    pub enabled: bool,
    /// Show the development indicator.
    pub show_dev_indicator: bool,
    /// Styles for the development indicator.
    pub dev_indicator_styles: String,
    /// Custom mocks keyed by name.
    pub custom_mocks: Map<String, Value>,
    /// Mock data, replaced wholesale by user configuration.
    pub mock_data: Value,
    /// Host API mock settings.
    pub utools_api: Value,
    /// Preload mock settings.
    pub preload_api: PreloadApiConfig,
}

impl Default for MockConfig {
    fn default() -> Self {
        let defaults = default_config();
        serde_json::from_value(defaults).unwrap_or(MockConfig {
            enabled: true,
            show_dev_indicator: true,
            dev_indicator_styles: String::new(),
            custom_mocks: Map::new(),
            mock_data: json!({}),
            utools_api: json!({}),
            preload_api: Default::default(),
        })
    }
}

/// Default configuration as a JSON object.
pub fn default_config() -> Value {
    json!({
        "enabled": true,
        "showDevIndicator": true,
        "devIndicatorStyles": "",
        "customMocks": {},
        "mockData": {},
        "utoolsApi": {
            "enabled": true,
            "customMethods": {},
            "dbStorage": {
                "prefix": "utools_mock_",
                "initialData": {}
            }
        },
        "preloadApi": {
            "enabled": true,
            "customMethods": {}
        }
    })
}

/// Merge user configuration over defaults.
///
/// Objects are merged one level deep except `mockData` which is
/// always taken from the user configuration when present.
pub fn merge_config(defaults: &Value, user: &Value) -> Value {
    let mut merged = match defaults {
        Value::Object(map) => map.clone(),
        _ => Map::new(),
    };
    if let Value::Object(user) = user {
        let user = user
            .iter()
            .filter(|(_, v)| !v.is_null())
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect::<Map<String, Value>>();
        merged.merge(&user);
        if let Some(mock_data) = user.get("mockData") {
            merged.insert("mockData".to_string(), mock_data.clone());
        }
    }
    Value::Object(merged)
}

/// Finds, loads and merges the user mock configuration.
pub struct MockConfigManager<'a> {
    project_root: PathBuf,
    cache: &'a ModuleCache<Value>,
    user_config: Option<(PathBuf, Value)>,
}

impl<'a> MockConfigManager<'a> {
    /// Create a manager for a project directory.
    pub fn new<P: AsRef<Path>>(project_root: P, cache: &'a ModuleCache<Value>) -> Self {
        Self {
            project_root: project_root.as_ref().to_path_buf(),
            cache,
            user_config: None,
        }
    }

    /// Load the first configuration file that exists and loads.
    ///
    /// Files that fail to load are logged and skipped.
    pub fn load_user_config(&mut self) -> Option<&(PathBuf, Value)> {
        for name in CONFIG_FILES {
            let path = self.project_root.join(name);
            log::debug!("looking for mock config {}", path.display());
            if !path.is_file() {
                continue;
            }
            match self.load_config_file(&path) {
                Ok(value) => {
                    log::info!("loaded mock config {}", name);
                    self.user_config = Some((path, value));
                    return self.user_config.as_ref();
                }
                Err(e) => log::warn!("failed to load mock config {}: {:#}", name, e),
            }
        }
        log::debug!("no mock config found, using defaults");
        None
    }

    /// Load a configuration file by extension.
    pub fn load_config_file(&self, path: &Path) -> Result<Value> {
        let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("");
        match ext {
            "json" => {
                let content = std::fs::read_to_string(path)
                    .with_context(|| format!("unable to read {}", path.display()))?;
                serde_json::from_str(&content)
                    .with_context(|| format!("invalid json in {}", path.display()))
            }
            "ts" | "js" | "mjs" | "cjs" => ConfigModuleLoader::new(self.cache)
                .load(path)
                .with_context(|| format!("unable to evaluate {}", path.display())),
            _ => bail!("unsupported config file format {}", path.display()),
        }
    }

    /// Merged configuration, loading the user configuration if needed.
    pub fn config(&mut self) -> Result<MockConfig> {
        if self.user_config.is_none() {
            self.load_user_config();
        }
        let user = self
            .user_config
            .as_ref()
            .map(|(_, value)| value.clone())
            .unwrap_or(Value::Null);
        let merged = merge_config(&default_config(), &user);
        serde_json::from_value(merged).context("invalid mock config")
    }

    /// Drop loaded configuration so the next call reads the files again.
    pub fn reload(&mut self) -> Result<MockConfig> {
        self.user_config = None;
        self.cache.clear();
        self.config()
    }

    /// Write a configuration template into the project directory.
    pub fn write_template(&self, file_name: &str) -> Result<PathBuf> {
        let path = self.project_root.join(file_name);
        if path.exists() {
            bail!("{} already exists", path.display());
        }
        std::fs::write(&path, CONFIG_TEMPLATE)
            .with_context(|| format!("unable to write {}", path.display()))?;
        log::info!("wrote mock config template {}", path.display());
        Ok(path)
    }
}

/// Template for a new mock configuration module.
pub const CONFIG_TEMPLATE: &str = r#"// Mock configuration for the preload bridge.

const config = {
  // Enable mocks during development
  enabled: true,

  // Show the development indicator
  showDevIndicator: true,

  // Mock data available to custom mocks
  mockData: {},

  // Preload mock settings
  preloadApi: {
    enabled: true,

    // Replace generated stubs, keyed by export name
    customMethods: {
      // hello: (name: string) => `[Custom Mock] hello ${name}`,
    },
  },
};

export default config;
"#;
