//! Plugin descriptor and user options.
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

use crate::builtins::{is_builtin, node_builtins};
use crate::module_cache::ModuleCache;
use crate::preload::rewriter::BRIDGE_MODULE;
use crate::preload::PreloadBundler;

/// Documentation for the plugin descriptor keys.
pub const DOC_URL: &str =
    "https://www.u.tools/docs/developer/config.html#基本配置";

/// Keys that must be present in the plugin descriptor.
pub const REQUIRED_KEYS: &[&str] = &[
    "name",
    "pluginName",
    "description",
    "author",
    "homepage",
    "version",
    "logo",
    "features",
];

/// Host plugin descriptor (`plugin.json`).
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PluginJson {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub plugin_name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub author: String,
    #[serde(default)]
    pub homepage: String,
    #[serde(default)]
    pub version: String,
    #[serde(default)]
    pub logo: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub main: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub preload: Option<String>,
    #[serde(default)]
    pub features: Value,
    /// Any other keys, written back unchanged.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl PluginJson {
    /// Parse a descriptor from JSON text.
    pub fn parse(content: &str) -> Result<Self> {
        Ok(serde_json::from_str(content)?)
    }

    /// Check that every required key has a value.
    pub fn validate(&self) -> Result<()> {
        for key in REQUIRED_KEYS {
            let present = match *key {
                "name" => !self.name.is_empty(),
                "pluginName" => !self.plugin_name.is_empty(),
                "description" => !self.description.is_empty(),
                "author" => !self.author.is_empty(),
                "homepage" => !self.homepage.is_empty(),
                "version" => !self.version.is_empty(),
                "logo" => !self.logo.is_empty(),
                "features" => is_truthy(&self.features),
                _ => true,
            };
            if !present {
                bail!("plugin {} is required, see: {}", key, DOC_URL);
            }
        }
        Ok(())
    }
}

fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(flag) => *flag,
        Value::String(s) => !s.is_empty(),
        Value::Number(n) => n.as_f64().map(|n| n != 0.0).unwrap_or(true),
        Value::Array(_) | Value::Object(_) => true,
    }
}

/// Options for the preload script.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct PreloadOptions {
    /// Rebuild the preload script on change.
    pub watch: bool,
    /// Global namespace for named exports, empty mounts on `window`.
    pub name: String,
    /// Minify the preload script.
    pub minify: bool,
}

impl Default for PreloadOptions {
    fn default() -> Self {
        Self {
            watch: true,
            name: String::from("preload"),
            minify: false,
        }
    }
}

/// User options.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct Options {
    /// Path to the plugin descriptor.
    pub plugin_file: PathBuf,
    /// Modules provided by the host at runtime.
    #[serde(deserialize_with = "one_or_many")]
    pub external: Vec<String>,
    /// Preload script options.
    pub preload: PreloadOptions,
    /// Do not write the declaration file.
    pub no_emit: bool,
    /// Output directory for the host descriptor and preload script.
    pub out_dir: PathBuf,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            plugin_file: PathBuf::from("plugin.json"),
            external: vec![String::from("utools-api-types")],
            preload: Default::default(),
            no_emit: false,
            out_dir: PathBuf::from("dist"),
        }
    }
}

impl Options {
    /// Load options from a JSON file.
    pub fn load<P: AsRef<Path>>(file: P) -> Result<Self> {
        let file = file.as_ref();
        let content = std::fs::read_to_string(file)
            .with_context(|| format!("unable to read {}", file.display()))?;
        serde_json::from_str(&content)
            .with_context(|| format!("invalid options in {}", file.display()))
    }
}

fn one_or_many<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum OneOrMany {
        One(String),
        Many(Vec<String>),
    }
    Ok(match OneOrMany::deserialize(deserializer)? {
        OneOrMany::One(id) => vec![id],
        OneOrMany::Many(ids) => ids,
    })
}

/// Options after the plugin descriptor has been loaded.
#[derive(Debug, Clone)]
pub struct ResolvedOptions {
    /// The user options.
    pub options: Options,
    /// Absolute path to the plugin descriptor.
    pub plugin_file: PathBuf,
    /// The loaded plugin descriptor.
    pub plugin: Arc<PluginJson>,
    /// Preload source resolved against the descriptor directory.
    pub preload_path: Option<PathBuf>,
}

impl ResolvedOptions {
    /// Global namespace name.
    pub fn global_name(&self) -> &str {
        &self.options.preload.name
    }

    /// Modules that are never bundled into the preload script.
    pub fn bundle_externals(&self) -> Vec<String> {
        let mut externals = node_builtins();
        externals.push(BRIDGE_MODULE.to_string());
        for id in self.options.external.iter() {
            if !is_builtin(id) && !externals.contains(id) {
                externals.push(id.clone());
            }
        }
        externals
    }

    /// Modules whose `require` calls are neutralized in the rewritten
    /// preload script. Node builtins stay loadable in the host.
    pub fn rewrite_externals(&self) -> Vec<String> {
        let mut externals = vec![BRIDGE_MODULE.to_string()];
        for id in self.options.external.iter() {
            if !is_builtin(id) && !externals.contains(id) {
                externals.push(id.clone());
            }
        }
        externals
    }

    /// Declaration file written next to the preload source, `None` when
    /// emission is disabled.
    pub fn declaration_file(&self) -> Option<PathBuf> {
        if self.options.no_emit {
            return None;
        }
        self.preload_path
            .as_ref()
            .map(|path| path.with_extension("d.ts"))
    }

    /// Bundler that rewrites the preload chunk for these options.
    pub fn preload_bundler(&self) -> PreloadBundler {
        let mut bundler =
            PreloadBundler::new(self.global_name(), self.rewrite_externals())
                .declaration_file(self.declaration_file());
        let stem = self
            .preload_path
            .as_ref()
            .and_then(|path| path.file_stem())
            .and_then(|stem| stem.to_str());
        if let Some(stem) = stem {
            bundler = bundler.preload_module(format!("./{}", stem));
        }
        bundler
    }

    /// The preload source path or an error when the descriptor has none.
    pub fn require_preload(&self) -> Result<&Path> {
        match &self.preload_path {
            Some(path) => {
                if !path.is_file() {
                    bail!("preload file {} does not exist", path.display());
                }
                Ok(path)
            }
            None => bail!(
                "plugin descriptor {} does not declare a preload file",
                self.plugin_file.display()
            ),
        }
    }
}

/// Resolves user options against the plugin descriptor.
pub struct OptionsResolver {
    cwd: PathBuf,
    cache: ModuleCache<PluginJson>,
}

impl OptionsResolver {
    /// Create a resolver for paths relative to `cwd`.
    pub fn new<P: AsRef<Path>>(cwd: P) -> Self {
        Self {
            cwd: cwd.as_ref().to_path_buf(),
            cache: ModuleCache::new(),
        }
    }

    fn absolute(&self, file: &Path) -> PathBuf {
        if file.is_absolute() {
            file.to_path_buf()
        } else {
            self.cwd.join(file)
        }
    }

    /// Load and validate a plugin descriptor, cached by path.
    pub fn plugin_json<P: AsRef<Path>>(&self, file: P) -> Result<Arc<PluginJson>> {
        let file = self.absolute(file.as_ref());
        if !file.is_file() {
            bail!("plugin file {} does not exist", file.display());
        }
        self.cache.get_or_load(&file, |path| {
            let content = std::fs::read_to_string(path)
                .with_context(|| format!("unable to read {}", path.display()))?;
            let plugin = PluginJson::parse(&content)
                .with_context(|| format!("invalid plugin file {}", path.display()))?;
            plugin.validate()?;
            Ok(plugin)
        })
    }

    /// Drop the cached descriptor so the next load reads the file.
    pub fn reload<P: AsRef<Path>>(&self, file: P) {
        self.cache.invalidate(self.absolute(file.as_ref()));
    }

    /// Resolve user options.
    pub fn resolve(&self, options: Options) -> Result<ResolvedOptions> {
        if options.plugin_file.as_os_str().is_empty() {
            bail!("a plugin file must be specified with pluginFile");
        }
        let plugin_file = self.absolute(&options.plugin_file);
        let plugin = self.plugin_json(&plugin_file)?;

        let preload_path = match &plugin.preload {
            Some(preload) if !preload.is_empty() => {
                let dir = plugin_file.parent().unwrap_or_else(|| Path::new("."));
                Some(dir.join(preload))
            }
            _ => {
                log::warn!("no preload file declared in {}", plugin_file.display());
                None
            }
        };

        Ok(ResolvedOptions {
            options,
            plugin_file,
            plugin,
            preload_path,
        })
    }
}
