//! Write the plugin descriptor consumed by the host application.
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use regex::Regex;
use serde_json::{json, Value};

use crate::options::PluginJson;
use crate::preload::bundle::PRELOAD_FILE_NAME;

/// Descriptor file name.
pub const PLUGIN_FILE_NAME: &str = "plugin.json";

const SSR_MODE: &str = "SSR bundle";
const SSR_MODE_LABEL: &str = "uTools bundle";

/// Extract the local URL from a dev server log line.
///
/// The line may contain ANSI colour sequences, the URL is the text
/// after the last `": "`.
pub fn local_url(line: &str) -> String {
    let plain = strip_ansi(line);
    plain
        .rsplit(": ")
        .next()
        .map(|url| url.trim().to_string())
        .unwrap_or_default()
}

fn strip_ansi(line: &str) -> String {
    match Regex::new(r"\x1b\[[0-9;]*[A-Za-z]") {
        Ok(re) => re.replace_all(line, "").replace('\u{1b}', ""),
        Err(_) => line.replace('\u{1b}', ""),
    }
}

/// Descriptor JSON with the preload script and development URL.
pub fn descriptor_value(plugin: &PluginJson, local_url: Option<&str>) -> Result<Value> {
    let mut value = serde_json::to_value(plugin)?;
    if let Value::Object(map) = &mut value {
        map.insert("preload".to_string(), json!(PRELOAD_FILE_NAME));
        let development = match local_url {
            Some(url) => json!({ "main": url }),
            None => json!({}),
        };
        map.insert("development".to_string(), development);
    }
    Ok(value)
}

/// Write `plugin.json` into the output directory.
pub fn write_plugin_json<P: AsRef<Path>>(
    plugin: &PluginJson,
    out_dir: P,
    local_url: Option<&str>,
) -> Result<PathBuf> {
    let out_dir = out_dir.as_ref();
    std::fs::create_dir_all(out_dir)
        .with_context(|| format!("unable to create {}", out_dir.display()))?;
    let file = out_dir.join(PLUGIN_FILE_NAME);
    let content = serde_json::to_string_pretty(&descriptor_value(plugin, local_url)?)?;
    std::fs::write(&file, content)
        .with_context(|| format!("unable to write {}", file.display()))?;
    log::debug!("wrote {}", file.display());
    Ok(file)
}

/// Watches dev server log lines and writes the descriptor once the
/// local URL is known.
pub struct DescriptorWriter<'a> {
    plugin: &'a PluginJson,
    out_dir: PathBuf,
    local_url: Option<String>,
}

impl<'a> DescriptorWriter<'a> {
    /// Create a writer for an output directory.
    pub fn new<P: AsRef<Path>>(plugin: &'a PluginJson, out_dir: P) -> Self {
        Self {
            plugin,
            out_dir: out_dir.as_ref().to_path_buf(),
            local_url: None,
        }
    }

    /// The local URL seen so far.
    pub fn local_url(&self) -> Option<&str> {
        self.local_url.as_deref()
    }

    /// Inspect a log line, returns the line to print.
    pub fn observe(&mut self, line: &str) -> Result<String> {
        if line.contains("Local") {
            self.local_url = Some(local_url(line));
            self.write()?;
        }
        Ok(line.replace(SSR_MODE, SSR_MODE_LABEL))
    }

    /// Write the descriptor with the current local URL.
    pub fn write(&self) -> Result<PathBuf> {
        write_plugin_json(self.plugin, &self.out_dir, self.local_url.as_deref())
    }
}
