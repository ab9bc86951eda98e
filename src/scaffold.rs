//! Scaffold the mock module used while developing in a browser.
use std::path::{Path, PathBuf};

use anyhow::Result;
use indexmap::IndexMap;

use crate::config::MockConfig;
use crate::helpers::to_forward_slashes;
use crate::preload::{analyze_preload_file, Generator};

/// Result of a scaffold attempt.
#[derive(Debug, Clone, Eq, PartialEq)]
pub enum ScaffoldOutcome {
    /// The mock file already exists and was left untouched.
    Existing(PathBuf),
    /// The mock file was written.
    Created(PathBuf),
    /// Generating or writing the mock failed.
    Failed(String),
    /// Mocks are disabled by configuration.
    Disabled,
}

/// Path of the mock module for a preload source.
///
/// `preload.ts` becomes `preload.mock.ts`.
pub fn mock_path<P: AsRef<Path>>(preload: P) -> PathBuf {
    let preload = preload.as_ref();
    let stem = preload
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let name = match preload.extension() {
        Some(ext) => format!("{}.mock.{}", stem, ext.to_string_lossy()),
        None => format!("{}.mock", stem),
    };
    preload.with_file_name(name)
}

/// Writes the mock module for a preload source and redirects
/// module ids of the preload to the mock.
pub struct MockScaffolder {
    preload_path: PathBuf,
    mock_path: PathBuf,
    global_name: String,
    overrides: IndexMap<String, String>,
    enabled: bool,
}

impl MockScaffolder {
    /// Create a scaffolder for a preload source and global name.
    pub fn new<P: AsRef<Path>, S: Into<String>>(preload: P, global_name: S) -> Self {
        let preload_path = preload.as_ref().to_path_buf();
        Self {
            mock_path: mock_path(&preload_path),
            preload_path,
            global_name: global_name.into(),
            overrides: Default::default(),
            enabled: true,
        }
    }

    /// Apply the preload settings of a mock configuration.
    pub fn with_config(mut self, config: &MockConfig) -> Self {
        self.enabled = config.enabled && config.preload_api.enabled;
        if let Some(mount_name) = &config.preload_api.mount_name {
            self.global_name = mount_name.clone();
        }
        self.overrides = config.preload_api.overrides();
        self
    }

    /// Path of the mock module.
    pub fn mock_path(&self) -> &Path {
        &self.mock_path
    }

    /// Namespace the named exports are mounted under.
    pub fn global_name(&self) -> &str {
        &self.global_name
    }

    /// Render the mock module source.
    pub fn render(&self) -> Result<String> {
        let info = analyze_preload_file(&self.preload_path)?;
        for error in info.errors.iter() {
            log::warn!("{}: {}", self.preload_path.display(), error);
        }

        let file_name = self
            .mock_path
            .file_name()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        let types_module = self
            .preload_path
            .file_stem()
            .map(|s| format!("./{}.d", s.to_string_lossy()))
            .unwrap_or_else(|| String::from("./preload.d"));

        Ok(Generator::new(&self.global_name, &info)
            .types_module(types_module)
            .mock_file_name(file_name)
            .overrides(self.overrides.clone())
            .generate())
    }

    /// Write the mock module unless it already exists.
    ///
    /// Failures are logged and reported in the outcome, they never
    /// stop the caller.
    pub fn scaffold(&self) -> ScaffoldOutcome {
        if !self.enabled {
            return ScaffoldOutcome::Disabled;
        }
        if self.mock_path.exists() {
            log::debug!("mock {} exists", self.mock_path.display());
            return ScaffoldOutcome::Existing(self.mock_path.clone());
        }

        let result = self.render().and_then(|code| {
            std::fs::write(&self.mock_path, code)?;
            Ok(())
        });
        match result {
            Ok(_) => {
                log::info!("scaffolded {}", self.mock_path.display());
                ScaffoldOutcome::Created(self.mock_path.clone())
            }
            Err(e) => {
                let message = format!("failed to scaffold mock file: {:#}", e);
                log::warn!("{}", message);
                ScaffoldOutcome::Failed(message)
            }
        }
    }

    /// Redirect a module id of the preload source to the mock.
    ///
    /// The id matches when it names the preload path, with or without
    /// its extension, or ends with the preload's parent directory and
    /// file name.
    pub fn resolve_id(&self, id: &str) -> Option<&Path> {
        if !self.enabled {
            return None;
        }
        let id = to_forward_slashes(id.split('?').next().unwrap_or(id));
        let full = to_forward_slashes(&self.preload_path.to_string_lossy());
        let bare = to_forward_slashes(
            &self.preload_path.with_extension("").to_string_lossy(),
        );
        if id == full || id == bare {
            return Some(&self.mock_path);
        }

        let file_name = self.preload_path.file_name()?.to_str()?;
        let stem = self.preload_path.file_stem()?.to_str()?;
        let parent = self
            .preload_path
            .parent()
            .and_then(|dir| dir.file_name())
            .and_then(|dir| dir.to_str())?;
        let matched = [file_name, stem]
            .iter()
            .any(|name| id.ends_with(&format!("/{}/{}", parent, name)));
        if matched {
            Some(&self.mock_path)
        } else {
            None
        }
    }

    /// Script tag that mounts the mock namespaces on `window`.
    ///
    /// The mock is imported relative to the server `root` with the
    /// public `base` path prepended.
    pub fn bootstrap_html<P: AsRef<Path>>(&self, root: P, base: &str) -> String {
        let relative = self
            .mock_path
            .strip_prefix(root.as_ref())
            .unwrap_or(&self.mock_path);
        let relative = to_forward_slashes(&relative.to_string_lossy());
        let base = base.trim_end_matches('/');
        let src = format!("{}/{}", base, relative.trim_start_matches('/'));

        let mut script = String::new();
        script.push_str("<script type=\"module\">\n");
        script.push_str(&format!("import mocked from '{}';\n", src));
        script.push_str("const windowMocks = mocked.window;\n");
        script.push_str("if (typeof windowMocks === 'object' && windowMocks !== null) {\n");
        script.push_str("  Object.assign(window, windowMocks);\n");
        script.push_str("}\n");
        if !self.global_name.is_empty() {
            script.push_str(&format!(
                "window['{0}'] = mocked['{0}'];\n",
                self.global_name
            ));
        }
        script.push_str("console.log('[Mock Preload] mocks mounted on window.');\n");
        script.push_str("</script>");
        script
    }
}
