//! Replace the compiled preload chunk of a bundle with the rewritten
//! preload script.
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use super::declarations::DeclarationOptions;
use super::rewriter::{RewriteOptions, Rewriter};

/// File name of the preload chunk and of the emitted script.
pub const PRELOAD_FILE_NAME: &str = "preload.js";

/// Compiled chunk produced by the bundler.
#[derive(Serialize, Deserialize, Debug, Clone, Default)]
pub struct OutputChunk {
    /// Compiled commonjs code.
    pub code: String,
    /// Export names of the chunk.
    #[serde(default)]
    pub exports: Vec<String>,
}

/// Bundle output keyed by file name.
pub type Bundle = IndexMap<String, OutputChunk>;

/// Asset emitted in place of the preload chunk.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct EmittedAsset {
    /// Output file name.
    pub file_name: String,
    /// Asset source.
    pub source: String,
}

impl EmittedAsset {
    /// Write the asset into a directory.
    pub fn write<P: AsRef<Path>>(&self, dir: P) -> Result<PathBuf> {
        let file = dir.as_ref().join(&self.file_name);
        std::fs::write(&file, &self.source)
            .with_context(|| format!("unable to write {}", file.display()))?;
        Ok(file)
    }
}

/// Post processing applied to the rewritten script.
pub type GenerateHook = Box<dyn Fn(String) -> String>;

/// Rewrites the preload chunk of a bundle.
pub struct PreloadBundler {
    global_name: String,
    externals: Vec<String>,
    declaration_file: Option<PathBuf>,
    preload_module: String,
    on_generate: Option<GenerateHook>,
}

impl PreloadBundler {
    /// Create a bundler for a global name and externalized modules.
    pub fn new<S: Into<String>>(global_name: S, externals: Vec<String>) -> Self {
        PreloadBundler {
            global_name: global_name.into(),
            externals,
            declaration_file: None,
            preload_module: String::from("./preload"),
            on_generate: None,
        }
    }

    /// Where to write the declaration file, `None` disables it.
    pub fn declaration_file(mut self, file: Option<PathBuf>) -> Self {
        self.declaration_file = file;
        self
    }

    /// Specifier of the preload source from the declaration file.
    pub fn preload_module<S: Into<String>>(mut self, module: S) -> Self {
        self.preload_module = module.into();
        self
    }

    /// Hook receiving the rewritten script.
    pub fn on_generate<F>(mut self, hook: F) -> Self
    where
        F: Fn(String) -> String + 'static,
    {
        self.on_generate = Some(Box::new(hook));
        self
    }

    /// Rewrite the preload chunk and remove it from the bundle.
    ///
    /// Returns `None` when the bundle has no preload chunk.
    pub fn generate_bundle(
        &self,
        bundle: &mut Bundle,
    ) -> Result<Option<EmittedAsset>> {
        let chunk = match bundle.shift_remove(PRELOAD_FILE_NAME) {
            Some(chunk) => chunk,
            None => {
                log::debug!("bundle has no {} chunk", PRELOAD_FILE_NAME);
                return Ok(None);
            }
        };

        let export_names = chunk
            .exports
            .into_iter()
            .filter(|name| name != "default")
            .collect::<Vec<_>>();

        let options = RewriteOptions {
            global_name: self.global_name.clone(),
            export_names,
            externals: self.externals.clone(),
        };
        let mut source = Rewriter::new(&chunk.code, &options).rewrite()?;

        if let Some(file) = &self.declaration_file {
            let mut declarations = DeclarationOptions::new(
                self.global_name.clone(),
                options.export_names.clone(),
            );
            declarations.preload_module = self.preload_module.clone();
            declarations.write(file)?;
        }

        if let Some(hook) = &self.on_generate {
            source = hook(source);
        }

        Ok(Some(EmittedAsset {
            file_name: PRELOAD_FILE_NAME.to_string(),
            source,
        }))
    }
}
