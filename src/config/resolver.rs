//! Restricted resolver for imports of mock configuration modules.
use std::ffi::OsString;
use std::path::{Path, PathBuf};

use anyhow::{bail, Error};
use swc_common::FileName;
use swc_ecma_loader::resolve::Resolve;

use crate::helpers::is_local_specifier;

/// Suffixes tried in order when resolving a local specifier.
///
/// Entries starting with a slash name a file inside a directory.
pub const RESOLVE_EXTENSIONS: &[&str] = &[
    "",
    ".ts",
    ".js",
    ".mjs",
    ".cjs",
    "/index.ts",
    "/index.js",
    "/index.mjs",
    "/index.cjs",
];

/// Resolves relative and absolute specifiers to existing files.
///
/// Package specifiers are rejected, configuration modules may only
/// load files from the project.
#[derive(Debug, Default, Clone, Copy)]
pub struct ConfigResolver;

impl ConfigResolver {
    /// Create a config resolver.
    pub fn new() -> Self {
        ConfigResolver
    }

    fn candidates(target: &Path) -> Vec<PathBuf> {
        RESOLVE_EXTENSIONS
            .iter()
            .map(|suffix| {
                if let Some(file) = suffix.strip_prefix('/') {
                    target.join(file)
                } else {
                    let mut path = OsString::from(target.as_os_str());
                    path.push(suffix);
                    PathBuf::from(path)
                }
            })
            .collect()
    }
}

impl Resolve for ConfigResolver {
    fn resolve(
        &self,
        base: &FileName,
        module_specifier: &str,
    ) -> Result<FileName, Error> {
        if !is_local_specifier(module_specifier) {
            bail!(
                "module {} is not a local file, config modules may only import project files",
                module_specifier
            );
        }

        let target = if module_specifier.starts_with('/') {
            PathBuf::from(module_specifier)
        } else {
            let dir = match base {
                FileName::Real(path) => path
                    .parent()
                    .map(Path::to_path_buf)
                    .unwrap_or_else(|| PathBuf::from(".")),
                _ => bail!(
                    "cannot resolve {} relative to {}",
                    module_specifier,
                    base
                ),
            };
            dir.join(module_specifier)
        };

        for candidate in Self::candidates(&target) {
            if candidate.is_file() {
                return Ok(FileName::Real(candidate));
            }
        }
        bail!("unable to resolve {} from {}", module_specifier, base)
    }
}
