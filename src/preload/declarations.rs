//! Type declarations for the rewritten preload script.
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

/// Options used to render the declaration file.
#[derive(Debug, Clone)]
pub struct DeclarationOptions {
    /// Global namespace name, empty to mount on `window` directly.
    pub global_name: String,
    /// Named exports of the preload module.
    pub export_names: Vec<String>,
    /// Specifier of the preload source relative to the declaration file.
    pub preload_module: String,
}

impl DeclarationOptions {
    /// Create options for the preload module `./preload`.
    pub fn new<S: Into<String>>(global_name: S, export_names: Vec<String>) -> Self {
        DeclarationOptions {
            global_name: global_name.into(),
            export_names,
            preload_module: String::from("./preload"),
        }
    }

    /// Render the declaration file.
    pub fn render(&self) -> String {
        let picked = if self.export_names.is_empty() {
            String::from("never")
        } else {
            self.export_names
                .iter()
                .map(|name| format!("'{}'", name))
                .collect::<Vec<_>>()
                .join(" | ")
        };

        let mut out = String::new();
        out.push_str("// Generated by preload-bridge, do not edit.\n");
        out.push_str(&format!(
            "import type * as PreloadModule from '{}';\n\n",
            self.preload_module
        ));
        out.push_str(
            "export type PreloadDefaultType = typeof PreloadModule extends { default: infer D } ? D : {};\n",
        );
        out.push_str(&format!(
            "export type PreloadNamedExportsType = Pick<typeof PreloadModule, {}>;\n\n",
            picked
        ));

        out.push_str("export interface ExportsTypesForMock {\n");
        if self.global_name.is_empty() {
            out.push_str(
                "    window?: PreloadDefaultType & PreloadNamedExportsType;\n",
            );
        } else {
            out.push_str("    window?: PreloadDefaultType;\n");
            out.push_str(&format!(
                "    {}?: PreloadNamedExportsType;\n",
                self.global_name
            ));
        }
        out.push_str("}\n\n");

        out.push_str("declare global {\n");
        if self.global_name.is_empty() {
            out.push_str(
                "    interface Window extends PreloadNamedExportsType {}\n",
            );
        } else {
            out.push_str("    interface Window {\n");
            out.push_str(&format!(
                "        {}: PreloadNamedExportsType;\n",
                self.global_name
            ));
            out.push_str("    }\n");
        }
        out.push_str("}\n");
        out
    }

    /// Write the declaration file, returns the path that was written.
    pub fn write<P: AsRef<Path>>(&self, file: P) -> Result<PathBuf> {
        let file = file.as_ref();
        std::fs::write(file, self.render())
            .with_context(|| format!("unable to write {}", file.display()))?;
        log::info!("wrote {}", file.display());
        Ok(file.to_path_buf())
    }
}
