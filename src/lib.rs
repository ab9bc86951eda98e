//! Build companion for desktop plugin hosts that load a `preload.js`
//! script and expose its exports to a sandboxed webview.
//!
//! The preload source is analyzed to scaffold a browser mock during
//! development, and the compiled preload chunk is rewritten so that its
//! exports are attached to `window` for production builds.
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use serde_json::Value;

pub mod builtins;
pub mod cli;
pub mod config;
pub mod descriptor;
pub mod helpers;
pub mod manifest;
pub mod merge;
pub mod module_cache;
pub mod options;
pub mod preload;
pub mod scaffold;
pub mod swc_utils;

use config::MockConfigManager;
use module_cache::ModuleCache;
use options::{Options, OptionsResolver, PluginJson};
use preload::{Bundle, Generator, OutputChunk, PreloadBundler};
use scaffold::{MockScaffolder, ScaffoldOutcome};

fn ensure_file(file: &Path) -> Result<()> {
    if !file.is_file() {
        bail!("File {} does not exist", file.display());
    }
    Ok(())
}

/// Print the exports of a preload module as JSON.
pub fn analyze(file: PathBuf) -> Result<()> {
    ensure_file(&file)?;
    let info = preload::analyze_preload_file(&file)?;
    for error in info.errors.iter() {
        log::warn!("{}: {}", file.display(), error);
    }
    println!("{}", serde_json::to_string_pretty(&info)?);
    Ok(())
}

/// Print the mock module for a preload source or scaffold it next
/// to the source.
pub fn mock(
    file: PathBuf,
    name: String,
    project: Option<PathBuf>,
    write: bool,
) -> Result<()> {
    ensure_file(&file)?;

    let cache: ModuleCache<Value> = ModuleCache::new();
    let mut scaffolder = MockScaffolder::new(&file, name);
    if let Some(project) = project {
        let mut manager = MockConfigManager::new(project, &cache);
        scaffolder = scaffolder.with_config(&manager.config()?);
    }

    if write {
        match scaffolder.scaffold() {
            ScaffoldOutcome::Created(path) => log::info!("created {}", path.display()),
            ScaffoldOutcome::Existing(path) => {
                log::info!("{} exists, not overwriting", path.display())
            }
            ScaffoldOutcome::Failed(message) => bail!(message),
            ScaffoldOutcome::Disabled => log::info!("preload mocks are disabled"),
        }
    } else {
        print!("{}", scaffolder.render()?);
    }
    Ok(())
}

/// Rewrite a compiled preload chunk.
pub fn rewrite(
    chunk: PathBuf,
    exports: Vec<String>,
    name: String,
    external: Vec<String>,
    declarations: Option<PathBuf>,
    output: Option<PathBuf>,
) -> Result<()> {
    ensure_file(&chunk)?;
    let code = std::fs::read_to_string(&chunk)
        .with_context(|| format!("unable to read {}", chunk.display()))?;

    let mut bundle = Bundle::new();
    bundle.insert(
        preload::bundle::PRELOAD_FILE_NAME.to_string(),
        OutputChunk { code, exports },
    );

    let bundler = PreloadBundler::new(name, external).declaration_file(declarations);
    if let Some(asset) = bundler.generate_bundle(&mut bundle)? {
        if let Some(output) = output {
            std::fs::write(&output, &asset.source)
                .with_context(|| format!("unable to write {}", output.display()))?;
            log::info!("wrote {}", output.display());
        } else {
            print!("{}", asset.source);
        }
    }
    Ok(())
}

/// Update the signature manifest of a project.
pub fn manifest(project: PathBuf, file: PathBuf, name: String) -> Result<()> {
    ensure_file(&file)?;
    let result = manifest::MockManifestBuilder::new(&project, &file, name).build()?;
    println!(
        "{} {} ({} signatures)",
        if result.changed { "regenerated" } else { "unchanged" },
        result.path.display(),
        result.manifest.signatures.len()
    );
    Ok(())
}

/// Write the host descriptor for a plugin file.
pub fn descriptor(
    options: Option<PathBuf>,
    plugin_file: Option<PathBuf>,
    out_dir: Option<PathBuf>,
    url: Option<String>,
) -> Result<()> {
    let mut options = match options {
        Some(file) => Options::load(file)?,
        None => Options::default(),
    };
    if let Some(plugin_file) = plugin_file {
        options.plugin_file = plugin_file;
    }
    if let Some(out_dir) = out_dir {
        options.out_dir = out_dir;
    }

    let cwd = std::env::current_dir()?;
    let resolved = OptionsResolver::new(cwd).resolve(options)?;
    let plugin: &PluginJson = &resolved.plugin;
    let url = url.as_deref().map(descriptor::local_url);
    let file = descriptor::write_plugin_json(plugin, &resolved.options.out_dir, url.as_deref())?;
    log::info!("wrote {}", file.display());
    Ok(())
}

/// Print the merged mock configuration or write a template.
pub fn config(project: PathBuf, init: bool) -> Result<()> {
    let cache: ModuleCache<Value> = ModuleCache::new();
    let mut manager = MockConfigManager::new(project, &cache);
    if init {
        manager.write_template("utools.mock.ts")?;
    } else {
        println!("{}", serde_json::to_string_pretty(&manager.config()?)?);
    }
    Ok(())
}

/// Render a mock module from source text.
pub fn mock_source(source: &str, file_name: &str, name: &str) -> Result<String> {
    let info = preload::analyze_preload_source(source, file_name)?;
    Ok(Generator::new(name, &info).generate())
}
