//! Command line parsing exposed via the library for the node bindings.
use std::ffi::OsString;
use std::path::PathBuf;

use anyhow::Result;
use structopt::StructOpt;

use super::{analyze, config, descriptor, manifest, mock, rewrite};

#[derive(StructOpt)]
#[structopt(about = "Preload analyzer, mock generator and bundle rewriter")]
enum PreloadCommands {
    /// Print the exports of a preload module as JSON
    Analyze {
        /// Preload source file
        #[structopt(parse(from_os_str))]
        module: PathBuf,
    },

    /// Generate the browser mock for a preload module
    Mock {
        /// Global namespace for named exports
        #[structopt(short, long, default_value = "preload")]
        name: String,
        /// Project directory containing the mock configuration
        #[structopt(short, long, parse(from_os_str))]
        project: Option<PathBuf>,
        /// Write the mock next to the source unless it exists
        #[structopt(short, long)]
        write: bool,
        /// Preload source file
        #[structopt(parse(from_os_str))]
        module: PathBuf,
    },

    /// Rewrite a compiled preload chunk
    Rewrite {
        /// Named exports of the chunk
        #[structopt(short, long)]
        exports: Vec<String>,
        /// Global namespace for named exports
        #[structopt(short, long, default_value = "preload")]
        name: String,
        /// Externalized module identifiers
        #[structopt(short = "x", long)]
        external: Vec<String>,
        /// Write the type declarations to this file
        #[structopt(short, long, parse(from_os_str))]
        declarations: Option<PathBuf>,
        /// Write the rewritten script to output
        #[structopt(short, long, parse(from_os_str))]
        output: Option<PathBuf>,
        /// Compiled chunk
        #[structopt(parse(from_os_str))]
        chunk: PathBuf,
    },

    /// Update the signature manifest of a project
    Manifest {
        /// Global namespace for named exports
        #[structopt(short, long, default_value = "preload")]
        name: String,
        /// Project directory
        #[structopt(short, long, parse(from_os_str), default_value = ".")]
        project: PathBuf,
        /// Preload source file
        #[structopt(parse(from_os_str))]
        module: PathBuf,
    },

    /// Write the plugin descriptor for the host
    Descriptor {
        /// Options file
        #[structopt(short, long, parse(from_os_str))]
        options: Option<PathBuf>,
        /// Plugin descriptor
        #[structopt(short = "f", long, parse(from_os_str))]
        plugin_file: Option<PathBuf>,
        /// Output directory
        #[structopt(short = "d", long, parse(from_os_str))]
        out_dir: Option<PathBuf>,
        /// Dev server URL or the log line that prints it
        #[structopt(short, long)]
        url: Option<String>,
    },

    /// Print the merged mock configuration
    Config {
        /// Write a configuration template
        #[structopt(short, long)]
        init: bool,
        /// Project directory
        #[structopt(parse(from_os_str), default_value = ".")]
        project: PathBuf,
    },
}

/// Parse the given arguments list or `std::env::os_args` and run the program.
pub fn run<T>(argv: Option<Vec<T>>) -> Result<()>
where
    T: Into<OsString> + Clone,
{
    if std::env::var("RUST_LOG").ok().is_none() {
        std::env::set_var("RUST_LOG", "info");
    }
    let _ = pretty_env_logger::try_init();

    let app = PreloadCommands::clap();
    let matches = if let Some(argv) = argv {
        app.get_matches_from(argv)
    } else {
        app.get_matches()
    };
    let args = PreloadCommands::from_clap(&matches);
    match args {
        PreloadCommands::Analyze { module } => analyze(module)?,
        PreloadCommands::Mock {
            module,
            name,
            project,
            write,
        } => mock(module, name, project, write)?,
        PreloadCommands::Rewrite {
            chunk,
            exports,
            name,
            external,
            declarations,
            output,
        } => rewrite(chunk, exports, name, external, declarations, output)?,
        PreloadCommands::Manifest {
            module,
            project,
            name,
        } => manifest(project, module, name)?,
        PreloadCommands::Descriptor {
            options,
            plugin_file,
            out_dir,
            url,
        } => descriptor(options, plugin_file, out_dir, url)?,
        PreloadCommands::Config { project, init } => config(project, init)?,
    }
    Ok(())
}
