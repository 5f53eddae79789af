#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::struct_excessive_bools)]

mod commands;
mod logging;

use clap::Parser;
use miette::Result;
use std::path::PathBuf;
use stowage_core::Config;

#[derive(Parser, Debug)]
#[command(name = "stowage")]
#[command(author, version, about = "Self-contained package manifests for workspace projects", long_about = None)]
struct Cli {
    /// Increase logging verbosity (-v for DEBUG, -vv for TRACE)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Emit JSON formatted output (stable, machine-readable)
    #[arg(long, global = true)]
    json: bool,

    /// Override the working directory
    #[arg(long, global = true, value_name = "PATH")]
    cwd: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(clap::Subcommand, Debug)]
enum Commands {
    /// Print version information
    Version,

    /// List workspace projects
    List,

    /// Resolve the external dependency closure of a project
    Closure {
        /// Project name
        project: String,
    },

    /// Synthesize the deployable manifest for a project
    Manifest {
        /// Project name
        project: String,

        /// Scope for synthesized package names (default: the root manifest's scope)
        #[arg(long)]
        scope: Option<String>,
    },

    /// Build self-contained manifests for workspace projects
    Pack {
        /// Projects to pack (default: all workspace projects, affected-only)
        projects: Vec<String>,

        /// Pack every workspace project, skipping change detection
        #[arg(long)]
        all: bool,

        /// Git ref to diff against for change detection
        #[arg(long, value_name = "REF")]
        base: Option<String>,

        /// Scope for synthesized package names
        #[arg(long)]
        scope: Option<String>,

        /// Base directory for output dirs (default: <workspace root>/dist)
        #[arg(long, value_name = "DIR")]
        out_root: Option<PathBuf>,

        /// Write each manifest to <dir>/package.json
        #[arg(long)]
        write: bool,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Determine working directory
    let cwd = cli
        .cwd
        .or_else(|| std::env::current_dir().ok())
        .unwrap_or_else(|| PathBuf::from("."));
    let cwd = dunce::canonicalize(&cwd).unwrap_or(cwd);

    let config = Config::new(cwd.clone())
        .with_verbosity(cli.verbose)
        .with_json_logs(cli.json);

    logging::init(config.verbosity, config.json_logs);

    match cli.command {
        Some(Commands::Version) | None => commands::version::run(),
        Some(Commands::List) => commands::list::run(&cwd, cli.json),
        Some(Commands::Closure { project }) => commands::closure::run(&cwd, &project, cli.json),
        Some(Commands::Manifest { project, scope }) => {
            commands::manifest::run(&cwd, &project, scope.as_deref(), cli.json)
        }
        Some(Commands::Pack {
            projects,
            all,
            base,
            scope,
            out_root,
            write,
        }) => {
            let action = commands::pack::PackAction {
                cwd,
                projects,
                all,
                base,
                scope,
                out_root,
                write,
            };
            commands::pack::run(action, cli.json)
        }
    }
}
