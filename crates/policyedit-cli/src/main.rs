//! policyedit - edit deployment policies recorded as manifest annotations

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

mod commands;
mod error;
mod exit_codes;

use commands::GlobalOptions;
use commands::update::Output;

#[derive(Parser)]
#[command(name = "policyedit")]
#[command(version)]
#[command(about = "Edit deployment policies recorded as manifest annotations", long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Configuration file (YAML)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Annotation prefix for policy keys
    #[arg(long, global = true, env = "POLICYEDIT_PREFIX")]
    prefix: Option<String>,

    /// Namespace assumed for resources that declare none
    #[arg(long, global = true, env = "POLICYEDIT_NAMESPACE")]
    namespace: Option<String>,

    /// Enable debug output
    #[arg(long, global = true)]
    debug: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Add or remove policies on a resource
    Update {
        /// Manifest file
        file: PathBuf,

        /// Resource id (<namespace>:<kind>/<name>)
        #[arg(short, long)]
        resource: String,

        /// Policy to add (name=value)
        #[arg(long = "add")]
        add: Vec<String>,

        /// Policy to remove (name)
        #[arg(long = "remove")]
        remove: Vec<String>,

        /// Write the result back to the file
        #[arg(short, long, conflicts_with = "diff")]
        in_place: bool,

        /// Print a unified diff instead of the manifest
        #[arg(long)]
        diff: bool,
    },

    /// Show the policies recorded on a resource
    Show {
        /// Manifest file
        file: PathBuf,

        /// Resource id (<namespace>:<kind>/<name>)
        #[arg(short, long)]
        resource: String,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Validate a tag pattern
    Check {
        /// Tag pattern (glob:, semver:, regexp: or a literal tag)
        value: String,

        /// Tags to match against the pattern
        #[arg(short, long = "tag")]
        tags: Vec<String>,
    },
}

fn main() {
    miette::set_panic_hook();

    let cli = Cli::parse();

    let default_level = if cli.debug { "debug" } else { "warn" };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)))
        .init();

    let global = GlobalOptions {
        config: cli.config,
        prefix: cli.prefix,
        namespace: cli.namespace,
    };

    let result = match cli.command {
        Commands::Update {
            file,
            resource,
            add,
            remove,
            in_place,
            diff,
        } => {
            let output = if in_place {
                Output::InPlace
            } else if diff {
                Output::Diff
            } else {
                Output::Print
            };
            commands::update::run(&global, &file, &resource, &add, &remove, output)
        }

        Commands::Show {
            file,
            resource,
            json,
        } => commands::show::run(&global, &file, &resource, json),

        Commands::Check { value, tags } => commands::check::run(&value, &tags),
    };

    if let Err(err) = result {
        let code = err.exit_code();
        eprintln!("{:?}", miette::Report::new(err));
        std::process::exit(code);
    }
}
