//! `braid` binary

use std::io::Write;
use std::path::PathBuf;

use anyhow::Result;
use braid_cli::commands::{self, emit::EmitFormat};
use braid_cli::{logging, Project};
use braid_mixins::TypeFactoryOptions;
use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(name = "braid")]
#[command(about = "Inspect mixin configurations and the types they generate", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

/// Where the types and configuration come from
#[derive(Args)]
struct Sources {
    /// Type catalog (TOML); `[[classes]]` tables in it are applied too
    catalog: PathBuf,
    /// Separate mixin manifest (TOML)
    #[arg(short, long)]
    manifest: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the mixin order of configured classes
    Order {
        #[command(flatten)]
        sources: Sources,
        /// Only this class (full name)
        #[arg(short, long)]
        class: Option<String>,
    },

    /// Print target class definitions
    Inspect {
        #[command(flatten)]
        sources: Sources,
        /// Only this class (full name)
        #[arg(short, long)]
        class: Option<String>,
    },

    /// Generate the concrete types of a class and print them
    Emit {
        #[command(flatten)]
        sources: Sources,
        /// Class to generate (full name)
        #[arg(short, long)]
        class: String,
        /// Name template for generated types; `{type}` and `{index}` are replaced
        #[arg(long, default_value = braid_mixins::codegen::DEFAULT_NAME_TEMPLATE)]
        name_template: String,
        /// Output format
        #[arg(long, value_enum, default_value = "text")]
        format: EmitFormat,
    },
}

fn load(sources: &Sources) -> Result<Project> {
    Project::load(&sources.catalog, sources.manifest.as_deref())
}

fn main() -> Result<()> {
    logging::init_tracing();
    let cli = Cli::parse();
    let stdout = std::io::stdout();
    let mut out = stdout.lock();

    match cli.command {
        Commands::Order { sources, class } => {
            commands::order::execute(&load(&sources)?, class.as_deref(), &mut out)?;
        }
        Commands::Inspect { sources, class } => {
            commands::inspect::execute(&load(&sources)?, class.as_deref(), &mut out)?;
        }
        Commands::Emit {
            sources,
            class,
            name_template,
            format,
        } => {
            let options = TypeFactoryOptions {
                name_template,
                ..TypeFactoryOptions::default()
            };
            commands::emit::execute(&load(&sources)?, &class, options, format, &mut out)?;
        }
    }
    out.flush()?;
    Ok(())
}
