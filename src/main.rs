use clap::{Args, Parser, Subcommand};
use miette::{miette, Result};
use std::path::PathBuf;

use sf_lvars_rs::cli::{self, CommonArgs, OutputFormat};

#[derive(Parser)]
#[command(name = "sf-lvars")]
#[command(about = "Mark copy variables superfluous and replay the merges on decompiled functions")]
#[command(version)]
struct Cli {
    #[command(flatten)]
    common: GlobalArgs,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct GlobalArgs {
    /// Directory holding the saved records
    #[arg(long, global = true, default_value = ".sf-lvars")]
    store: PathBuf,

    /// JSON config file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Hide merged variables instead of tagging them SUPERFLUOUS
    #[arg(long, global = true)]
    hide_superfluous: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// List saved superfluous variables
    List {
        /// Output format
        #[arg(short, long, value_enum, default_value = "text")]
        format: OutputFormat,
    },

    /// Delete every saved record
    Reset,

    /// Print a function dump as pseudo-C
    Print {
        /// Input function dump (JSON)
        #[arg(short, long)]
        input: PathBuf,
    },

    /// Mark a variable superfluous and merge it into its source
    Mark {
        /// Input function dump (JSON)
        #[arg(short, long)]
        input: PathBuf,

        /// Name of the variable defined by the copy
        #[arg(long)]
        var: String,

        /// Write the rewritten dump here (pseudo-C on stdout otherwise)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Forget a superfluous mark
    Unmark {
        /// Input function dump (JSON)
        #[arg(short, long)]
        input: PathBuf,

        /// Name of the marked variable
        #[arg(long)]
        var: String,
    },

    /// Replay saved merges on a freshly decompiled function
    Apply {
        /// Input function dump (JSON)
        #[arg(short, long)]
        input: PathBuf,

        /// Write the rewritten dump here (pseudo-C on stdout otherwise)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    // Initialize logging
    env_logger::init();

    let cli = Cli::parse();
    let common = CommonArgs {
        store_dir: cli.common.store,
        config_path: cli.common.config,
        hide_superfluous: cli.common.hide_superfluous,
    };

    match cli.command {
        Commands::List { format } => cli::list::list(&common, format).map_err(|e| miette!("{}", e)),
        Commands::Reset => cli::reset::reset(&common).map_err(|e| miette!("{}", e)),
        Commands::Print { input } => cli::print::print(&input).map_err(|e| miette!("{}", e)),
        Commands::Mark { input, var, output } => {
            cli::mark::mark(&common, &input, &var, output.as_deref()).map_err(|e| miette!("{}", e))
        }
        Commands::Unmark { input, var } => {
            cli::unmark::unmark(&common, &input, &var).map_err(|e| miette!("{}", e))
        }
        Commands::Apply { input, output } => {
            cli::apply::apply(&common, &input, output.as_deref()).map_err(|e| miette!("{}", e))
        }
    }
}
