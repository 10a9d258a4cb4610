use std::path::PathBuf;

use clap::Parser;
use omtool::Mode;

#[derive(Parser)]
#[command(name = "omtool")]
#[command(about = "Create, integrate and analyze galactic N-body models")]
#[command(version)]
struct Cli {
    /// Mode of the program to run
    #[arg(value_enum)]
    mode: Mode,

    /// Config file of the mode
    config: PathBuf,

    /// Accepted for compatibility and ignored
    #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
    extra: Vec<String>,

    /// Log at debug level
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    omtool::run(cli.mode, &cli.config, cli.verbose)
}
