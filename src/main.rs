//! tandem command-line entry point.

use clap::Parser;
use tracing_subscriber::EnvFilter;

use tandem::cli::{Cli, execute};

fn init_tracing(verbose: bool) {
    let default = if verbose { "tandem=debug" } else { "tandem=warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

#[allow(clippy::print_stdout)]
fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let output = execute(&cli)?;
    print!("{output}");
    Ok(())
}
