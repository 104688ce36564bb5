use std::process::ExitCode;

use colored::Colorize;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::prelude::*;

use typegraph_oas::cli::CommandLineInterface;

fn main() -> ExitCode {
    let command_line_interface = CommandLineInterface::load();
    init_tracing(command_line_interface.verbose());
    match command_line_interface.run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => {
            eprintln!("{} {error:#}", "error:".red().bold());
            ExitCode::FAILURE
        }
    }
}

/// `RUST_LOG` wins; otherwise `warn`, or `debug` with `--verbose`.
fn init_tracing(verbose: bool) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(if verbose { "debug" } else { "warn" }));
    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_filter(filter);

    if tracing_subscriber::registry().with(fmt_layer).try_init().is_err() {
        eprintln!("{} tracing subscriber already initialized", "warning:".yellow());
    }
}
