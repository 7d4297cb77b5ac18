use clap::Parser;
use colored::Colorize;
use nodekeeper::cli::IndexArgs;
use nodekeeper::constants::exit;
use nodekeeper::error;
use nodekeeper::{index, logging, output};
use std::process::ExitCode;

fn main() -> ExitCode {
    let args = IndexArgs::parse();

    if let Err(e) = logging::init_tracing(args.common.verbose, args.common.log_json) {
        eprintln!("warning: failed to initialize logging: {}", e);
    }

    match run(&args) {
        Ok(code) => ExitCode::from(code),
        Err(err) => {
            eprintln!("{} {:#}", "ERROR:".red().bold(), err);
            ExitCode::from(error::exit_code_of(&err))
        }
    }
}

fn run(args: &IndexArgs) -> anyhow::Result<u8> {
    let config = args.common.config();
    error::require_git()?;

    let entries = index::write_index(&args.dir, &args.output, &config)?;
    output::print_index_written(&args.output, entries.len(), &config);

    Ok(exit::SUCCESS)
}
