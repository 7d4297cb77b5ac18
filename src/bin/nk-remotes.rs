use clap::Parser;
use colored::Colorize;
use nodekeeper::cli::RemotesArgs;
use nodekeeper::constants::exit;
use nodekeeper::error;
use nodekeeper::{logging, output, remotes};
use std::process::ExitCode;

fn main() -> ExitCode {
    let args = RemotesArgs::parse();

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

fn run(args: &RemotesArgs) -> anyhow::Result<u8> {
    let config = args.common.config();
    error::require_git()?;

    if !config.is_quiet() {
        println!(
            "{} {}",
            "Checking remotes under:".cyan(),
            args.dir.display().to_string().white().bold()
        );
    }

    let reports = remotes::check_remotes(&args.dir, &config)?;
    output::print_remote_reports(&reports, &config);

    let failed = reports.iter().any(|r| r.remotes.is_err());
    Ok(if failed { exit::FAILURES } else { exit::SUCCESS })
}
