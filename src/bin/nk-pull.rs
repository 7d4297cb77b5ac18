use anyhow::Context;
use clap::Parser;
use colored::Colorize;
use nodekeeper::cli::PullArgs;
use nodekeeper::constants::exit;
use nodekeeper::error::{self, NodesError};
use nodekeeper::update::{self, PullOptions};
use nodekeeper::{logging, output, repo};
use std::process::ExitCode;

fn main() -> ExitCode {
    let args = PullArgs::parse();

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

fn run(args: &PullArgs) -> anyhow::Result<u8> {
    let config = args.common.config();
    error::require_git()?;

    let root = std::fs::canonicalize(&args.root).map_err(|_| NodesError::RootNotFound {
        path: args.root.clone(),
    })?;
    output::print_working_dir(&root, &config);

    let repos = repo::find_git_repos(&root, &config)?;
    if repos.is_empty() {
        output::print_no_repos(&config);
        return Ok(exit::SUCCESS);
    }

    if args.force_overwrite && !args.yes {
        let confirmed = output::confirm_force_overwrite(repos.len())
            .context("confirmation needs an interactive terminal; pass --yes to skip it")?;
        if !confirmed {
            println!("Aborted. No repository was changed.");
            return Ok(exit::SUCCESS);
        }
    }

    let options = PullOptions {
        force_overwrite: args.force_overwrite,
    };
    let callbacks = output::create_pull_callbacks(repos.len(), &config, args.show_diff);
    let report = update::reconcile_all(&repos, options, &callbacks, &config);
    callbacks.finish();

    output::print_pull_summary(&report, &config);

    Ok(if report.has_failures() {
        exit::FAILURES
    } else {
        exit::SUCCESS
    })
}
