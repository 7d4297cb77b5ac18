use clap::Parser;
use colored::Colorize;
use nodekeeper::cli::CloneArgs;
use nodekeeper::clone::{self, CloneOptions};
use nodekeeper::constants::exit;
use nodekeeper::error::{self, NodesError};
use nodekeeper::{links, logging, output};
use std::process::ExitCode;

fn main() -> ExitCode {
    let args = CloneArgs::parse();

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

fn run(args: &CloneArgs) -> anyhow::Result<u8> {
    let config = args.common.config();
    error::require_git()?;

    if !args.html.is_file() {
        return Err(NodesError::InputMissing {
            path: args.html.clone(),
        }
        .into());
    }

    let bytes = std::fs::read(&args.html).map_err(|source| NodesError::Read {
        path: args.html.clone(),
        source,
    })?;
    let repos = links::load_links(&String::from_utf8_lossy(&bytes));
    if repos.is_empty() {
        return Err(NodesError::NoLinks {
            path: args.html.clone(),
        }
        .into());
    }

    let options = CloneOptions {
        target: args.target.clone(),
        depth: args.depth,
        force: args.force,
        recurse_submodules: args.recurse_submodules,
        dry_run: args.dry_run,
        jobs: args.jobs.max(1),
    };

    if !options.dry_run {
        std::fs::create_dir_all(&options.target).map_err(|source| NodesError::Write {
            path: options.target.clone(),
            source,
        })?;
    }

    output::print_clone_header(repos.len(), &args.html, &options, &config);

    let progress = output::create_clone_progress(repos.len(), &config);
    let report = clone::clone_all(&repos, &options, &config, |result| {
        progress.on_complete(result)
    });
    progress.finish();

    output::print_clone_summary(&report, &config);

    Ok(if report.tally().failed > 0 {
        exit::FAILURES
    } else {
        exit::SUCCESS
    })
}
