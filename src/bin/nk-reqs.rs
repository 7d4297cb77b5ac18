use clap::Parser;
use colored::Colorize;
use nodekeeper::analyzer::{self, PackageAnalyzer};
use nodekeeper::cli::ReqsArgs;
use nodekeeper::constants::{REPORT_FILE, exit};
use nodekeeper::error::{self, NodesError};
use nodekeeper::{logging, output};
use std::process::ExitCode;

fn main() -> ExitCode {
    let args = ReqsArgs::parse();

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

fn run(args: &ReqsArgs) -> anyhow::Result<u8> {
    let config = args.common.config();

    if !args.dir.is_dir() {
        return Err(NodesError::RootNotFound {
            path: args.dir.clone(),
        }
        .into());
    }

    let mut analyzer = PackageAnalyzer::new(&args.dir, args.reference.clone());
    let reference_found = analyzer.load_reference()?;
    let stats = analyzer.scan_custom_nodes();
    output::print_scan_stats(analyzer.reference_path(), reference_found, &stats, &config);

    let conflicts = analyzer.analyze_conflicts();
    output::print_conflict_summary(&conflicts, &config);

    let updates = analyzer.recommendations(&conflicts);
    output::print_node_recommendations(&updates, &config);

    let report_path = args.dir.join(REPORT_FILE);
    let exported = if !args.no_export && !updates.is_empty() {
        analyzer::export_report(&updates, &report_path)?;
        Some(report_path.as_path())
    } else {
        None
    };

    output::print_analysis_summary(
        analyzer.package_count(),
        conflicts.len(),
        updates.len(),
        analyzer.reference_count(),
        exported,
        &config,
    );

    Ok(exit::SUCCESS)
}
