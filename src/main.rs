use anyhow::{Context, Result};
use clap::Parser;
use codeschema::cli;
use codeschema::coverage::{self, CoverageOptions, CoverageReport};
use codeschema::graph::{self, DependencyReport};
use codeschema::indexer::scan::ScanOptions;
use codeschema::indexer::{Indexer, SchemaExtractor, test_detection};
use codeschema::model::DirectorySchema;
use serde::Serialize;
use serde_json::json;
use tracing_subscriber::EnvFilter;

fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn scan(args: &cli::ScanArgs) -> Result<DirectorySchema> {
    let mut options = ScanOptions::new(args.no_ignore);
    options.use_matcher = !args.no_matcher;
    options.extra_skip_dirs = args.skip.clone();
    let indexer = Indexer::new_with_options(args.root.clone(), options)?;
    indexer
        .scan()
        .with_context(|| format!("scan {}", args.root.display()))
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn main() -> Result<()> {
    init_logging();
    let args = cli::Args::parse();

    match args.command {
        cli::Command::Scan { scan: scan_args, summary } => {
            let tree = scan(&scan_args)?;
            if summary {
                print_json(&tree.summary())
            } else {
                print_json(&tree)
            }
        }
        cli::Command::Extract {
            path,
            language,
            no_matcher,
        } => {
            let extractor = SchemaExtractor::new(!no_matcher)?;
            let schema = extractor
                .extract_path(&path, &language)
                .with_context(|| format!("extract {}", path.display()))?;
            print_json(&schema)
        }
        cli::Command::Deps {
            scan: scan_args,
            cycles,
            edges,
        } => {
            let tree = scan(&scan_args)?;
            let graph = graph::build(tree.all_files());
            let mut report = DependencyReport::from_graph(&graph);
            if cycles {
                let found = graph::find_cycles(&graph);
                tracing::info!(cycles = found.len(), "cycle detection");
                report = report.with_cycles(found);
            }
            if edges {
                print_json(&json!({ "report": report, "graph": graph }))
            } else {
                print_json(&report)
            }
        }
        cli::Command::Coverage {
            scan: scan_args,
            skip_private,
            entries,
        } => {
            let tree = scan(&scan_args)?;
            let (functions, tests) =
                test_detection::partition_functions(&tree, test_detection::is_test_file);
            let matched = coverage::match_functions_with_options(
                &functions,
                &tests,
                CoverageOptions { skip_private },
            );
            let report = CoverageReport::from_entries(&matched);
            if entries {
                print_json(&json!({ "report": report, "entries": matched }))
            } else {
                print_json(&report)
            }
        }
    }
}
