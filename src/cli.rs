use clap::{Args as ClapArgs, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "codeschema",
    version,
    about = "Structural schema, dependency graph and test coverage estimate for a source tree",
    after_help = r#"Examples:
  codeschema scan --root .
  codeschema scan --root . --summary
  codeschema extract --path src/app.ts --language typescript
  codeschema deps --root . --cycles
  codeschema coverage --root . --skip-private
  CODESCHEMA_MATCHER_BIN=sg codeschema scan --root web
  RUST_LOG=codeschema=debug codeschema deps --root . --no-matcher
"#
)]
pub struct Args {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(ClapArgs, Debug, Clone)]
pub struct ScanArgs {
    #[arg(long, default_value = ".")]
    pub root: PathBuf,
    /// Include files ignored by .gitignore.
    #[arg(long)]
    pub no_ignore: bool,
    /// Never call the structural matcher; use text patterns for JS/TS.
    #[arg(long)]
    pub no_matcher: bool,
    /// Additional directory name to skip (repeatable).
    #[arg(long = "skip", value_name = "DIR")]
    pub skip: Vec<String>,
}

#[derive(Subcommand)]
pub enum Command {
    /// Extract the directory schema tree and print it as JSON.
    Scan {
        #[command(flatten)]
        scan: ScanArgs,
        /// Print only totals.
        #[arg(long)]
        summary: bool,
    },
    /// Extract a single file with a declared language.
    Extract {
        #[arg(long)]
        path: PathBuf,
        /// python, javascript, typescript or tsx.
        #[arg(long)]
        language: String,
        #[arg(long)]
        no_matcher: bool,
    },
    /// Build the dependency graph and print a dependency report.
    Deps {
        #[command(flatten)]
        scan: ScanArgs,
        /// Run cycle detection over internal edges.
        #[arg(long)]
        cycles: bool,
        /// Include every edge in the output.
        #[arg(long)]
        edges: bool,
    },
    /// Estimate test coverage by matching function names against test names.
    Coverage {
        #[command(flatten)]
        scan: ScanArgs,
        /// Ignore functions whose name starts with an underscore.
        #[arg(long)]
        skip_private: bool,
        /// Include the per-function entries in the output.
        #[arg(long)]
        entries: bool,
    },
}
