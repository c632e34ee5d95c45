use std::path::PathBuf;

use anyhow::{Result, anyhow};
use clap::Parser;

#[derive(Parser, Debug)]
#[command(
    name = "po-merge-rust",
    version,
    about = "Fill missing PO translations from another language's PO files"
)]
struct Cli {
    /// Language directory holding the PO files to complete
    #[arg(short = 't', long = "target")]
    target: PathBuf,

    /// Language directory holding the PO files to take translations from
    #[arg(short = 'R', long = "reference")]
    reference: PathBuf,

    /// PO file name to merge (repeatable). Default: every *.po in --target
    #[arg(short = 'F', long = "file")]
    files: Vec<String>,

    /// Also treat translations ending with this suffix as missing
    #[arg(short = 'e', long = "ends-with")]
    ends_with: Option<String>,

    /// Number of files processed at the same time (default: CPU count)
    #[arg(short = 'j', long = "concurrency")]
    concurrency: Option<usize>,

    /// Build the plan and print it without touching any file
    #[arg(long = "dry-run")]
    dry_run: bool,

    /// Write a JSON report of the run to this path
    #[arg(long = "report")]
    report: Option<PathBuf>,

    /// Read extra settings from a local TOML file
    #[arg(short = 'r', long = "read-settings")]
    read_settings: Option<String>,

    /// Enable verbose logging
    #[arg(long = "verbose")]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    po_merge_rust::logging::init(cli.verbose)?;

    let report = po_merge_rust::run(po_merge_rust::Config {
        target_dir: cli.target,
        reference_dir: cli.reference,
        files: cli.files,
        ends_with: cli.ends_with,
        concurrency: cli.concurrency,
        dry_run: cli.dry_run,
        report_path: cli.report,
        settings_path: cli.read_settings,
    })
    .await?;

    println!("{}", report.summary());
    let failures = report.failures().count();
    if failures > 0 {
        return Err(anyhow!("{} file(s) could not be merged", failures));
    }
    Ok(())
}
