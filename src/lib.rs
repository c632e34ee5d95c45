use anyhow::{Result, anyhow};
use std::path::{Path, PathBuf};
use tracing::info;

pub mod backup;
pub mod batch;
pub mod diff;
pub mod error;
pub mod events;
pub mod file_filter;
pub mod files;
pub mod index;
pub mod logging;
pub mod merge;
pub mod missing;
mod paths;
pub mod pipeline;
pub mod po;
pub mod report;
pub mod settings;
#[cfg(test)]
mod test_util;

pub use error::{MergeError, MergeResult};
pub use events::ProgressEvent;
pub use files::LanguageFiles;
pub use pipeline::{RunOptions, run_merge};
pub use po::SearchMode;
pub use report::RunReport;

#[derive(Debug, Clone, Default)]
pub struct Config {
    /// Language directory whose missing translations get filled.
    pub target_dir: PathBuf,
    /// Language directory the translations are taken from.
    pub reference_dir: PathBuf,
    /// Explicit file names; empty means every `*.po` of the target directory.
    pub files: Vec<String>,
    pub ends_with: Option<String>,
    pub concurrency: Option<usize>,
    pub dry_run: bool,
    pub report_path: Option<PathBuf>,
    pub settings_path: Option<String>,
}

pub async fn run(config: Config) -> Result<RunReport> {
    let settings_path = config.settings_path.as_deref().map(Path::new);
    let settings = settings::load_settings(settings_path)?;
    run_with_settings(config, settings).await
}

pub async fn run_with_settings(config: Config, settings: settings::Settings) -> Result<RunReport> {
    validate_dirs(&config)?;

    let (mut target, mut reference) = if config.files.is_empty() {
        let target = LanguageFiles::from_dir(&config.target_dir)?;
        let reference = LanguageFiles::from_dir(&config.reference_dir)?;
        (target, reference)
    } else {
        (
            LanguageFiles::new(&config.target_dir, &config.files),
            LanguageFiles::new(&config.reference_dir, &config.files),
        )
    };

    if let Some(filter) = file_filter::FileFilter::new(settings.ignore_files.clone())? {
        target.apply_filter(&filter);
        reference.apply_filter(&filter);
    }
    if target.is_empty() {
        return Err(anyhow!(
            "no PO files to merge in {}",
            config.target_dir.display()
        ));
    }

    let concurrency = match config.concurrency.or(settings.concurrency) {
        Some(0) => return Err(anyhow!("concurrency must be at least 1")),
        Some(value) => value,
        None => batch::default_concurrency(),
    };
    let search = SearchMode {
        ends_with: config
            .ends_with
            .clone()
            .or(settings.ends_with.clone())
            .filter(|suffix| !suffix.is_empty()),
    };
    let options = RunOptions {
        search,
        concurrency,
        dry_run: config.dry_run,
    };

    info!(
        "merging {} files from {} into {}",
        target.files.len(),
        reference.dir.display(),
        target.dir.display()
    );
    let report = run_merge(&target, &reference, &options).await;

    if let Some(path) = config.report_path.as_deref() {
        report.write_json(path)?;
        info!("report written to {}", path.display());
    }
    Ok(report)
}

fn validate_dirs(config: &Config) -> Result<()> {
    for (label, dir) in [
        ("target", &config.target_dir),
        ("reference", &config.reference_dir),
    ] {
        if dir.as_os_str().is_empty() {
            return Err(anyhow!("{} directory is empty", label));
        }
        if !dir.is_dir() {
            return Err(anyhow!(
                "{} directory not found: {}",
                label,
                dir.display()
            ));
        }
    }
    let same = match (
        config.target_dir.canonicalize(),
        config.reference_dir.canonicalize(),
    ) {
        (Ok(target), Ok(reference)) => target == reference,
        _ => config.target_dir == config.reference_dir,
    };
    if same {
        return Err(anyhow!("target and reference directories must differ"));
    }
    Ok(())
}
