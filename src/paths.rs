use std::path::PathBuf;

const BASE_DIR_ENV: &str = "PO_MERGE_RUST_DIR";
const DEFAULT_DIR_NAME: &str = ".po-merge-rust";

/// Directory holding the user's settings files.
pub(crate) fn settings_dir() -> Option<PathBuf> {
    base_dir_override().or_else(default_base_dir)
}

fn base_dir_override() -> Option<PathBuf> {
    std::env::var(BASE_DIR_ENV)
        .ok()
        .and_then(|value| normalize_dir(&value))
}

fn default_base_dir() -> Option<PathBuf> {
    home().map(|home| home.join(DEFAULT_DIR_NAME))
}

fn home() -> Option<PathBuf> {
    let home = std::env::var("HOME").ok()?;
    let home = home.trim();
    if home.is_empty() {
        None
    } else {
        Some(PathBuf::from(home))
    }
}

fn normalize_dir(value: &str) -> Option<PathBuf> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return None;
    }
    let expanded = match trimmed.strip_prefix('~') {
        Some(rest) if rest.is_empty() || rest.starts_with('/') => match home() {
            Some(home) => home.join(rest.trim_start_matches('/')),
            None => PathBuf::from(trimmed),
        },
        _ => PathBuf::from(trimmed),
    };
    Some(expanded.components().collect())
}
