use anyhow::{Result, anyhow};
use globset::{GlobBuilder, GlobMatcher};
use std::path::Path;

/// Gitignore-style exclusion list applied to PO file names before a run.
#[derive(Clone, Debug)]
pub struct FileFilter {
    rules: Vec<FilterRule>,
}

#[derive(Clone, Debug)]
struct FilterRule {
    matcher: GlobMatcher,
    negated: bool,
    dir_only: bool,
    basename: bool,
}

impl FileFilter {
    /// Returns `None` when no pattern survives parsing (blank lines and `#` comments).
    pub fn new(patterns: Vec<String>) -> Result<Option<Self>> {
        let mut rules = Vec::new();
        for raw in patterns {
            if let Some(rule) = parse_rule(&raw)? {
                rules.push(rule);
            }
        }
        if rules.is_empty() {
            return Ok(None);
        }
        Ok(Some(Self { rules }))
    }

    /// `name` is relative to its language directory. Later rules win.
    pub fn is_ignored(&self, name: &Path) -> bool {
        let rel = name.to_string_lossy().replace('\\', "/");
        let file_name = name
            .file_name()
            .and_then(|value| value.to_str())
            .unwrap_or("");
        let parents = parent_dirs(&rel);

        let mut ignored = false;
        for rule in &self.rules {
            if rule.matches(&rel, file_name, &parents) {
                ignored = !rule.negated;
            }
        }
        ignored
    }
}

impl FilterRule {
    fn matches(&self, rel: &str, file_name: &str, parents: &[String]) -> bool {
        if self.dir_only {
            return parents.iter().any(|dir| {
                let candidate = if self.basename {
                    dir.rsplit('/').next().unwrap_or(dir)
                } else {
                    dir.as_str()
                };
                self.matcher.is_match(candidate)
            });
        }
        if self.basename {
            self.matcher.is_match(file_name)
        } else {
            self.matcher.is_match(rel)
        }
    }
}

fn parse_rule(raw: &str) -> Result<Option<FilterRule>> {
    let line = raw.trim();
    if line.is_empty() {
        return Ok(None);
    }

    let mut pattern = line;
    if pattern.starts_with("\\#") || pattern.starts_with("\\!") {
        pattern = &pattern[1..];
    } else if pattern.starts_with('#') {
        return Ok(None);
    }

    let negated = pattern.starts_with('!');
    if negated {
        pattern = &pattern[1..];
    }

    let dir_only = pattern.ends_with('/');
    pattern = pattern.trim_end_matches('/');
    let anchored = pattern.starts_with('/');
    pattern = pattern.trim_start_matches('/');
    if pattern.is_empty() {
        return Ok(None);
    }

    let basename = !anchored && !pattern.contains('/');
    let glob = if basename || anchored {
        pattern.to_string()
    } else {
        format!("**/{}", pattern)
    };

    let matcher = GlobBuilder::new(&glob)
        .literal_separator(true)
        .backslash_escape(true)
        .build()
        .map_err(|err| anyhow!("invalid ignore pattern '{}': {}", raw, err))?
        .compile_matcher();

    Ok(Some(FilterRule {
        matcher,
        negated,
        dir_only,
        basename,
    }))
}

fn parent_dirs(rel: &str) -> Vec<String> {
    let mut out = Vec::new();
    let mut parts = rel.split('/').filter(|part| !part.is_empty()).collect::<Vec<_>>();
    parts.pop();
    let mut current = String::new();
    for part in parts {
        if !current.is_empty() {
            current.push('/');
        }
        current.push_str(part);
        out.push(current.clone());
    }
    out
}
