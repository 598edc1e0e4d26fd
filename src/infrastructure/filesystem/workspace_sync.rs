//! Replaces the contents of a target clone's working directory with the
//! files selected from the source project.

use glob::{MatchOptions, Pattern};
use std::fs;
use std::path::{Component, Path, PathBuf};
use tracing::{debug, info, warn};

use crate::common::error::PublisherError;
use crate::common::result::{PublisherResult, ResultExt};
use crate::common::verbosity::Verbosity;
use crate::infrastructure::filesystem::copy::copy_path_filtered;

/// Name of the custom domain marker GitHub Pages reads
pub const CNAME_FILE: &str = "CNAME";

const GIT_DIR: &str = ".git";

/// Options for matching a single path component
const COMPONENT_MATCH: MatchOptions = MatchOptions {
    case_sensitive: true,
    require_literal_separator: true,
    require_literal_leading_dot: false,
};

/// Map a project-relative, `/`-separated path to its place in the target
/// repository: a single component is kept, otherwise the leading directory
/// (usually the build output folder) is dropped.
pub fn remap_destination(source_relative: &str) -> String {
    match source_relative.split_once('/') {
        Some((_, rest)) => rest.to_string(),
        None => source_relative.to_string(),
    }
}

/// Whether `relative` names a `.git` entry or anything inside one
fn touches_git_dir(relative: &Path) -> bool {
    relative
        .components()
        .any(|component| component.as_os_str() == GIT_DIR)
}

/// Render a relative path with `/` separators regardless of platform
fn to_slash_path(path: &Path) -> String {
    path.components()
        .map(|component| component.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

fn has_glob_meta(component: &str) -> bool {
    component.chars().any(|c| matches!(c, '*' | '?' | '['))
}

/// `**` inside a single component means the same as `*`
fn collapse_stars(component: &str) -> String {
    let mut collapsed = String::with_capacity(component.len());
    for c in component.chars() {
        if c == '*' && collapsed.ends_with('*') {
            continue;
        }
        collapsed.push(c);
    }
    collapsed
}

enum ComponentMatcher {
    Literal(String),
    Glob(Pattern),
}

fn compile_pattern(pattern: &str) -> PublisherResult<Vec<ComponentMatcher>> {
    let mut matchers = Vec::new();
    for component in pattern.split('/') {
        if component.is_empty() || component == "." {
            continue;
        }
        if component == ".." {
            return Err(PublisherError::filesystem_error(
                format!("file pattern {:?} points outside of the project", pattern),
                None,
            ));
        }
        if has_glob_meta(component) {
            let compiled = Pattern::new(&collapse_stars(component)).map_err(|e| {
                PublisherError::filesystem_error_with_source(
                    format!("failed to parse file pattern {:?}", pattern),
                    None,
                    e,
                )
            })?;
            matchers.push(ComponentMatcher::Glob(compiled));
        } else {
            matchers.push(ComponentMatcher::Literal(component.to_string()));
        }
    }
    Ok(matchers)
}

/// Summary of one synchronization
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncSummary {
    /// Entries removed from the working directory
    pub removed_entries: usize,
    /// Regular files written into the working directory
    pub copied_files: usize,
    /// Resolved entries skipped because they matched an exclude pattern
    pub excluded_entries: usize,
    /// Whether a `CNAME` file was written
    pub wrote_cname: bool,
}

/// Empties a target working directory and refills it from the source tree
#[derive(Debug, Clone)]
pub struct WorkspaceSynchronizer {
    verbosity: Verbosity,
    excluded: Vec<Pattern>,
}

impl WorkspaceSynchronizer {
    pub fn new(verbosity: Verbosity) -> Self {
        Self {
            verbosity,
            excluded: Vec::new(),
        }
    }

    /// Skip project paths matching any of `patterns`.
    ///
    /// Exclude patterns are matched against the whole `/`-separated path
    /// relative to the project root; `**` spans directories.
    pub fn with_excluded_files(mut self, patterns: &[String]) -> PublisherResult<Self> {
        self.excluded = patterns
            .iter()
            .map(|pattern| {
                Pattern::new(pattern).map_err(|e| {
                    PublisherError::filesystem_error_with_source(
                        format!("failed to parse exclude pattern {:?}", pattern),
                        None,
                        e,
                    )
                })
            })
            .collect::<PublisherResult<Vec<_>>>()?;
        Ok(self)
    }

    /// Remove everything in `path` except a `.git` directory.
    ///
    /// Stops at the first failure; entries removed before it stay removed.
    pub fn empty_working_directory(&self, path: &Path) -> PublisherResult<usize> {
        debug!("Emptying directory {}", path.display());
        let entries = fs::read_dir(path).with_filesystem_error("failed to read contents of", path)?;

        let mut removed = 0;
        for entry in entries {
            let entry = entry.with_filesystem_error("failed to read contents of", path)?;
            let file_type = entry
                .file_type()
                .with_filesystem_error("failed to inspect", &entry.path())?;

            if entry.file_name() == GIT_DIR && file_type.is_dir() {
                continue;
            }

            let entry_path = entry.path();
            if file_type.is_dir() {
                fs::remove_dir_all(&entry_path)
            } else {
                fs::remove_file(&entry_path)
            }
            .with_filesystem_error("failed to remove", &entry_path)?;
            removed += 1;
        }

        Ok(removed)
    }

    /// Expand `patterns` relative to `base_dir`, in pattern order.
    ///
    /// Matching works one path component at a time, the way a shell does:
    /// `*`, `?` and `[...]` never cross a `/`. Matches of one component are
    /// sorted by name. Paths matched by several patterns appear once per
    /// pattern.
    pub fn resolve_file_set(
        &self,
        patterns: &[String],
        base_dir: &Path,
    ) -> PublisherResult<Vec<PathBuf>> {
        let compiled = patterns
            .iter()
            .map(|pattern| compile_pattern(pattern))
            .collect::<PublisherResult<Vec<_>>>()?;

        let mut files = Vec::new();
        for (pattern, matchers) in patterns.iter().zip(&compiled) {
            let matches = Self::expand(matchers, base_dir)?;
            if matches.is_empty() {
                debug!("Pattern {:?} matched nothing", pattern);
            }
            files.extend(matches);
        }
        Ok(files)
    }

    fn expand(matchers: &[ComponentMatcher], base_dir: &Path) -> PublisherResult<Vec<PathBuf>> {
        if matchers.is_empty() {
            return Ok(Vec::new());
        }

        let mut candidates = vec![base_dir.to_path_buf()];
        for matcher in matchers {
            let mut next = Vec::new();
            for candidate in &candidates {
                match matcher {
                    ComponentMatcher::Literal(name) => {
                        let path = candidate.join(name);
                        if fs::symlink_metadata(&path).is_ok() {
                            next.push(path);
                        }
                    }
                    ComponentMatcher::Glob(pattern) => {
                        if !candidate.is_dir() {
                            continue;
                        }
                        let mut names = fs::read_dir(candidate)
                            .with_filesystem_error("failed to read contents of", candidate)?
                            .map(|entry| entry.map(|e| e.file_name()))
                            .collect::<Result<Vec<_>, _>>()
                            .with_filesystem_error("failed to read contents of", candidate)?;
                        names.sort();

                        for name in names {
                            let matched = name
                                .to_str()
                                .is_some_and(|name| pattern.matches_with(name, COMPONENT_MATCH));
                            if matched {
                                next.push(candidate.join(name));
                            }
                        }
                    }
                }
            }
            candidates = next;
        }
        Ok(candidates)
    }

    /// Whether a path inside `source_root` matches an exclude pattern
    pub fn is_excluded(&self, path: &Path, source_root: &Path) -> bool {
        if self.excluded.is_empty() {
            return false;
        }
        let Some(relative) = pathdiff::diff_paths(path, source_root) else {
            return false;
        };
        let relative = to_slash_path(&relative);
        let options = MatchOptions {
            require_literal_separator: true,
            ..MatchOptions::new()
        };
        self.excluded
            .iter()
            .any(|pattern| pattern.matches_with(&relative, options))
    }

    /// Copy every resolved entry from `source_root` into `dest_root`, placing
    /// each at its [`remap_destination`].
    ///
    /// Entries that would land on a `.git` path are skipped, so the target's
    /// repository metadata is never overwritten. Fails fast; files copied
    /// before the failure are left in place.
    pub fn copy_all(
        &self,
        files: &[PathBuf],
        source_root: &Path,
        dest_root: &Path,
    ) -> PublisherResult<SyncSummary> {
        let mut summary = SyncSummary::default();

        for file in files {
            let relative = pathdiff::diff_paths(file, source_root)
                .filter(|relative| {
                    !relative
                        .components()
                        .any(|component| matches!(component, Component::ParentDir))
                })
                .ok_or_else(|| {
                    PublisherError::filesystem_error(
                        format!(
                            "{} is not inside the project root {}",
                            file.display(),
                            source_root.display()
                        ),
                        Some(file.clone()),
                    )
                })?;
            let relative = to_slash_path(&relative);

            if self.is_excluded(file, source_root) {
                debug!("Skipping excluded {}", relative);
                summary.excluded_entries += 1;
                continue;
            }

            let remapped = remap_destination(&relative);
            if touches_git_dir(Path::new(&remapped)) {
                warn!("Skipping {}: it would be copied into {}", relative, GIT_DIR);
                continue;
            }

            let destination = dest_root.join(remapped);
            if self.verbosity.is_verbose() {
                info!("Copying {}...", relative);
            } else {
                debug!("Copying {} to {}", relative, destination.display());
            }

            summary.copied_files += copy_path_filtered(file, &destination, |path| {
                let nested = path.strip_prefix(file).unwrap_or(path);
                if touches_git_dir(nested) {
                    debug!("Skipping {}", path.display());
                    return false;
                }
                !self.is_excluded(path, source_root)
            })?;
        }

        Ok(summary)
    }

    /// Write `domain` to `dest_root/CNAME` when it is not empty.
    ///
    /// Returns whether the file was written.
    pub fn write_custom_domain_marker(&self, dest_root: &Path, domain: &str) -> PublisherResult<bool> {
        if domain.is_empty() {
            return Ok(false);
        }
        let path = dest_root.join(CNAME_FILE);
        debug!("Writing {} with {}", path.display(), domain);
        fs::write(&path, domain).with_filesystem_error("failed to write", &path)?;
        Ok(true)
    }
}
