use crate::error::{AppError, Result};
use ignore::Match;
use ignore::gitignore::{Glob, Gitignore, GitignoreBuilder};
use log;
use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceKind {
    VcsIgnore,
    ToolIgnore,
    IncludeWhitelist,
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SourceKind::VcsIgnore => "vcs-ignore",
            SourceKind::ToolIgnore => "tool-ignore",
            SourceKind::IncludeWhitelist => "include-whitelist",
        };
        f.write_str(name)
    }
}

/// One loaded pattern file (or group of files) with gitignore semantics,
/// evaluated relative to `root`.
#[derive(Debug)]
pub struct RuleSource {
    kind: SourceKind,
    root: PathBuf,
    files: Vec<PathBuf>,
    matcher: Gitignore,
}

/// Why a present source file could not be turned into rules.
#[derive(Debug)]
pub struct SourceLoadError {
    pub path: PathBuf,
    pub error: ignore::Error,
}

impl From<SourceLoadError> for AppError {
    fn from(err: SourceLoadError) -> Self {
        AppError::IgnoreFile {
            path: err.path,
            source: err.error,
        }
    }
}

impl RuleSource {
    /// Builds a source from every file in `candidates` that exists. Returns
    /// `Ok(None)` when none of them is present. Any read or pattern error in a
    /// present file is returned, never partially applied.
    pub fn load(
        kind: SourceKind,
        root: &Path,
        candidates: &[PathBuf],
    ) -> std::result::Result<Option<Self>, SourceLoadError> {
        let mut builder = GitignoreBuilder::new(root);
        let mut files = Vec::new();

        for path in candidates {
            if !is_present(path) {
                log::trace!("No {} file at {}", kind, path.display());
                continue;
            }
            if let Some(error) = builder.add(path) {
                return Err(SourceLoadError {
                    path: path.clone(),
                    error,
                });
            }
            log::debug!("Loaded {} rules from {}", kind, path.display());
            files.push(path.clone());
        }

        if files.is_empty() {
            return Ok(None);
        }

        let matcher = builder.build().map_err(|error| SourceLoadError {
            path: files[0].clone(),
            error,
        })?;
        Ok(Some(Self {
            kind,
            root: root.to_path_buf(),
            files,
            matcher,
        }))
    }

    /// Loads the explicitly requested whitelist file. Its patterns are rooted
    /// at the directory that holds it.
    pub fn load_whitelist(path: &Path) -> Result<Self> {
        let canonical = path.canonicalize().map_err(|e| AppError::FileRead {
            path: path.to_path_buf(),
            source: e,
        })?;
        if !canonical.is_file() {
            return Err(AppError::FileRead {
                path: path.to_path_buf(),
                source: io::Error::new(io::ErrorKind::InvalidInput, "not a regular file"),
            });
        }
        let root = canonical.parent().unwrap_or(Path::new("/")).to_path_buf();

        Self::load(SourceKind::IncludeWhitelist, &root, &[canonical])?.ok_or_else(|| {
            AppError::FileRead {
                path: path.to_path_buf(),
                source: io::Error::from(io::ErrorKind::NotFound),
            }
        })
    }

    pub fn kind(&self) -> SourceKind {
        self.kind
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn files(&self) -> &[PathBuf] {
        &self.files
    }

    pub fn len(&self) -> usize {
        self.matcher.num_ignores() as usize + self.matcher.num_whitelists() as usize
    }

    pub fn is_empty(&self) -> bool {
        self.matcher.is_empty()
    }

    /// True when the last matching pattern for `path` (or for one of its
    /// parent directories) is a positive one. Paths outside `root` never match.
    pub fn matches(&self, path: &Path, is_dir: bool) -> bool {
        let Ok(relative) = path.strip_prefix(&self.root) else {
            return false;
        };
        if relative.as_os_str().is_empty() {
            return false;
        }
        self.matcher
            .matched_path_or_any_parents(relative, is_dir)
            .is_ignore()
    }

    /// The last pattern matching `path` itself, ignoring its parents. Paths
    /// not strictly below `root` yield `Match::None`.
    pub fn matched(&self, path: &Path, is_dir: bool) -> Match<&Glob> {
        match path.strip_prefix(&self.root) {
            Ok(relative) if !relative.as_os_str().is_empty() => {
                self.matcher.matched(relative, is_dir)
            }
            _ => Match::None,
        }
    }
}

fn is_present(path: &Path) -> bool {
    !matches!(fs::metadata(path), Err(e) if e.kind() == io::ErrorKind::NotFound)
}
