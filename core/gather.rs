use crate::config::{Config, ExtensionFilters, canonical_project_root};
use crate::error::{Result, Warning};
use crate::output_formats::{OutputRecord, RecordKind};
use crate::rules::{Decision, EntryKind, RuleResolver, SkipReason, TraversalMode};
use log;
use std::borrow::Cow;
use std::fs;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Path and kind of one record written to the output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordSummary {
    pub path: PathBuf,
    pub kind: RecordKind,
}

/// Result of one run: the concatenated output plus what went into it.
#[derive(Debug)]
pub struct Concatenation {
    mode: TraversalMode,
    output: Vec<u8>,
    records: Vec<RecordSummary>,
    warnings: Vec<Warning>,
}

impl Concatenation {
    pub fn mode(&self) -> TraversalMode {
        self.mode
    }

    pub fn output(&self) -> &[u8] {
        &self.output
    }

    /// The output as text. Invalid UTF-8 sequences are replaced.
    pub fn text(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.output)
    }

    pub fn records(&self) -> &[RecordSummary] {
        &self.records
    }

    pub fn warnings(&self) -> &[Warning] {
        &self.warnings
    }

    pub fn files_emitted(&self) -> usize {
        self.count(RecordKind::Content)
    }

    pub fn binaries_skipped(&self) -> usize {
        self.count(RecordKind::Binary)
    }

    /// One line per record; binary files are marked.
    pub fn listing(&self) -> String {
        self.records
            .iter()
            .map(|r| match r.kind {
                RecordKind::Content => format!("{}\n", r.path.display()),
                RecordKind::Binary => format!("{} (binary)\n", r.path.display()),
            })
            .collect()
    }

    fn count(&self, kind: RecordKind) -> usize {
        self.records.iter().filter(|r| r.kind == kind).count()
    }

    fn warn(&mut self, warning: Warning) {
        log::warn!("{}", warning);
        self.warnings.push(warning);
    }
}

/// Walks `project_root` and concatenates every file the rules let through.
///
/// Fatal errors (bad root, unusable VCS-ignore or whitelist, directory listing
/// failures) abort with no output. Unreadable files and whitelist conflicts
/// are collected as warnings and the walk continues.
pub fn concatenate_project(project_root: &Path, config: &Config) -> Result<Concatenation> {
    log::debug!("Starting concatenation of {}", project_root.display());
    let project_root = canonical_project_root(project_root)?;

    let mut resolver = RuleResolver::load(
        &project_root,
        config.filters.include_file.as_deref(),
        config.filters.force,
    )?;
    log::debug!(
        "Traversal mode {:?}, precedence: {}",
        resolver.mode(),
        resolver.precedence().join(" > ")
    );

    let filters = config.extension_filters();
    if !filters.is_empty() {
        log::debug!("Extension filters: {:?}", filters);
    }
    let output_exclusion = config.output_exclusion(&project_root);
    if let Some(excluded) = &output_exclusion {
        log::debug!("Excluding output file: {}", excluded.display());
    }

    let mut concatenation = Concatenation {
        mode: resolver.mode(),
        output: Vec::new(),
        records: Vec::new(),
        warnings: resolver.take_load_warnings(),
    };
    walk(
        &project_root,
        &mut resolver,
        &filters,
        output_exclusion.as_deref(),
        &mut concatenation,
    )?;

    log::info!(
        "Concatenated {} file(s), skipped {} binary file(s), {} warning(s).",
        concatenation.files_emitted(),
        concatenation.binaries_skipped(),
        concatenation.warnings.len()
    );
    Ok(concatenation)
}

fn walk(
    project_root: &Path,
    resolver: &mut RuleResolver,
    filters: &ExtensionFilters,
    output_exclusion: Option<&Path>,
    concatenation: &mut Concatenation,
) -> Result<()> {
    let mut entries = WalkDir::new(project_root).sort_by_file_name().into_iter();

    while let Some(entry) = entries.next() {
        let entry = entry?;
        if entry.depth() == 0 {
            continue;
        }

        let Some(relative_path) = pathdiff::diff_paths(entry.path(), project_root) else {
            log::warn!("Could not get relative path for: {}", entry.path().display());
            continue;
        };
        if output_exclusion == Some(relative_path.as_path()) {
            log::trace!("Skipping output file: {}", relative_path.display());
            continue;
        }

        let kind = if entry.file_type().is_dir() {
            EntryKind::Directory
        } else {
            EntryKind::File
        };

        match resolver.classify(&relative_path, kind) {
            Decision::Recurse => resolver.enter_directory(&relative_path)?,
            Decision::SkipSubtree(_) => entries.skip_current_dir(),
            Decision::SkipFile(SkipReason::VcsConflict) => {
                concatenation.warn(Warning::IgnoredByVcs {
                    path: relative_path,
                });
            }
            Decision::SkipFile(_) => {}
            Decision::Emit => {
                if filters.is_excluded(&relative_path) {
                    log::trace!("Excluded by extension: {}", relative_path.display());
                    continue;
                }
                emit(entry.path(), relative_path, concatenation);
            }
        }
    }
    Ok(())
}

fn emit(path: &Path, relative_path: PathBuf, concatenation: &mut Concatenation) {
    let bytes = match fs::read(path) {
        Ok(bytes) => bytes,
        Err(e) => {
            concatenation.warn(Warning::UnreadableFile {
                path: relative_path,
                source: e,
            });
            return;
        }
    };

    let record = OutputRecord::from_content(relative_path, bytes);
    if record.kind() == RecordKind::Binary {
        log::debug!("Skipping binary file: {}", record.path().display());
    }
    record.write_to(&mut concatenation.output);
    concatenation.records.push(RecordSummary {
        path: record.path().to_path_buf(),
        kind: record.kind(),
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AppError;
    use tempfile::TempDir;

    fn write(root: &Path, rel: &str, content: &[u8]) {
        let path = root.join(rel);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(path, content).unwrap();
    }

    fn paths(c: &Concatenation) -> Vec<String> {
        c.records()
            .iter()
            .map(|r| r.path.to_string_lossy().replace('\\', "/"))
            .collect()
    }

    #[test]
    fn siblings_are_visited_in_lexical_order_depth_first() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "b.txt", b"b");
        write(dir.path(), "a/z.txt", b"z");
        write(dir.path(), "a/m.txt", b"m");
        write(dir.path(), "c.txt", b"c");

        let result = concatenate_project(dir.path(), &Config::default()).unwrap();
        assert_eq!(paths(&result), vec!["a/m.txt", "a/z.txt", "b.txt", "c.txt"]);
        assert_eq!(result.mode(), TraversalMode::Standard);
    }

    #[test]
    fn output_file_is_never_included() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "main.go", b"package main");
        write(dir.path(), "out/dump.txt", b"old dump");

        let mut config = Config::default();
        config.output.file = Some(PathBuf::from("out/dump.txt"));
        let result = concatenate_project(dir.path(), &config).unwrap();
        assert_eq!(paths(&result), vec!["main.go"]);
    }

    #[test]
    fn clipboard_output_does_not_exclude_the_output_file() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "dump.txt", b"old dump");

        let mut config = Config::default();
        config.output.file = Some(PathBuf::from("dump.txt"));
        config.output.clipboard = true;
        let result = concatenate_project(dir.path(), &config).unwrap();
        assert_eq!(paths(&result), vec!["dump.txt"]);
    }

    #[test]
    fn nested_gitignore_is_honored_during_the_walk() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "sub/.gitignore", b"secret.txt\n");
        write(dir.path(), "sub/secret.txt", b"token");
        write(dir.path(), "sub/ok.txt", b"fine");

        let result = concatenate_project(dir.path(), &Config::default()).unwrap();
        assert_eq!(paths(&result), vec!["sub/.gitignore", "sub/ok.txt"]);
        assert!(!result.text().contains("token"));
    }

    #[test]
    fn missing_root_is_fatal() {
        let dir = TempDir::new().unwrap();
        let err = concatenate_project(&dir.path().join("gone"), &Config::default()).unwrap_err();
        assert!(matches!(err, AppError::ProjectRoot { .. }));
    }

    #[test]
    fn file_root_is_fatal() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "file.txt", b"x");
        let err =
            concatenate_project(&dir.path().join("file.txt"), &Config::default()).unwrap_err();
        assert!(matches!(err, AppError::ProjectRoot { .. }));
    }

    #[test]
    fn extension_filter_never_skips_directories() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "notes.md/inner.txt", b"inside");
        write(dir.path(), "notes.md/readme.md", b"skip me");

        let mut config = Config::default();
        config.filters.exclude_extensions = vec!["md".to_string()];
        let result = concatenate_project(dir.path(), &config).unwrap();
        assert_eq!(paths(&result), vec!["notes.md/inner.txt"]);
    }

    #[test]
    fn listing_marks_binary_files() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "a.txt", b"hello");
        write(dir.path(), "b.bin", b"\x00\x01");

        let result = concatenate_project(dir.path(), &Config::default()).unwrap();
        assert_eq!(result.listing(), "a.txt\nb.bin (binary)\n");
        assert_eq!(result.files_emitted(), 1);
        assert_eq!(result.binaries_skipped(), 1);
    }

    #[cfg(unix)]
    #[test]
    fn unreadable_file_is_a_warning_not_an_error() {
        use std::os::unix::fs::symlink;

        let dir = TempDir::new().unwrap();
        write(dir.path(), "a.txt", b"first");
        write(dir.path(), "z.txt", b"last");
        write(dir.path(), "folder/inner.txt", b"inner");
        // Neither link can be read as a file, whatever the privileges.
        symlink("missing", dir.path().join("broken.txt")).unwrap();
        symlink("folder", dir.path().join("linked_dir")).unwrap();

        let result = concatenate_project(dir.path(), &Config::default()).unwrap();
        assert_eq!(paths(&result), vec!["a.txt", "folder/inner.txt", "z.txt"]);
        assert_eq!(result.warnings().len(), 2);
        assert!(
            result
                .warnings()
                .iter()
                .all(|w| matches!(w, Warning::UnreadableFile { .. }))
        );
        assert_eq!(result.warnings()[0].path(), Path::new("broken.txt"));
        assert_eq!(result.warnings()[1].path(), Path::new("linked_dir"));
        assert!(!result.text().contains("broken.txt"));
    }

    #[cfg(unix)]
    #[test]
    fn ignored_unreadable_directory_is_never_opened() {
        use std::os::unix::fs::PermissionsExt;

        let dir = TempDir::new().unwrap();
        write(dir.path(), ".gitignore", b"private/\n");
        write(dir.path(), "private/key.pem", b"-----BEGIN");
        write(dir.path(), "public.txt", b"hi");
        let private = dir.path().join("private");
        fs::set_permissions(&private, fs::Permissions::from_mode(0o000)).unwrap();

        let result = concatenate_project(dir.path(), &Config::default());
        fs::set_permissions(&private, fs::Permissions::from_mode(0o755)).unwrap();
        let result = result.unwrap();
        assert_eq!(paths(&result), vec![".gitignore", "public.txt"]);
    }
}
