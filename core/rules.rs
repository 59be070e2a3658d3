pub mod source;
pub mod vcs;

use crate::config::{TOOL_IGNORE_FILENAME, VCS_METADATA_DIR};
use crate::error::{AppError, Result, Warning};
use log;
use source::{RuleSource, SourceKind};
use vcs::VcsIgnore;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TraversalMode {
    /// Everything is emitted unless an ignore source excludes it.
    Standard,
    /// Only whitelisted files are emitted.
    IncludeOnly,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    Directory,
    File,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    VcsMetadata,
    VcsIgnored,
    ToolIgnored,
    NotWhitelisted,
    /// Whitelisted, but vetoed by the VCS-ignore rules without `force`.
    VcsConflict,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Recurse,
    SkipSubtree(SkipReason),
    SkipFile(SkipReason),
    Emit,
}

impl Decision {
    fn skip(kind: EntryKind, reason: SkipReason) -> Self {
        match kind {
            EntryKind::Directory => Decision::SkipSubtree(reason),
            EntryKind::File => Decision::SkipFile(reason),
        }
    }
}

/// The rule sources loaded for one run. Read-only once built.
#[derive(Debug, Default)]
pub struct RuleSet {
    pub vcs_ignore: VcsIgnore,
    pub tool_ignore: Option<RuleSource>,
    pub include_whitelist: Option<RuleSource>,
}

impl RuleSet {
    pub fn sources(&self) -> impl Iterator<Item = &RuleSource> {
        self.vcs_ignore
            .layers()
            .iter()
            .chain(self.tool_ignore.as_ref())
            .chain(self.include_whitelist.as_ref())
    }
}

struct Candidate<'a> {
    absolute: PathBuf,
    relative: &'a Path,
    kind: EntryKind,
}

impl Candidate<'_> {
    fn is_dir(&self) -> bool {
        self.kind == EntryKind::Directory
    }
}

/// A named precedence step. Returning `Some` ends the evaluation.
type Step = fn(&RuleResolver, &Candidate<'_>) -> Option<Decision>;

const STANDARD_CHAIN: &[(&str, Step)] = &[
    ("vcs-metadata", vcs_metadata_step),
    ("vcs-ignore", vcs_ignore_step),
    ("tool-ignore", tool_ignore_step),
    ("default", default_step),
];

const INCLUDE_ONLY_CHAIN: &[(&str, Step)] = &[
    ("vcs-metadata", vcs_metadata_step),
    ("descend-directories", descend_directories_step),
    ("include-whitelist", whitelist_step),
    ("vcs-veto", vcs_veto_step),
    ("default", default_step),
];

fn vcs_metadata_step(_: &RuleResolver, c: &Candidate<'_>) -> Option<Decision> {
    let is_metadata_dir = c.is_dir()
        && c.relative
            .file_name()
            .is_some_and(|name| name == VCS_METADATA_DIR);
    is_metadata_dir.then_some(Decision::SkipSubtree(SkipReason::VcsMetadata))
}

fn vcs_ignore_step(r: &RuleResolver, c: &Candidate<'_>) -> Option<Decision> {
    r.is_vcs_ignored(c)
        .then(|| Decision::skip(c.kind, SkipReason::VcsIgnored))
}

fn tool_ignore_step(r: &RuleResolver, c: &Candidate<'_>) -> Option<Decision> {
    r.rules
        .tool_ignore
        .as_ref()
        .is_some_and(|s| s.matches(&c.absolute, c.is_dir()))
        .then(|| Decision::skip(c.kind, SkipReason::ToolIgnored))
}

fn descend_directories_step(_: &RuleResolver, c: &Candidate<'_>) -> Option<Decision> {
    c.is_dir().then_some(Decision::Recurse)
}

fn whitelist_step(r: &RuleResolver, c: &Candidate<'_>) -> Option<Decision> {
    let included = r
        .rules
        .include_whitelist
        .as_ref()
        .is_some_and(|s| s.matches(&c.absolute, c.is_dir()));
    (!included).then_some(Decision::SkipFile(SkipReason::NotWhitelisted))
}

fn vcs_veto_step(r: &RuleResolver, c: &Candidate<'_>) -> Option<Decision> {
    (!r.force && r.is_vcs_ignored(c)).then_some(Decision::SkipFile(SkipReason::VcsConflict))
}

fn default_step(_: &RuleResolver, c: &Candidate<'_>) -> Option<Decision> {
    Some(match c.kind {
        EntryKind::Directory => Decision::Recurse,
        EntryKind::File => Decision::Emit,
    })
}

/// Loads the rule sources for a project root and classifies entries against
/// them in a fixed precedence order.
#[derive(Debug)]
pub struct RuleResolver {
    project_root: PathBuf,
    mode: TraversalMode,
    force: bool,
    rules: RuleSet,
    load_warnings: Vec<Warning>,
}

impl RuleResolver {
    /// Builds the resolver. Supplying `include_file` switches the run to
    /// [`TraversalMode::IncludeOnly`] and the tool-ignore file is not read.
    pub fn load(project_root: &Path, include_file: Option<&Path>, force: bool) -> Result<Self> {
        log::debug!("Loading rule sources for {}", project_root.display());
        let mut load_warnings = Vec::new();

        let vcs_ignore = VcsIgnore::load(project_root)?;

        let (mode, tool_ignore, include_whitelist) = match include_file {
            Some(path) => {
                let whitelist = RuleSource::load_whitelist(path)?;
                log::info!(
                    "Include-only mode: {} pattern(s) from {}",
                    whitelist.len(),
                    path.display()
                );
                (TraversalMode::IncludeOnly, None, Some(whitelist))
            }
            None => {
                let tool_path = project_root.join(TOOL_IGNORE_FILENAME);
                let tool = match RuleSource::load(
                    SourceKind::ToolIgnore,
                    project_root,
                    std::slice::from_ref(&tool_path),
                ) {
                    Ok(source) => source,
                    Err(e) => {
                        let warning = Warning::ToolIgnoreUnusable {
                            path: e.path,
                            source: e.error,
                        };
                        log::warn!("{}", warning);
                        load_warnings.push(warning);
                        None
                    }
                };
                (TraversalMode::Standard, tool, None)
            }
        };

        if force && mode == TraversalMode::Standard {
            log::debug!("--force has no effect without an include whitelist.");
        }

        let rules = RuleSet {
            vcs_ignore,
            tool_ignore,
            include_whitelist,
        };
        for source in rules.sources() {
            log::debug!(
                "{} source rooted at {}: {:?}",
                source.kind(),
                source.root().display(),
                source.files()
            );
        }

        Ok(Self {
            project_root: project_root.to_path_buf(),
            mode,
            force,
            rules,
            load_warnings,
        })
    }

    pub fn mode(&self) -> TraversalMode {
        self.mode
    }

    pub fn rules(&self) -> &RuleSet {
        &self.rules
    }

    /// Warnings raised while loading the rule sources.
    pub fn take_load_warnings(&mut self) -> Vec<Warning> {
        std::mem::take(&mut self.load_warnings)
    }

    fn chain(&self) -> &'static [(&'static str, Step)] {
        match self.mode {
            TraversalMode::Standard => STANDARD_CHAIN,
            TraversalMode::IncludeOnly => INCLUDE_ONLY_CHAIN,
        }
    }

    /// Step names in evaluation order for the active mode.
    pub fn precedence(&self) -> Vec<&'static str> {
        self.chain().iter().map(|(name, _)| *name).collect()
    }

    /// Classifies one entry, given its path relative to the project root.
    pub fn classify(&self, relative_path: &Path, kind: EntryKind) -> Decision {
        let candidate = Candidate {
            absolute: self.project_root.join(relative_path),
            relative: relative_path,
            kind,
        };
        for (name, step) in self.chain() {
            if let Some(decision) = step(self, &candidate) {
                log::trace!(
                    "{} -> {:?} (decided by {})",
                    relative_path.display(),
                    decision,
                    name
                );
                return decision;
            }
        }
        unreachable!("every precedence chain ends with the default step")
    }

    /// Picks up the `.gitignore` of a directory the walk is entering. A
    /// present file that cannot be used is fatal, like the root one.
    pub fn enter_directory(&mut self, relative_dir: &Path) -> Result<()> {
        self.rules
            .vcs_ignore
            .enter_directory(relative_dir)
            .map_err(AppError::from)
    }

    fn is_vcs_ignored(&self, c: &Candidate<'_>) -> bool {
        self.rules.vcs_ignore.is_ignored(c.relative, c.is_dir())
    }
}
