use super::source::{RuleSource, SourceKind, SourceLoadError};
use crate::config::{VCS_IGNORE_FILENAME, VCS_METADATA_DIR};
use ignore::Match;
use ignore::gitignore::Glob;
use log;
use std::path::{Path, PathBuf};

/// Git ignore rules for one project, kept as one layer per directory that
/// holds a `.gitignore`.
///
/// The root layer combines `.git/info/exclude` and the root `.gitignore`
/// (the latter wins). Nested layers are added as the walk enters their
/// directory; a layer applies only below its own directory and deeper layers
/// take precedence over shallower ones. A path below an ignored directory is
/// ignored whatever deeper layers say, as in git.
#[derive(Debug, Default)]
pub struct VcsIgnore {
    project_root: PathBuf,
    layers: Vec<RuleSource>,
}

impl VcsIgnore {
    /// Loads the root layer. Absent files are fine; a present file that
    /// cannot be read or parsed is an error.
    pub fn load(project_root: &Path) -> Result<Self, SourceLoadError> {
        let candidates = [
            project_root.join(VCS_METADATA_DIR).join("info").join("exclude"),
            project_root.join(VCS_IGNORE_FILENAME),
        ];
        let root_layer = RuleSource::load(SourceKind::VcsIgnore, project_root, &candidates)?;
        Ok(Self {
            project_root: project_root.to_path_buf(),
            layers: root_layer.into_iter().collect(),
        })
    }

    /// Adds the layer for `relative_dir` if it holds a `.gitignore`. Calling
    /// it again for the same directory is a no-op.
    pub fn enter_directory(&mut self, relative_dir: &Path) -> Result<(), SourceLoadError> {
        if relative_dir.as_os_str().is_empty() {
            return Ok(());
        }
        let dir = self.project_root.join(relative_dir);
        if self.layers.iter().any(|layer| layer.root() == dir) {
            return Ok(());
        }
        let candidate = dir.join(VCS_IGNORE_FILENAME);
        if let Some(layer) =
            RuleSource::load(SourceKind::VcsIgnore, &dir, std::slice::from_ref(&candidate))?
        {
            log::debug!(
                "Nested {} layer with {} pattern(s) at {}",
                SourceKind::VcsIgnore,
                layer.len(),
                relative_dir.display()
            );
            self.layers.push(layer);
        }
        Ok(())
    }

    pub fn layers(&self) -> &[RuleSource] {
        &self.layers
    }

    pub fn is_empty(&self) -> bool {
        self.layers.is_empty()
    }

    /// True when git would ignore `relative_path`.
    pub fn is_ignored(&self, relative_path: &Path, is_dir: bool) -> bool {
        if self.layers.is_empty() {
            return false;
        }
        let parent_ignored = relative_path
            .ancestors()
            .skip(1)
            .filter(|ancestor| !ancestor.as_os_str().is_empty())
            .any(|ancestor| {
                self.matched(&self.project_root.join(ancestor), true)
                    .is_ignore()
            });
        parent_ignored
            || self
                .matched(&self.project_root.join(relative_path), is_dir)
                .is_ignore()
    }

    // Layers are pushed in walk order, so the layers applying to a path are
    // ordered shallow to deep.
    fn matched(&self, path: &Path, is_dir: bool) -> Match<&Glob> {
        self.layers
            .iter()
            .rev()
            .map(|layer| layer.matched(path, is_dir))
            .find(|m| !m.is_none())
            .unwrap_or(Match::None)
    }
}
