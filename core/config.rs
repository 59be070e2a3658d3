use crate::error::{AppError, Result};
use log;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

pub const DEFAULT_CONFIG_FILENAME: &str = "procat.toml";
pub const TOOL_IGNORE_FILENAME: &str = ".procatignore";
pub const VCS_IGNORE_FILENAME: &str = ".gitignore";
pub const VCS_METADATA_DIR: &str = ".git";

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
#[serde(deny_unknown_fields)]
pub struct Config {
    #[serde(default)]
    pub filters: FiltersConfig,
    #[serde(default)]
    pub output: OutputConfig,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
#[serde(deny_unknown_fields)]
pub struct FiltersConfig {
    #[serde(default)]
    pub exclude_extensions: Vec<String>,
    #[serde(default)]
    pub include_file: Option<PathBuf>,
    #[serde(default)]
    pub force: bool,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
#[serde(deny_unknown_fields)]
pub struct OutputConfig {
    #[serde(default)]
    pub file: Option<PathBuf>,
    #[serde(default)]
    pub clipboard: bool,
}

/// Canonicalizes `project_root` and checks that it is a directory.
pub fn canonical_project_root(project_root: &Path) -> Result<PathBuf> {
    let canonical = project_root
        .canonicalize()
        .map_err(|e| AppError::ProjectRoot {
            path: project_root.to_path_buf(),
            reason: e.to_string(),
        })?;
    if !canonical.is_dir() {
        return Err(AppError::ProjectRoot {
            path: project_root.to_path_buf(),
            reason: "not a directory".to_string(),
        });
    }
    Ok(canonical)
}

impl Config {
    pub fn determine_project_root(cli_project_root: Option<&PathBuf>) -> Result<PathBuf> {
        let path_to_resolve = match cli_project_root {
            Some(p) => PathBuf::from(shellexpand::tilde(&p.to_string_lossy()).into_owned()),
            None => env::current_dir().map_err(AppError::Io)?,
        };
        canonical_project_root(&path_to_resolve)
    }

    pub fn resolve_config_path(
        project_root: &Path,
        cli_config_file: Option<&PathBuf>,
        cli_disable_config: bool,
    ) -> Result<Option<PathBuf>> {
        if cli_disable_config {
            log::debug!("Config file loading disabled via CLI flag.");
            return Ok(None);
        }

        match cli_config_file {
            Some(p) => {
                let path = PathBuf::from(shellexpand::tilde(&p.to_string_lossy()).into_owned());
                if !path.is_file() {
                    return Err(AppError::Config(format!(
                        "Specified config file not found at path: {}",
                        path.display()
                    )));
                }
                log::debug!("Using specified config file path: {}", path.display());
                Ok(Some(path))
            }
            None => {
                let default_path = project_root.join(DEFAULT_CONFIG_FILENAME);
                if default_path.is_file() {
                    log::debug!("Using default config file path: {}", default_path.display());
                    Ok(Some(default_path))
                } else {
                    log::debug!(
                        "No config file specified and default not found at: {}",
                        default_path.display()
                    );
                    Ok(None)
                }
            }
        }
    }

    /// Loads a config file. A relative `include_file` is resolved against the
    /// directory holding the config file.
    pub fn load_from_path(config_path: &Path) -> Result<Self> {
        log::info!("Loading configuration from: {}", config_path.display());
        let toml_content = fs::read_to_string(config_path).map_err(|e| AppError::FileRead {
            path: config_path.to_path_buf(),
            source: e,
        })?;
        let mut config = toml::from_str::<Config>(&toml_content).map_err(|e| {
            AppError::TomlParse(format!(
                "Error parsing config file '{}': {}. Check TOML syntax and structure.",
                config_path.display(),
                e
            ))
        })?;

        if let (Some(include), Some(base)) = (&config.filters.include_file, config_path.parent()) {
            if include.is_relative() {
                config.filters.include_file = Some(base.join(include));
            }
        }
        Ok(config)
    }

    pub fn extension_filters(&self) -> ExtensionFilters {
        ExtensionFilters::from_tokens(self.filters.exclude_extensions.iter().map(String::as_str))
    }

    /// The output path relative to the project root, when it can lie inside it.
    /// Relative paths are taken verbatim.
    pub fn output_exclusion(&self, project_root: &Path) -> Option<PathBuf> {
        let file = self.output.file.as_ref()?;
        if self.output.clipboard {
            return None;
        }
        if file.is_relative() {
            return Some(file.clone());
        }
        pathdiff::diff_paths(file, project_root).filter(|rel| !rel.starts_with(".."))
    }
}

/// Lower-cased, dot-prefixed file extensions excluded from output.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExtensionFilters {
    extensions: BTreeSet<String>,
}

impl ExtensionFilters {
    /// Accepts tokens such as `.md`, `MD` or `rs, toml`; every token may itself
    /// be a comma-separated list.
    pub fn from_tokens<'a, I>(tokens: I) -> Self
    where
        I: IntoIterator<Item = &'a str>,
    {
        let extensions = tokens
            .into_iter()
            .flat_map(|t| t.split(','))
            .map(str::trim)
            .filter(|t| !t.is_empty() && *t != ".")
            .map(|t| {
                let lower = t.to_lowercase();
                if lower.starts_with('.') {
                    lower
                } else {
                    format!(".{}", lower)
                }
            })
            .collect();
        Self { extensions }
    }

    pub fn is_empty(&self) -> bool {
        self.extensions.is_empty()
    }

    pub fn is_excluded(&self, path: &Path) -> bool {
        if self.extensions.is_empty() {
            return false;
        }
        path.extension()
            .map(|ext| format!(".{}", ext.to_string_lossy().to_lowercase()))
            .is_some_and(|ext| self.extensions.contains(&ext))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn extension_tokens_are_normalized() {
        let filters = ExtensionFilters::from_tokens([".MD", "rs, toml", " ", "."]);
        assert!(filters.is_excluded(Path::new("README.md")));
        assert!(filters.is_excluded(Path::new("src/lib.RS")));
        assert!(filters.is_excluded(Path::new("Cargo.toml")));
        assert!(!filters.is_excluded(Path::new("notes.txt")));
        assert!(!filters.is_excluded(Path::new("Makefile")));
    }

    #[test]
    fn extension_match_is_exact() {
        let filters = ExtensionFilters::from_tokens(["md"]);
        assert!(!filters.is_excluded(Path::new("page.mdx")));
        assert!(!filters.is_excluded(Path::new("md")));
        assert!(ExtensionFilters::default().is_empty());
    }

    #[test]
    fn load_config_resolves_include_file_next_to_config() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(DEFAULT_CONFIG_FILENAME);
        fs::write(
            &path,
            r#"
[filters]
exclude_extensions = [".lock"]
include_file = "procat.include"
force = true

[output]
file = "snapshot.txt"
"#,
        )
        .unwrap();

        let config = Config::load_from_path(&path).unwrap();
        assert_eq!(
            config.filters.include_file,
            Some(dir.path().join("procat.include"))
        );
        assert!(config.filters.force);
        assert_eq!(config.output.file, Some(PathBuf::from("snapshot.txt")));
        assert!(config.extension_filters().is_excluded(Path::new("Cargo.LOCK")));
    }

    #[test]
    fn load_config_rejects_unknown_fields() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(DEFAULT_CONFIG_FILENAME);
        fs::write(&path, "[filters]\nunknown = 1\n").unwrap();
        assert!(matches!(
            Config::load_from_path(&path),
            Err(AppError::TomlParse(_))
        ));
    }

    #[test]
    fn resolve_config_path_prefers_default_and_honors_disable() {
        let dir = TempDir::new().unwrap();
        assert_eq!(Config::resolve_config_path(dir.path(), None, false).unwrap(), None);

        let default_path = dir.path().join(DEFAULT_CONFIG_FILENAME);
        fs::write(&default_path, "").unwrap();
        assert_eq!(
            Config::resolve_config_path(dir.path(), None, false).unwrap(),
            Some(default_path)
        );
        assert_eq!(Config::resolve_config_path(dir.path(), None, true).unwrap(), None);

        let missing = dir.path().join("missing.toml");
        assert!(matches!(
            Config::resolve_config_path(dir.path(), Some(&missing), false),
            Err(AppError::Config(_))
        ));
    }

    #[test]
    fn project_root_must_be_a_directory() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("plain.txt");
        fs::write(&file, "x").unwrap();

        assert!(Config::determine_project_root(Some(&dir.path().to_path_buf())).is_ok());
        assert!(matches!(
            Config::determine_project_root(Some(&file)),
            Err(AppError::ProjectRoot { .. })
        ));
        assert!(matches!(
            Config::determine_project_root(Some(&dir.path().join("nope"))),
            Err(AppError::ProjectRoot { .. })
        ));
        assert_eq!(
            canonical_project_root(&dir.path().join(".")).unwrap(),
            dir.path().canonicalize().unwrap()
        );
        assert!(matches!(
            canonical_project_root(&file),
            Err(AppError::ProjectRoot { .. })
        ));
    }

    #[test]
    fn output_exclusion_is_relative_to_root() {
        let root = Path::new("/work/project");
        let mut config = Config::default();
        assert_eq!(config.output_exclusion(root), None);

        config.output.file = Some(PathBuf::from("out.txt"));
        assert_eq!(config.output_exclusion(root), Some(PathBuf::from("out.txt")));

        config.output.file = Some(PathBuf::from("/work/project/dump/out.txt"));
        assert_eq!(
            config.output_exclusion(root),
            Some(PathBuf::from("dump/out.txt"))
        );

        config.output.file = Some(PathBuf::from("/elsewhere/out.txt"));
        assert_eq!(config.output_exclusion(root), None);

        config.output.file = Some(PathBuf::from("out.txt"));
        config.output.clipboard = true;
        assert_eq!(config.output_exclusion(root), None);
    }
}
