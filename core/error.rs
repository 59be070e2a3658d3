use std::path::PathBuf;
use thiserror::Error;

pub type Result<T, E = AppError> = std::result::Result<T, E>;

/// Fatal errors. Any of these aborts the run before output is produced.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum AppError {
    #[error("Configuration Error: {0}")]
    Config(String),

    #[error("TOML Parsing Error: {0}")]
    TomlParse(String),

    #[error("Filesystem Error: {0}")]
    Io(#[from] std::io::Error),

    #[error("File Read Error: Path '{path}', Error: {source}")]
    FileRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid Project Root: Path '{path}', {reason}")]
    ProjectRoot { path: PathBuf, reason: String },

    #[error("WalkDir Error: {0}")]
    WalkDir(String),

    #[error("Ignore File Error: Path '{path}', Error: {source}")]
    IgnoreFile {
        path: PathBuf,
        #[source]
        source: ignore::Error,
    },
}

impl From<walkdir::Error> for AppError {
    fn from(err: walkdir::Error) -> Self {
        AppError::WalkDir(err.to_string())
    }
}

/// Recoverable conditions reported on the side channel. None of these stop
/// the traversal.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum Warning {
    #[error("Skipping unreadable file {}: {source}", .path.display())]
    UnreadableFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(
        "Skipping {}: it is whitelisted but also ignored by git (use --force to include it)",
        .path.display()
    )]
    IgnoredByVcs { path: PathBuf },

    #[error("Ignoring unusable tool-ignore file {}: {source}", .path.display())]
    ToolIgnoreUnusable {
        path: PathBuf,
        #[source]
        source: ignore::Error,
    },
}

impl Warning {
    pub fn path(&self) -> &std::path::Path {
        match self {
            Warning::UnreadableFile { path, .. }
            | Warning::IgnoredByVcs { path }
            | Warning::ToolIgnoreUnusable { path, .. } => path,
        }
    }
}
