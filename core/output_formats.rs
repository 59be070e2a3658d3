use std::fmt;
use std::path::{Path, PathBuf};

pub const START_MARKER: &str = "// Start";
pub const END_MARKER: &str = "// End";
pub const BINARY_MARKER: &str = "// Skipping binary file:";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordKind {
    Content,
    Binary,
}

impl fmt::Display for RecordKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecordKind::Content => f.write_str("content"),
            RecordKind::Binary => f.write_str("binary"),
        }
    }
}

/// One unit of output, produced once per emitted file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutputRecord {
    Content { path: PathBuf, bytes: Vec<u8> },
    BinarySkipped { path: PathBuf },
}

impl OutputRecord {
    /// Builds the record for freshly read file content. A single null byte
    /// anywhere marks the file as binary and its bytes are dropped.
    pub fn from_content(path: PathBuf, bytes: Vec<u8>) -> Self {
        if bytes.contains(&0) {
            OutputRecord::BinarySkipped { path }
        } else {
            OutputRecord::Content { path, bytes }
        }
    }

    pub fn path(&self) -> &Path {
        match self {
            OutputRecord::Content { path, .. } | OutputRecord::BinarySkipped { path } => path,
        }
    }

    pub fn kind(&self) -> RecordKind {
        match self {
            OutputRecord::Content { .. } => RecordKind::Content,
            OutputRecord::BinarySkipped { .. } => RecordKind::Binary,
        }
    }

    /// Appends the delimited form of this record to `out`.
    pub fn write_to(&self, out: &mut Vec<u8>) {
        match self {
            OutputRecord::Content { path, bytes } => {
                let path = path.display();
                out.extend_from_slice(format!("{} {}\n", START_MARKER, path).as_bytes());
                out.extend_from_slice(bytes);
                out.extend_from_slice(format!("\n{} {}\n\n", END_MARKER, path).as_bytes());
            }
            OutputRecord::BinarySkipped { path } => {
                out.extend_from_slice(
                    format!("{} {}\n\n", BINARY_MARKER, path.display()).as_bytes(),
                );
            }
        }
    }
}
