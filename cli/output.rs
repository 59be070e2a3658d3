use anyhow::{Context, Result};
use colored::*;
use std::fs::{self, File};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

/// Where the finished concatenation goes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Sink {
    Stdout,
    File(PathBuf),
    Clipboard,
}

impl Sink {
    pub fn deliver(&self, content: &[u8], quiet: bool) -> Result<()> {
        match self {
            Sink::Stdout => write_to_stdout(content),
            Sink::File(path) => {
                write_to_file(path, content)?;
                if !quiet {
                    println!(
                        "{} Project content saved to: {}",
                        "✅".green(),
                        path.display().to_string().blue()
                    );
                }
                Ok(())
            }
            Sink::Clipboard => {
                copy_to_clipboard(content)?;
                if !quiet {
                    println!("{} Project content copied to clipboard!", "📋".green());
                }
                Ok(())
            }
        }
    }
}

fn write_to_file(path: &Path, content: &[u8]) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory {}", parent.display()))?;
    }
    let mut file =
        File::create(path).with_context(|| format!("Failed to create file {}", path.display()))?;
    file.write_all(content)
        .with_context(|| format!("Failed to write to file {}", path.display()))?;
    Ok(())
}

fn write_to_stdout(content: &[u8]) -> Result<()> {
    let stdout = io::stdout();
    let mut handle = stdout.lock();
    handle
        .write_all(content)
        .context("Failed to write to stdout")?;
    handle.flush().context("Failed to flush stdout")?;
    Ok(())
}

fn copy_to_clipboard(content: &[u8]) -> Result<()> {
    let text = String::from_utf8_lossy(content).into_owned();
    let mut clipboard = arboard::Clipboard::new().context("Failed to access the clipboard")?;
    clipboard
        .set_text(text)
        .context("Failed to copy to clipboard")?;
    Ok(())
}
