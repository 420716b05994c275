use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};

use uuid::Uuid;

use crate::config::HostEnvironment;
use crate::error::{AppError, Result};

/// Appends step outputs to the file named by `GITHUB_OUTPUT`.
#[derive(Debug, Clone)]
pub struct OutputWriter {
    path: PathBuf,
}

impl OutputWriter {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn from_host(host: &HostEnvironment) -> Result<Self> {
        host.output_path
            .as_ref()
            .map(|path| Self::new(path.clone()))
            .ok_or_else(|| AppError::Config("GITHUB_OUTPUT is not set".to_string()))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Write `name=value`.
    pub fn set_output(&self, name: &str, value: &str) -> Result<()> {
        self.append(&format!("{name}={value}\n"))
    }

    /// Write `value` as a heredoc block so it may span several lines.
    pub fn set_multiline_output(&self, name: &str, value: &str) -> Result<()> {
        let delimiter = loop {
            let candidate = format!("ghadelimiter_{}", Uuid::new_v4());
            if !value.contains(&candidate) {
                break candidate;
            }
        };

        self.append(&format!("{name}<<{delimiter}\n{value}\n{delimiter}\n"))
    }

    fn append(&self, text: &str) -> Result<()> {
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(|e| {
                AppError::Output(format!("Failed to open {}: {e}", self.path.display()))
            })?;

        file.write_all(text.as_bytes()).map_err(|e| {
            AppError::Output(format!("Failed to write to {}: {e}", self.path.display()))
        })
    }
}
