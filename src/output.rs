//! Writing a run's result to disk
//!
//! Files land in `<root>/<YYYY-MM-DD>/<name>/<model>/`, one directory per
//! run name and model so runs of the same spec against different models sit
//! side by side.

use anyhow::{bail, Context, Result};
use chrono::{Local, NaiveDate};
use specsmith_types::{AgentOutput, GeneratedFile};
use std::fs;
use std::path::{Component, Path, PathBuf};

/// File that holds the raw code when the run ended without packaging
pub const UNPACKAGED_FILE: &str = "unpackaged.txt";

#[derive(Debug, Clone)]
pub struct OutputWriter {
    dir: PathBuf,
}

impl OutputWriter {
    pub fn new(root: &Path, date: NaiveDate, name: &str, model: &str) -> Self {
        let dir = root
            .join(date.format("%Y-%m-%d").to_string())
            .join(path_segment(name))
            .join(path_segment(model));
        Self { dir }
    }

    pub fn for_today(root: &Path, name: &str, model: &str) -> Self {
        Self::new(root, Local::now().date_naive(), name, model)
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Write the run's result, returning every path written
    pub fn write(&self, output: &AgentOutput) -> Result<Vec<PathBuf>> {
        match output {
            AgentOutput::Packaged(result) => self.write_files(&result.files),
            AgentOutput::Unpackaged(code) => {
                Ok(vec![self.write_file(Path::new(UNPACKAGED_FILE), code)?])
            }
        }
    }

    /// Write generated files. Every path is checked before anything is written.
    pub fn write_files(&self, files: &[GeneratedFile]) -> Result<Vec<PathBuf>> {
        let relative = files
            .iter()
            .map(|file| safe_relative_path(&file.path))
            .collect::<Result<Vec<_>>>()?;

        relative
            .iter()
            .zip(files)
            .map(|(path, file)| self.write_file(path, &file.content))
            .collect()
    }

    fn write_file(&self, relative: &Path, content: &str) -> Result<PathBuf> {
        let target = self.dir.join(relative);
        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory {}", parent.display()))?;
        }
        fs::write(&target, content)
            .with_context(|| format!("Failed to write {}", target.display()))?;
        tracing::debug!(path = %target.display(), bytes = content.len(), "Wrote file");
        Ok(target)
    }
}

/// Validate a model-supplied path, which must stay inside the output directory
pub fn safe_relative_path(path: &str) -> Result<PathBuf> {
    let trimmed = path.trim();
    if trimmed.is_empty() {
        bail!("Generated file has an empty path");
    }

    let candidate = Path::new(trimmed);
    let mut clean = PathBuf::new();
    for component in candidate.components() {
        match component {
            Component::Normal(part) => clean.push(part),
            Component::CurDir => {}
            Component::ParentDir => {
                bail!("Generated file path '{}' escapes the output directory", path)
            }
            Component::RootDir | Component::Prefix(_) => {
                bail!("Generated file path '{}' is absolute", path)
            }
        }
    }

    if clean.as_os_str().is_empty() {
        bail!("Generated file path '{}' names no file", path);
    }
    Ok(clean)
}

/// Keep run names and model ids to a single directory level
fn path_segment(value: &str) -> String {
    let segment: String = value
        .trim()
        .chars()
        .map(|c| if matches!(c, '/' | '\\') { '-' } else { c })
        .collect();
    match segment.as_str() {
        "" | "." | ".." => "unnamed".to_string(),
        _ => segment,
    }
}
