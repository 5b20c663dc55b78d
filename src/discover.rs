//! Locating coverage documents on disk.
//!
//! The core only needs "a list of documents". [`ReportSource`] abstracts
//! where they come from so the merge and gate logic can be exercised
//! without touching the filesystem.
use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use crate::error::{CovgateError, Result};

/// A coverage document read into memory.
#[derive(Debug, Clone)]
pub struct Document {
    /// Where it came from, for diagnostics.
    pub name: String,
    pub content: Vec<u8>,
}

impl Document {
    pub fn read(path: &Path) -> Result<Self> {
        let content = std::fs::read(path)?;
        Ok(Self {
            name: path.display().to_string(),
            content,
        })
    }
}

/// A source of coverage documents.
pub trait ReportSource {
    /// Fetch every document. An empty result means nothing was found; it is
    /// up to the caller to treat that as a failure.
    fn documents(&self) -> Result<Vec<Document>>;
}

impl ReportSource for Vec<Document> {
    fn documents(&self) -> Result<Vec<Document>> {
        Ok(self.clone())
    }
}

/// Files named explicitly on the command line.
pub struct ExplicitFiles(pub Vec<PathBuf>);

impl ReportSource for ExplicitFiles {
    fn documents(&self) -> Result<Vec<Document>> {
        self.0.iter().map(|p| Document::read(p)).collect()
    }
}

/// Recursive search for files with a fixed name under an ordered list of
/// roots. Roots are tried in order and the first one that yields any file
/// wins; later roots are only a fallback.
pub struct SearchRoots {
    pub roots: Vec<PathBuf>,
    pub file_name: String,
}

impl SearchRoots {
    pub fn new(roots: Vec<PathBuf>, file_name: impl Into<String>) -> Self {
        Self {
            roots,
            file_name: file_name.into(),
        }
    }

    /// Paths found under the first productive root, sorted.
    pub fn find(&self) -> Result<Vec<PathBuf>> {
        for root in &self.roots {
            let found = find_under(root, &self.file_name)?;
            debug!(root = %root.display(), found = found.len(), "searched for coverage files");
            if !found.is_empty() {
                return Ok(found);
            }
        }
        Ok(Vec::new())
    }
}

impl ReportSource for SearchRoots {
    fn documents(&self) -> Result<Vec<Document>> {
        let paths = self.find()?;
        info!(files = paths.len(), "discovered coverage files");
        paths.iter().map(|p| Document::read(p)).collect()
    }
}

fn find_under(root: &Path, file_name: &str) -> Result<Vec<PathBuf>> {
    let root = root.to_string_lossy();
    let pattern = format!(
        "{}/**/{}",
        glob::Pattern::escape(root.trim_end_matches('/')),
        glob::Pattern::escape(file_name)
    );

    let entries = glob::glob(&pattern)
        .map_err(|e| CovgateError::Parse(format!("invalid search pattern '{pattern}': {e}")))?;

    // An unreadable directory only hides what is below it; documents that
    // are found but cannot be read still fail in `Document::read`.
    let mut found = Vec::new();
    for entry in entries {
        match entry {
            Ok(path) if path.is_file() => found.push(path),
            Ok(_) => {}
            Err(e) => warn!(path = %e.path().display(), error = %e.error(), "skipping unreadable path"),
        }
    }
    found.sort();
    Ok(found)
}
