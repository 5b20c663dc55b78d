//! Uniform in-memory representation of parsed coverage documents. Parsers
//! produce a `CoverageData` per document; the merger consumes the flattened
//! class records of all documents.

/// Compute a coverage rate, returning 0.0 when the total is zero.
#[must_use]
pub fn rate(covered: u64, total: u64) -> f64 {
    if total == 0 {
        0.0
    } else {
        covered as f64 / total as f64
    }
}

/// A single line that was instrumentable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LineCoverage {
    pub line_number: u32,
    pub hit_count: u64,
}

/// Line coverage for one `<class>` element, tagged with its enclosing
/// package (assembly).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClassCoverage {
    pub package: String,
    pub name: String,
    pub filename: String,
    pub lines: Vec<LineCoverage>,
}

impl ClassCoverage {
    pub fn new(package: String, name: String, filename: String) -> Self {
        Self {
            package,
            name,
            filename,
            lines: Vec::new(),
        }
    }

    /// Number of lines with at least one hit.
    #[must_use]
    pub fn covered(&self) -> u64 {
        self.lines.iter().filter(|l| l.hit_count > 0).count() as u64
    }
}

/// The complete result of parsing a single coverage document.
#[derive(Debug, Clone, Default)]
pub struct CoverageData {
    pub classes: Vec<ClassCoverage>,
}

impl CoverageData {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn line_count(&self) -> usize {
        self.classes.iter().map(|c| c.lines.len()).sum()
    }
}

/// Flatten several parsed documents into one record sequence, preserving
/// document order and class order within each document.
pub fn flatten(reports: &[CoverageData]) -> Vec<ClassCoverage> {
    reports
        .iter()
        .flat_map(|r| r.classes.iter().cloned())
        .collect()
}
