use thiserror::Error;

#[derive(Error, Debug)]
pub enum CovgateError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("XML parse error at position {position}: {source}")]
    Xml {
        source: quick_xml::Error,
        position: usize,
    },

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Baseline error: {0}")]
    Baseline(#[from] serde_json::Error),

    #[error("No coverage files found")]
    NoCoverageFiles,

    #[error("No lines found in coverage data")]
    NoLines,

    #[error("{name}: {source}")]
    InDocument {
        name: String,
        source: Box<CovgateError>,
    },
}

pub type Result<T> = std::result::Result<T, CovgateError>;
