use thiserror::Error;

#[derive(Debug, Error)]
pub enum SuiteError {
    #[error("unknown suite '{name}' (expected one of: {known}, all)")]
    UnknownSuite { name: String, known: String },

    #[error("no suites selected")]
    NoSuites,
}

#[derive(Debug, Error)]
pub enum ReportError {
    #[error("failed to write report to {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to encode report: {0}")]
    Encode(#[from] serde_json::Error),
}
