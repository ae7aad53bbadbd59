#[derive(Debug, thiserror::Error)]
pub enum ConsentError {
    #[error("Storage unavailable: {0}")]
    StorageUnavailable(String),

    #[error("Malformed stored record for key '{key}': {value}")]
    MalformedRecord { key: String, value: String },

    #[error("Reporting failure: {0}")]
    ReportingFailure(String),
}
