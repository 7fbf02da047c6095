#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
    #[error("failed to read configuration file: {0}")]
    ConfigRead(std::io::Error),
    #[error("malformed notification batch: {0}")]
    MalformedBatch(String),
    #[error("report group {report_group_id} is missing required field {field}")]
    MissingField {
        report_group_id: i64,
        field: &'static str,
    },
    #[error("FHIR error: {0}")]
    Fhir(#[from] fhir::FhirError),
}

pub type CoreResult<T> = std::result::Result<T, CoreError>;
