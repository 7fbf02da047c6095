//! Constants used throughout the onko core crate.
//!
//! Default identifier systems and the well-known report reason codes of the cancer registry
//! export format.

/// Default system (and pseudonymisation salt) for patient identifiers.
pub const DEFAULT_PATIENT_ID_SYSTEM: &str = "https://fhir.example.org/identifiers/onko-patient-id";

/// Default system (and pseudonymisation salt) for condition identifiers.
pub const DEFAULT_CONDITION_ID_SYSTEM: &str =
    "https://fhir.example.org/identifiers/onko-condition-id";

/// Default system (and pseudonymisation salt) for observation identifiers.
pub const DEFAULT_OBSERVATION_ID_SYSTEM: &str =
    "https://fhir.example.org/identifiers/onko-observation-id";

/// Separator placed between salt and raw value before hashing.
pub const SALT_SEPARATOR: &str = "|";

/// Report reason codes (why a notification was issued).
pub mod reason {
    /// Initial diagnosis report.
    pub const DIAGNOSIS: &str = "diagnose";
    /// Histology or cytology finding.
    pub const HISTOLOGY: &str = "histologie_zytologie";
    /// Start of a treatment.
    pub const TREATMENT_START: &str = "behandlungsbeginn";
    /// End of a treatment.
    pub const TREATMENT_END: &str = "behandlungsende";
    /// Change of disease status.
    pub const STATUS_CHANGE: &str = "statusaenderung";
    /// Routine status report.
    pub const STATUS_REPORT: &str = "statusmeldung";
    /// Death of the patient.
    pub const DEATH: &str = "tod";
}
