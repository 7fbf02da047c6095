//! FHIR-aligned output support for the oncology reconciliation core.
//!
//! This crate provides the **output primitives** every resource-specific mapper hands its
//! finished resources to:
//! - the [`Resource`] seam that mapped resources implement
//! - [`Reference`] addresses of the form `<ResourceType>/<id>`
//! - transaction [`Bundle`]s whose entries are upsert-addressed and safe to replay
//!
//! This crate does NOT model individual clinical resources (medication statements, conditions,
//! observations). Those are owned by the mappers; here a resource is anything that can report
//! its type and id and serialise to JSON.

pub mod bundle;
pub mod reference;
pub mod resource;

pub use bundle::{Bundle, BundleEntry, BundleEntryRequest, BundleType, HttpVerb};
pub use reference::Reference;
pub use resource::{GenericResource, Resource};

pub use onko_types::Sha256Hash;

/// Errors returned by the `fhir` output crate.
#[derive(Debug, thiserror::Error)]
pub enum FhirError {
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("translation error: {0}")]
    Translation(String),
}

/// Type alias for Results that can fail with a [`FhirError`].
pub type FhirResult<T> = Result<T, FhirError>;
