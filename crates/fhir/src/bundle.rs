//! Upsert-addressed transaction bundles.
//!
//! Every entry added through [`Bundle::add_entry`] is addressed by its literal reference
//! `<ResourceType>/<id>`, used both as `fullUrl` and as `request.url`, with the `PUT` verb.
//! Given stable ids (typically pseudonymised digests), reprocessing the same source data yields
//! the same addresses and verbs, so a receiving server can apply a bundle any number of times
//! and end up in the same state.
//!
//! Responsibilities:
//! - Define the domain-level bundle types used by mappers
//! - Define a strict wire model for JSON serialisation/deserialisation
//! - Translate between the two

use crate::{FhirError, FhirResult, Reference, Resource};
use serde::{Deserialize, Serialize};
use serde_json::Value;

// ============================================================================
// Public domain-level types
// ============================================================================

/// Bundle processing mode.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BundleType {
    /// All entries succeed or fail together.
    #[default]
    Transaction,
    /// Entries are processed independently.
    Batch,
}

/// HTTP verb of a bundle entry request.
///
/// Only `PUT` exists here: entries are always create-or-replace, never create-only.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum HttpVerb {
    #[default]
    #[serde(rename = "PUT")]
    Put,
}

/// Transactional request target of a bundle entry.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BundleEntryRequest {
    pub method: HttpVerb,
    pub url: String,
}

/// A single bundle entry.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BundleEntry {
    /// Self-reference of the entry, identical to `request.url`.
    #[serde(rename = "fullUrl")]
    pub full_url: String,

    /// The serialised resource.
    pub resource: Value,

    pub request: BundleEntryRequest,
}

/// An ordered collection of upsert-addressed entries.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Bundle {
    bundle_type: BundleType,
    entries: Vec<BundleEntry>,
}

impl Bundle {
    /// Creates an empty transaction bundle.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty bundle of the given type.
    pub fn with_type(bundle_type: BundleType) -> Self {
        Self {
            bundle_type,
            entries: Vec::new(),
        }
    }

    pub fn bundle_type(&self) -> BundleType {
        self.bundle_type
    }

    pub fn entries(&self) -> &[BundleEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Appends `resource` as an upsert entry and returns the bundle for chaining.
    ///
    /// The entry address is `<ResourceType>/<id>`; `fullUrl` and `request.url` both carry it and
    /// the request method is `PUT`. The resource id must already be assigned.
    ///
    /// # Errors
    ///
    /// Returns [`FhirError::InvalidInput`] if the resource has no id, or its type or id are not
    /// valid reference parts, and [`FhirError::Json`] if the resource fails to serialise.
    /// The bundle is left unchanged on error.
    pub fn add_entry<R: Resource + ?Sized>(&mut self, resource: &R) -> FhirResult<&mut Self> {
        let address = Reference::for_resource(resource)?.into_string();
        let resource = serde_json::to_value(resource)?;

        self.entries.push(BundleEntry {
            full_url: address.clone(),
            resource,
            request: BundleEntryRequest {
                method: HttpVerb::Put,
                url: address,
            },
        });

        Ok(self)
    }

    /// Returns `None` for an empty bundle, so callers can skip emitting it.
    pub fn into_non_empty(self) -> Option<Self> {
        if self.entries.is_empty() {
            None
        } else {
            Some(self)
        }
    }

    /// Render the bundle as FHIR JSON.
    ///
    /// # Errors
    ///
    /// Returns [`FhirError::Json`] if serialisation fails.
    pub fn render(&self) -> FhirResult<String> {
        let wire = BundleWire {
            resource_type: BUNDLE_RESOURCE_TYPE.to_string(),
            bundle_type: self.bundle_type,
            entry: self.entries.clone(),
        };
        Ok(serde_json::to_string(&wire)?)
    }

    /// Parse a bundle from FHIR JSON.
    ///
    /// Parsing is strict: unknown keys are rejected, every entry must use `PUT`, and each
    /// entry's `fullUrl` must equal its `request.url`.
    ///
    /// # Errors
    ///
    /// Returns [`FhirError::Translation`] naming the failing path if the JSON does not match the
    /// wire schema, and [`FhirError::InvalidInput`] if the bundle violates upsert addressing.
    pub fn parse(json_text: &str) -> FhirResult<Self> {
        let mut deserializer = serde_json::Deserializer::from_str(json_text);

        let wire = match serde_path_to_error::deserialize::<_, BundleWire>(&mut deserializer) {
            Ok(parsed) => parsed,
            Err(err) => {
                let path = err.path().to_string();
                let source = err.into_inner();
                let path = if path.is_empty() || path == "." {
                    "<root>"
                } else {
                    path.as_str()
                };
                return Err(FhirError::Translation(format!(
                    "Bundle schema mismatch at {path}: {source}"
                )));
            }
        };

        if wire.resource_type != BUNDLE_RESOURCE_TYPE {
            return Err(FhirError::InvalidInput(format!(
                "Expected resourceType 'Bundle', got '{}'",
                wire.resource_type
            )));
        }

        for (index, entry) in wire.entry.iter().enumerate() {
            if entry.full_url != entry.request.url {
                return Err(FhirError::InvalidInput(format!(
                    "entry {index}: fullUrl '{}' differs from request.url '{}'",
                    entry.full_url, entry.request.url
                )));
            }
        }

        Ok(Self {
            bundle_type: wire.bundle_type,
            entries: wire.entry,
        })
    }
}

// ============================================================================
// Wire types (internal)
// ============================================================================

const BUNDLE_RESOURCE_TYPE: &str = "Bundle";

/// Wire representation of a bundle.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
#[serde(deny_unknown_fields)]
struct BundleWire {
    #[serde(rename = "resourceType")]
    pub resource_type: String,

    #[serde(rename = "type")]
    pub bundle_type: BundleType,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub entry: Vec<BundleEntry>,
}
