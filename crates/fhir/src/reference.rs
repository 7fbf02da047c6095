//! Literal resource references.
//!
//! A reference is the relative address `<ResourceType>/<id>`. The same string serves as a bundle
//! entry's `fullUrl`, as its `request.url`, and as the `reference` value other resources use to
//! point at it (for example a part-of link to a canonical root resource).

use crate::{FhirError, FhirResult, Resource};
use serde_json::{json, Value};

/// Maximum length of a FHIR logical id.
const MAX_ID_LEN: usize = 64;

/// A validated relative reference `<ResourceType>/<id>`.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Reference(String);

impl Reference {
    /// Builds a reference from a resource type and logical id.
    ///
    /// # Errors
    ///
    /// Returns [`FhirError::InvalidInput`] if:
    /// - `resource_type` is empty, does not start with an uppercase letter, or is not alphanumeric,
    /// - `id` is empty, longer than 64 characters, or contains characters outside
    ///   `A-Z a-z 0-9 - .`
    pub fn to(resource_type: &str, id: &str) -> FhirResult<Self> {
        validate_resource_type(resource_type)?;
        validate_id(id)?;
        Ok(Self(format!("{resource_type}/{id}")))
    }

    /// Builds the reference addressing `resource`.
    ///
    /// # Errors
    ///
    /// Returns [`FhirError::InvalidInput`] if the resource has no id assigned yet, or if its
    /// type or id fail validation (see [`Reference::to`]).
    pub fn for_resource<R: Resource + ?Sized>(resource: &R) -> FhirResult<Self> {
        let resource_type = resource.resource_type();
        let id = resource.id().ok_or_else(|| {
            FhirError::InvalidInput(format!(
                "{resource_type} resource has no id; ids must be assigned before bundling"
            ))
        })?;
        Self::to(resource_type, id)
    }

    /// Returns the reference as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns the resource type part.
    pub fn resource_type(&self) -> &str {
        self.0.split_once('/').map(|(t, _)| t).unwrap_or_default()
    }

    /// Returns the logical id part.
    pub fn id(&self) -> &str {
        self.0.split_once('/').map(|(_, id)| id).unwrap_or_default()
    }

    /// Renders the reference as a FHIR `Reference` datatype (`{"reference": "..."}`).
    pub fn to_json(&self) -> Value {
        json!({ "reference": self.0 })
    }

    /// Consumes the reference, returning the address string.
    pub fn into_string(self) -> String {
        self.0
    }
}

impl std::fmt::Display for Reference {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

fn validate_resource_type(resource_type: &str) -> FhirResult<()> {
    let mut chars = resource_type.chars();
    let starts_upper = chars.next().is_some_and(|c| c.is_ascii_uppercase());
    if !starts_upper || !chars.all(|c| c.is_ascii_alphanumeric()) {
        return Err(FhirError::InvalidInput(format!(
            "invalid resource type: '{resource_type}'"
        )));
    }
    Ok(())
}

fn validate_id(id: &str) -> FhirResult<()> {
    if id.is_empty() || id.len() > MAX_ID_LEN {
        return Err(FhirError::InvalidInput(format!(
            "resource id must be 1-{MAX_ID_LEN} characters, got {}",
            id.len()
        )));
    }
    if !id
        .bytes()
        .all(|b| b.is_ascii_alphanumeric() || b == b'-' || b == b'.')
    {
        return Err(FhirError::InvalidInput(format!(
            "resource id contains invalid characters: '{id}'"
        )));
    }
    Ok(())
}
