//! The resource seam between mappers and the bundle assembler.

use crate::{FhirError, FhirResult, Reference, Sha256Hash};
use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};
use serde_json::{Map, Value};

/// A FHIR resource ready to be placed in an output bundle.
///
/// Mappers implement this for their own resource types. The serialised form is what ends up in
/// `entry[].resource`; it is expected to carry `resourceType` and `id` itself.
pub trait Resource: Serialize {
    /// The FHIR resource type name, for example `"Observation"`.
    fn resource_type(&self) -> &str;

    /// The logical id, if one has been assigned.
    fn id(&self) -> Option<&str>;

    /// The literal reference addressing this resource.
    fn reference(&self) -> FhirResult<Reference> {
        Reference::for_resource(self)
    }
}

/// A resource held as a type name, an optional id and an untyped JSON body.
///
/// Useful for mappers that build resources field by field and for replaying bundles whose
/// entries were parsed back from JSON.
#[derive(Clone, Debug, PartialEq)]
pub struct GenericResource {
    resource_type: String,
    id: Option<String>,
    body: Map<String, Value>,
}

impl GenericResource {
    /// Creates an empty resource of the given type with no id.
    pub fn new(resource_type: impl Into<String>) -> Self {
        Self {
            resource_type: resource_type.into(),
            id: None,
            body: Map::new(),
        }
    }

    /// Sets the logical id.
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    /// Sets the logical id to a pseudonymised digest.
    pub fn with_hashed_id(self, hash: &Sha256Hash) -> Self {
        self.with_id(hash.as_str())
    }

    /// Sets a top-level field. `resourceType` and `id` are managed separately and ignored here.
    pub fn with_field(mut self, key: impl Into<String>, value: Value) -> Self {
        let key = key.into();
        if key != "resourceType" && key != "id" {
            self.body.insert(key, value);
        }
        self
    }

    /// Returns a top-level field of the body.
    pub fn field(&self, key: &str) -> Option<&Value> {
        self.body.get(key)
    }

    /// Builds a resource from its JSON form.
    ///
    /// # Errors
    ///
    /// Returns [`FhirError::Translation`] if `value` is not an object, has no string
    /// `resourceType`, or has a non-string `id`.
    pub fn from_json(value: Value) -> FhirResult<Self> {
        let Value::Object(mut body) = value else {
            return Err(FhirError::Translation(
                "resource must be a JSON object".into(),
            ));
        };

        let resource_type = match body.remove("resourceType") {
            Some(Value::String(t)) => t,
            _ => {
                return Err(FhirError::Translation(
                    "resource is missing a string resourceType".into(),
                ))
            }
        };

        let id = match body.remove("id") {
            None => None,
            Some(Value::String(id)) => Some(id),
            Some(_) => {
                return Err(FhirError::Translation(format!(
                    "{resource_type} resource has a non-string id"
                )))
            }
        };

        Ok(Self {
            resource_type,
            id,
            body,
        })
    }
}

impl Resource for GenericResource {
    fn resource_type(&self) -> &str {
        &self.resource_type
    }

    fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }
}

impl Serialize for GenericResource {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut map = serializer.serialize_map(None)?;
        map.serialize_entry("resourceType", &self.resource_type)?;
        if let Some(id) = &self.id {
            map.serialize_entry("id", id)?;
        }
        for (key, value) in &self.body {
            map.serialize_entry(key, value)?;
        }
        map.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn serialises_type_and_id_first() {
        let resource = GenericResource::new("Observation")
            .with_id("obs1")
            .with_field("status", json!("final"));

        let json = serde_json::to_string(&resource).expect("serialise resource");
        assert_eq!(
            json,
            r#"{"resourceType":"Observation","id":"obs1","status":"final"}"#
        );
    }

    #[test]
    fn with_field_ignores_managed_keys() {
        let resource = GenericResource::new("Condition")
            .with_field("resourceType", json!("Patient"))
            .with_field("id", json!("sneaky"));

        assert_eq!(resource.resource_type(), "Condition");
        assert_eq!(resource.id(), None);
        assert!(resource.field("resourceType").is_none());
    }

    #[test]
    fn with_hashed_id_uses_digest_text() {
        let hash = Sha256Hash::from_bytes(&[0x01; 32]);
        let resource = GenericResource::new("Patient").with_hashed_id(&hash);
        assert_eq!(resource.id(), Some(hash.as_str()));
        assert_eq!(
            resource.reference().expect("reference").as_str(),
            format!("Patient/{hash}")
        );
    }

    #[test]
    fn from_json_round_trips_through_serialise() {
        let value = json!({
            "resourceType": "MedicationStatement",
            "id": "ms1",
            "status": "completed",
            "partOf": [{ "reference": "MedicationStatement/root" }]
        });

        let resource = GenericResource::from_json(value.clone()).expect("parse resource");
        assert_eq!(resource.resource_type(), "MedicationStatement");
        assert_eq!(resource.id(), Some("ms1"));
        assert_eq!(serde_json::to_value(&resource).expect("serialise"), value);
    }

    #[test]
    fn from_json_rejects_missing_resource_type() {
        let err = GenericResource::from_json(json!({ "id": "x" })).expect_err("no type");
        assert!(matches!(err, FhirError::Translation(_)));

        let err = GenericResource::from_json(json!(["not", "an", "object"])).expect_err("array");
        assert!(matches!(err, FhirError::Translation(_)));
    }
}
