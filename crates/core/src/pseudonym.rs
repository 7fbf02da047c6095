//! Salted one-way pseudonymisation of identifiers.
//!
//! Patient, condition and observation identifiers are hashed as
//! `sha256(<system> "|" <value>)`, where `<system>` is the configured identifier system for the
//! kind. Surrogate identifiers are hashed without a salt. Any other kind is not pseudonymised.
//!
//! Digests are deterministic for a fixed configuration, which is what makes resource ids derived
//! from them stable across reprocessing.

use crate::constants::SALT_SEPARATOR;
use crate::CoreConfig;
use onko_types::Sha256Hash;
use sha2::{Digest, Sha256};
use std::collections::HashMap;

/// Which kind of identifier is being pseudonymised.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum IdentifierKind {
    PatientId,
    ConditionId,
    ObservationId,
    SurrogateId,
    Unknown,
}

impl IdentifierKind {
    /// Maps a resource-type style tag (`"Patient"`, `"Condition"`, `"Observation"`,
    /// `"Surrogate"`) to a kind. Unrecognised tags map to [`IdentifierKind::Unknown`].
    pub fn from_tag(tag: &str) -> Self {
        match tag {
            "Patient" => Self::PatientId,
            "Condition" => Self::ConditionId,
            "Observation" => Self::ObservationId,
            "Surrogate" => Self::SurrogateId,
            _ => Self::Unknown,
        }
    }

    /// The tag accepted by [`IdentifierKind::from_tag`], or `None` for `Unknown`.
    pub fn tag(self) -> Option<&'static str> {
        match self {
            Self::PatientId => Some("Patient"),
            Self::ConditionId => Some("Condition"),
            Self::ObservationId => Some("Observation"),
            Self::SurrogateId => Some("Surrogate"),
            Self::Unknown => None,
        }
    }
}

#[derive(Clone, Debug)]
enum Salting {
    Salted(String),
    Unsalted,
}

/// Hashes identifiers using salts resolved once from configuration.
#[derive(Clone, Debug)]
pub struct Pseudonymizer {
    salting: HashMap<IdentifierKind, Salting>,
}

impl Pseudonymizer {
    pub fn new(config: &CoreConfig) -> Self {
        let systems = config.systems();
        let salting = HashMap::from([
            (
                IdentifierKind::PatientId,
                Salting::Salted(systems.patient_id.clone()),
            ),
            (
                IdentifierKind::ConditionId,
                Salting::Salted(systems.condition_id.clone()),
            ),
            (
                IdentifierKind::ObservationId,
                Salting::Salted(systems.observation_id.clone()),
            ),
            (IdentifierKind::SurrogateId, Salting::Unsalted),
        ]);

        Self { salting }
    }

    /// Returns the digest of `value` for `kind`, or `None` if the kind is not pseudonymised.
    ///
    /// `None` means "leave this identifier alone"; it is not an error.
    pub fn pseudonymize(&self, kind: IdentifierKind, value: &str) -> Option<Sha256Hash> {
        let mut hasher = Sha256::new();
        match self.salting.get(&kind)? {
            Salting::Salted(salt) => {
                hasher.update(salt.as_bytes());
                hasher.update(SALT_SEPARATOR.as_bytes());
            }
            Salting::Unsalted => {}
        }
        hasher.update(value.as_bytes());

        let hash_array: [u8; 32] = hasher.finalize().into();
        Some(Sha256Hash::from_bytes(&hash_array))
    }

    /// Like [`Pseudonymizer::pseudonymize`], dispatching on a string tag.
    pub fn pseudonymize_tagged(&self, tag: &str, value: &str) -> Option<Sha256Hash> {
        self.pseudonymize(IdentifierKind::from_tag(tag), value)
    }
}
