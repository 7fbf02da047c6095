/// Errors that can occur when creating validated digest types.
#[derive(Debug, thiserror::Error)]
pub enum HashError {
    /// The input was not exactly 64 lowercase hexadecimal characters
    #[error("SHA-256 digest must be 64 lowercase hex characters, got: '{0}'")]
    NotCanonical(String),
}

/// A SHA-256 digest in canonical form.
///
/// This type wraps a `String` and guarantees it holds exactly 64 lowercase hexadecimal
/// characters. Pseudonymised identifiers and the resource ids derived from them are carried as
/// `Sha256Hash` so that a raw (unhashed) identifier can never be passed where a token is expected.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Sha256Hash(String);

impl Sha256Hash {
    /// Wraps the raw output of a SHA-256 hasher.
    pub fn from_bytes(bytes: &[u8; 32]) -> Self {
        Self(hex::encode(bytes))
    }

    /// Validates and wraps a hex digest string.
    ///
    /// Uppercase input is rejected rather than normalised; callers that derive resource ids from
    /// digests rely on a single spelling per digest.
    ///
    /// # Errors
    ///
    /// Returns [`HashError::NotCanonical`] if `input` is not 64 lowercase hex characters.
    pub fn parse(input: &str) -> Result<Self, HashError> {
        if Self::is_canonical(input) {
            return Ok(Self(input.to_owned()));
        }
        Err(HashError::NotCanonical(input.to_owned()))
    }

    /// Returns true if `input` is a canonical digest string.
    pub fn is_canonical(input: &str) -> bool {
        input.len() == 64
            && input
                .bytes()
                .all(|b| matches!(b, b'0'..=b'9' | b'a'..=b'f'))
    }

    /// Returns the digest as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for Sha256Hash {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl AsRef<str> for Sha256Hash {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl std::str::FromStr for Sha256Hash {
    type Err = HashError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Sha256Hash::parse(s)
    }
}

impl serde::Serialize for Sha256Hash {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> serde::Deserialize<'de> for Sha256Hash {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Sha256Hash::parse(&s).map_err(serde::de::Error::custom)
    }
}
