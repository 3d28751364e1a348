use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::error::ModelError;

/// Number of random bytes behind a job token.
pub const JOB_ID_BYTES: usize = 32;

/// Opaque job token: 32 bytes from the thread CSPRNG, lowercase hex.
#[derive(
    Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct JobId(String);

impl JobId {
    pub fn generate() -> Self {
        let bytes: [u8; JOB_ID_BYTES] = rand::random();
        Self(hex::encode(bytes))
    }

    /// Validates the token shape produced by [`JobId::generate`].
    pub fn parse(raw: &str) -> Result<Self, ModelError> {
        let raw = raw.trim();
        let well_formed = raw.len() == JOB_ID_BYTES * 2
            && raw
                .bytes()
                .all(|b| matches!(b, b'0'..=b'9' | b'a'..=b'f'));
        if !well_formed {
            return Err(ModelError::InvalidJobId(raw.to_string()));
        }
        Ok(Self(raw.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for JobId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl FromStr for JobId {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generated_ids_are_hex_and_unique() {
        let a = JobId::generate();
        let b = JobId::generate();
        assert_ne!(a, b);
        assert_eq!(a.as_str().len(), 64);
        assert_eq!(JobId::parse(a.as_str()), Ok(a));
    }

    #[test]
    fn parse_rejects_wrong_shape() {
        assert!(JobId::parse("").is_err());
        assert!(JobId::parse("abc").is_err());
        assert!(JobId::parse(&"G".repeat(64)).is_err());
        assert!(JobId::parse(&"A".repeat(64)).is_err());
    }
}
