use serde::{Deserialize, Serialize};

use crate::system::GameSystem;

/// Series/sequence value for scenarios outside the numbered scheme.
pub const NOT_NUMBERED: i32 = -1;

/// Structured form of a free-text scenario name.
///
/// `canonical_name` is the grouping key used when merging records, so two
/// listings of the same scenario must produce the same value.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ScenarioIdentifier {
    #[serde(default)]
    pub system: GameSystem,
    pub series: i32,
    pub sequence: i32,
    #[serde(default)]
    pub variant: String,
    pub canonical_name: String,
}

impl ScenarioIdentifier {
    pub fn numbered(
        system: GameSystem,
        series: i32,
        sequence: i32,
        canonical_name: impl Into<String>,
    ) -> Self {
        Self {
            system,
            series,
            sequence,
            variant: String::new(),
            canonical_name: canonical_name.into(),
        }
    }

    /// Identifier for modules and anything else without a number.
    pub fn unnumbered(
        system: GameSystem,
        canonical_name: impl Into<String>,
    ) -> Self {
        Self::numbered(system, NOT_NUMBERED, NOT_NUMBERED, canonical_name)
    }

    pub fn with_variant(mut self, variant: impl Into<String>) -> Self {
        self.variant = variant.into();
        self
    }

    pub fn is_numbered(&self) -> bool {
        self.series >= 0 && self.sequence >= 0
    }

    /// Short `series-sequence[variant]` code, e.g. `5-08A`.
    pub fn code(&self) -> Option<String> {
        self.is_numbered().then(|| {
            format!("{}-{:02}{}", self.series, self.sequence, self.variant)
        })
    }
}
