use playlog_model::GameSystem;
use serde::{Deserialize, Serialize};

/// Tunables for [`ScenarioParser`](crate::scenario::ScenarioParser).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ScenarioParserConfig {
    /// System assigned to names in the compact `#<n>: Title` form.
    pub compact_system: GameSystem,
    /// Sessions per series for the compact form; the series of `#<n>:` is
    /// `n / sessions_per_series`. Zero is treated as one.
    pub sessions_per_series: u32,
}

impl Default for ScenarioParserConfig {
    fn default() -> Self {
        Self {
            compact_system: GameSystem::Pathfinder,
            sessions_per_series: 29,
        }
    }
}

impl ScenarioParserConfig {
    pub(crate) fn divisor(&self) -> i32 {
        i32::try_from(self.sessions_per_series.max(1)).unwrap_or(i32::MAX)
    }
}
