use std::fmt;

use serde::{Deserialize, Serialize};

/// Game line a scenario belongs to. `Unknown` doubles as "not yet known"
/// when merging records.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum GameSystem {
    #[default]
    Unknown,
    Pathfinder,
    PathfinderCore,
    Starfinder,
    Pathfinder2,
}

impl GameSystem {
    pub fn is_known(&self) -> bool {
        !matches!(self, GameSystem::Unknown)
    }

    pub fn label(&self) -> &'static str {
        match self {
            GameSystem::Unknown => "",
            GameSystem::Pathfinder => "Pathfinder",
            GameSystem::PathfinderCore => "Pathfinder Core",
            GameSystem::Starfinder => "Starfinder",
            GameSystem::Pathfinder2 => "Pathfinder2",
        }
    }
}

impl fmt::Display for GameSystem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}
