//! Static lookup data for scenario names.
//!
//! Specials are checked before any pattern; module lists are ordered per
//! system and the first list with a match wins.

use once_cell::sync::Lazy;
use playlog_model::GameSystem;
use regex::Regex;

/// One-off scenarios whose listed name carries no usable number, or whose
/// number does not follow the series scheme.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SpecialEntry {
    pub name: &'static str,
    pub series: i32,
    pub sequence: i32,
    pub system: GameSystem,
}

const fn special(
    name: &'static str,
    series: i32,
    sequence: i32,
    system: GameSystem,
) -> SpecialEntry {
    SpecialEntry {
        name,
        series,
        sequence,
        system,
    }
}

pub static SPECIALS: &[SpecialEntry] = &[
    special(
        "Starfinder Society Special #1-00: Claim to Salvation",
        1,
        0,
        GameSystem::Starfinder,
    ),
    special(
        "Starfinder Society Roleplaying Guild Special #1-00: Claim to Salvation",
        1,
        0,
        GameSystem::Starfinder,
    ),
    special("Special: Year of the Shadow Lodge", 2, 0, GameSystem::Pathfinder),
    special("Special: Blood Under Absalom", 3, 0, GameSystem::Pathfinder),
    special(
        "Special: Race for the Runecarved Key",
        4,
        0,
        GameSystem::Pathfinder,
    ),
    // Season specials listed with a 9x sequence; they sit at the head of
    // their season.
    special("#5-99: Legacy of the Stonelords", 5, 0, GameSystem::Pathfinder),
    special("#6-98: Serpents Rise", 6, 0, GameSystem::Pathfinder),
];

pub fn lookup_special(name: &str) -> Option<&'static SpecialEntry> {
    SPECIALS.iter().find(|entry| entry.name == name)
}

/// `#<n>: Title`, the sequence alone with the series implied.
pub static COMPACT_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^#([0-9]+):").expect("compact pattern"));

/// Sequence number optionally followed by a variant suffix, e.g. `08A`.
pub static VARIANT_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^([0-9]+)([^0-9]+)$").expect("variant pattern")
});

/// `<Label> #<series>-<sequence>: <title>` forms, tried in order.
pub static LONG_FORM_PATTERNS: Lazy<Vec<(GameSystem, Regex)>> =
    Lazy::new(|| {
        [
            (
                GameSystem::Starfinder,
                r"^Starfinder Society Scenario #([0-9]+)[-–]([0-9]+): (.*)$",
            ),
            (
                GameSystem::Pathfinder2,
                r"^Pathfinder Society Scenario #([0-9]+)[-–]([0-9]+): (.*)$",
            ),
        ]
        .into_iter()
        .map(|(system, pattern)| {
            (system, Regex::new(pattern).expect("long-form pattern"))
        })
        .collect()
    });

const PATHFINDER_MODULES: &[&str] = &[
    r"^Intro 1:",
    r"^Feast of Ravenmoor$",
    r"^Carrion Hill$",
    r"^Crypt of the Everflame$",
    r"^The Dragon's Demand - ",
    r"^The Emerald Spire Superdungeon",
    r"^We Be Goblins!$",
    r"^Masks of the Living God$",
    r"^Tears at Bitter Manor - ",
    r"^Master of the Fallen Fortress$",
    r"^City of Golden Death$",
    r"^Quest: Honor's Echo$",
    r"^Fangwood Keep$",
];

const PATHFINDER2_MODULES: &[&str] = &[
    r"^Pathfinder Adventure Path #",
    r"^Pathfinder Bounty #",
    r"^Pathfinder Society Quest #",
    r"^The Fall of Plaguestone",
    r"^Troubles in Otari",
];

const STARFINDER_MODULES: &[&str] = &[
    r"^Starfinder Adventure Path #",
    r"^Starfinder AP:",
    r"^Starfinder Society Roleplaying Guild Quest: ",
];

/// Module name lists, Pathfinder first, then Pathfinder 2, then Starfinder.
pub static MODULE_PATTERNS: Lazy<Vec<(GameSystem, Vec<Regex>)>> =
    Lazy::new(|| {
        [
            (GameSystem::Pathfinder, PATHFINDER_MODULES),
            (GameSystem::Pathfinder2, PATHFINDER2_MODULES),
            (GameSystem::Starfinder, STARFINDER_MODULES),
        ]
        .into_iter()
        .map(|(system, patterns)| {
            let compiled = patterns
                .iter()
                .map(|pattern| Regex::new(pattern).expect("module pattern"))
                .collect();
            (system, compiled)
        })
        .collect()
    });

pub fn match_module(name: &str) -> Option<GameSystem> {
    MODULE_PATTERNS
        .iter()
        .find(|(_, patterns)| patterns.iter().any(|re| re.is_match(name)))
        .map(|(system, _)| *system)
}
