//! Scenario name parsing.
//!
//! Session listings name scenarios as free text in a handful of historical
//! formats. [`ScenarioParser`] turns one of those names into a
//! [`ScenarioIdentifier`] by trying, in order:
//!
//! 1. the table of specials in [`catalog::SPECIALS`],
//! 2. the compact `#<n>: Title` form,
//! 3. the long `<Label> #<series>-<sequence>: Title` forms,
//! 4. the per-system module lists, for names not starting with `#`,
//! 5. a generic `#<series>-<sequence>[variant]: Title` split.
//!
//! The first strategy that applies decides the result.

pub mod catalog;

use playlog_model::{GameSystem, ScenarioIdentifier};
use thiserror::Error;
use tracing::debug;

use crate::config::ScenarioParserConfig;

const DASHES: [char; 2] = ['-', '–'];
const TITLE_TERMINATORS: [char; 3] = [':', '—', ' '];

/// Why a scenario name could not be parsed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseFailure {
    #[error("scenario name is empty")]
    Empty,

    #[error("no parser or special entry matches")]
    Unrecognized,

    #[error("could not find series terminator")]
    MissingSeriesTerminator,

    #[error("could not parse {0:?} as series number")]
    InvalidSeries(String),

    #[error("could not find scenario terminator")]
    MissingSequenceTerminator,

    #[error("could not parse {0:?} as scenario number")]
    InvalidSequence(String),
}

/// A parse failure together with the best-effort identifier for the name.
///
/// The fallback is unnumbered, of unknown system, and keyed by the trimmed
/// raw name so the row can still be grouped.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("parsing {raw:?}: {reason}")]
pub struct ScenarioParseError {
    pub raw: String,
    pub reason: ParseFailure,
    fallback: ScenarioIdentifier,
}

impl ScenarioParseError {
    fn new(raw: &str, reason: ParseFailure) -> Self {
        Self {
            raw: raw.to_string(),
            reason,
            fallback: ScenarioIdentifier::unnumbered(
                GameSystem::Unknown,
                raw,
            ),
        }
    }

    pub fn fallback(&self) -> &ScenarioIdentifier {
        &self.fallback
    }

    pub fn into_fallback(self) -> ScenarioIdentifier {
        self.fallback
    }
}

#[derive(Debug, Clone, Default)]
pub struct ScenarioParser {
    config: ScenarioParserConfig,
}

impl ScenarioParser {
    pub fn new(config: ScenarioParserConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ScenarioParserConfig {
        &self.config
    }

    pub fn parse(
        &self,
        raw_name: &str,
    ) -> Result<ScenarioIdentifier, ScenarioParseError> {
        let name = raw_name.trim();
        if name.is_empty() {
            return Err(ScenarioParseError::new(name, ParseFailure::Empty));
        }

        if let Some(entry) = catalog::lookup_special(name) {
            debug!("Matched special scenario {:?}", name);
            return Ok(ScenarioIdentifier::numbered(
                entry.system,
                entry.series,
                entry.sequence,
                name,
            ));
        }

        if let Some(id) = self.parse_compact(name) {
            return Ok(id);
        }

        if let Some(id) = parse_long_form(name) {
            return Ok(id);
        }

        if !name.starts_with('#') {
            return match catalog::match_module(name) {
                Some(system) => {
                    debug!("Matched {} module {:?}", system, name);
                    Ok(ScenarioIdentifier::unnumbered(system, name))
                }
                None => Err(ScenarioParseError::new(
                    name,
                    ParseFailure::Unrecognized,
                )),
            };
        }

        parse_generic(name)
            .map_err(|reason| ScenarioParseError::new(name, reason))
    }

    /// Like [`parse`](Self::parse) but always yields an identifier, using
    /// the fallback on failure.
    pub fn parse_lossy(
        &self,
        raw_name: &str,
    ) -> (ScenarioIdentifier, Option<ScenarioParseError>) {
        match self.parse(raw_name) {
            Ok(id) => (id, None),
            Err(err) => (err.fallback.clone(), Some(err)),
        }
    }

    fn parse_compact(&self, name: &str) -> Option<ScenarioIdentifier> {
        let captures = catalog::COMPACT_PATTERN.captures(name)?;
        // An oversized number falls through to the remaining strategies.
        let sequence: i32 = captures[1].parse().ok()?;
        let series = sequence / self.config.divisor();

        let title = name[captures[0].len()..].trim();
        let title = if title.is_empty() { name } else { title };

        debug!(
            "Compact scenario {:?}: series {} sequence {}",
            name, series, sequence
        );
        Some(ScenarioIdentifier::numbered(
            self.config.compact_system,
            series,
            sequence,
            title,
        ))
    }
}

fn parse_long_form(name: &str) -> Option<ScenarioIdentifier> {
    catalog::LONG_FORM_PATTERNS.iter().find_map(|(system, pattern)| {
        let captures = pattern.captures(name)?;
        let series: i32 = captures[1].parse().ok()?;
        let sequence: i32 = captures[2].parse().ok()?;
        let title = captures[3].trim();
        let title = if title.is_empty() { name } else { title };
        Some(ScenarioIdentifier::numbered(*system, series, sequence, title))
    })
}

fn parse_generic(name: &str) -> Result<ScenarioIdentifier, ParseFailure> {
    let rest = name.trim_start_matches('#');

    let dash = rest
        .find(DASHES)
        .ok_or(ParseFailure::MissingSeriesTerminator)?;
    let series_text = rest[..dash].trim();
    let series: i32 = series_text
        .parse()
        .map_err(|_| ParseFailure::InvalidSeries(series_text.to_string()))?;

    let rest = rest[dash..].trim_start_matches(DASHES);
    let end = rest
        .find(TITLE_TERMINATORS)
        .ok_or(ParseFailure::MissingSequenceTerminator)?;
    let number = &rest[..end];

    let (digits, variant) = match catalog::VARIANT_PATTERN.captures(number) {
        Some(captures) => (
            captures.get(1).map_or("", |m| m.as_str()),
            captures.get(2).map_or("", |m| m.as_str()),
        ),
        None => (number, ""),
    };
    let sequence: i32 = digits
        .parse()
        .map_err(|_| ParseFailure::InvalidSequence(number.to_string()))?;

    let title = rest[end..].trim_start_matches(TITLE_TERMINATORS).trim();
    let title = if title.is_empty() { name } else { title };

    Ok(ScenarioIdentifier::numbered(
        GameSystem::Pathfinder,
        series,
        sequence,
        title,
    )
    .with_variant(variant))
}
