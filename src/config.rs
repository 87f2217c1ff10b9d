//! Runtime configuration read from environment variables.

use crate::models::{FixtureAlgorithm, LeagueLabel, PairBounds, DEFAULT_PARTICIPANTS};
use log::warn;
use std::env;
use std::path::PathBuf;
use std::str::FromStr;

const DEFAULT_HOST: &str = "0.0.0.0";
const DEFAULT_PORT: u16 = 8080;
const DEFAULT_DATA_FILE: &str = "data/tracker.json";
const DEFAULT_NAMESPACE: &str = "pairs-tracker";
const DEFAULT_LEAGUES: &[&str] = &["A", "B", "C"];
const DEFAULT_MAX_PAIRS: u32 = 100;

/// Tracker settings shared by the library and the web binary.
#[derive(Clone, Debug)]
pub struct TrackerConfig {
    pub host: String,
    pub port: u16,
    /// JSON file backing the local store.
    pub data_file: PathBuf,
    /// Prefix of every local storage key.
    pub namespace: String,
    /// Configured leagues, in display order. Never empty.
    pub leagues: Vec<LeagueLabel>,
    /// League that inherits the legacy single-league state, if any.
    pub legacy_league: Option<LeagueLabel>,
    pub bounds: PairBounds,
    pub default_participants: u32,
    pub algorithm: FixtureAlgorithm,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        let leagues: Vec<LeagueLabel> = DEFAULT_LEAGUES.iter().map(|l| LeagueLabel::new(*l)).collect();
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            data_file: PathBuf::from(DEFAULT_DATA_FILE),
            namespace: DEFAULT_NAMESPACE.to_string(),
            legacy_league: leagues.first().cloned(),
            leagues,
            bounds: PairBounds::up_to(DEFAULT_MAX_PAIRS),
            default_participants: DEFAULT_PARTICIPANTS,
            algorithm: FixtureAlgorithm::default(),
        }
    }
}

impl TrackerConfig {
    /// Build the configuration from the environment; bad values fall back to defaults.
    ///
    /// HOST, PORT, TRACKER_DATA_FILE, TRACKER_NAMESPACE, TRACKER_LEAGUES (comma list),
    /// TRACKER_LEGACY_LEAGUE (empty disables migration), TRACKER_MAX_PAIRS,
    /// TRACKER_DEFAULT_PAIRS, TRACKER_ALGORITHM (`combinatorial` or `circle`).
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Same as [`TrackerConfig::from_env`] with an injectable variable source.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let var = |key: &str| {
            lookup(key)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };

        let leagues = var("TRACKER_LEAGUES")
            .map(|raw| {
                raw.split(',')
                    .map(LeagueLabel::new)
                    .filter(|l| !l.as_str().is_empty())
                    .collect::<Vec<_>>()
            })
            .filter(|leagues| !leagues.is_empty())
            .unwrap_or_else(|| defaults.leagues.clone());

        let legacy_league = match lookup("TRACKER_LEGACY_LEAGUE") {
            Some(raw) if raw.trim().is_empty() => None,
            Some(raw) => {
                let label = LeagueLabel::new(raw);
                if leagues.contains(&label) {
                    Some(label)
                } else {
                    warn!("TRACKER_LEGACY_LEAGUE={} is not a configured league; migration disabled", label);
                    None
                }
            }
            None => leagues.first().cloned(),
        };

        let max = parse_or(var("TRACKER_MAX_PAIRS"), "TRACKER_MAX_PAIRS", DEFAULT_MAX_PAIRS);
        let bounds = PairBounds::up_to(max);
        let default_participants = bounds.clamp(i64::from(parse_or(
            var("TRACKER_DEFAULT_PAIRS"),
            "TRACKER_DEFAULT_PAIRS",
            defaults.default_participants,
        )));

        Self {
            host: var("HOST").unwrap_or(defaults.host),
            port: parse_or(var("PORT"), "PORT", defaults.port),
            data_file: var("TRACKER_DATA_FILE").map(PathBuf::from).unwrap_or(defaults.data_file),
            namespace: var("TRACKER_NAMESPACE").unwrap_or(defaults.namespace),
            leagues,
            legacy_league,
            bounds,
            default_participants,
            algorithm: parse_or(var("TRACKER_ALGORITHM"), "TRACKER_ALGORITHM", defaults.algorithm),
        }
    }

    /// Resolve a raw label to a configured league.
    pub fn league(&self, raw: &str) -> Option<LeagueLabel> {
        let label = LeagueLabel::new(raw);
        self.leagues.contains(&label).then_some(label)
    }

    /// First configured league; the active league when nothing is persisted.
    pub fn default_league(&self) -> LeagueLabel {
        self.leagues
            .first()
            .cloned()
            .unwrap_or_else(|| LeagueLabel::new(DEFAULT_LEAGUES[0]))
    }
}

fn parse_or<T>(raw: Option<String>, key: &str, default: T) -> T
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match raw {
        Some(value) => value.parse().unwrap_or_else(|err| {
            warn!("Ignoring {}={}: {}", key, value, err);
            default
        }),
        None => default,
    }
}
