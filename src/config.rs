//! Runtime settings read from the environment.
//!
//! HOST, PORT: bind address (default 0.0.0.0:8080).
//! POINTS_PER_SET, SETS_TO_WIN, MAX_SETS, EXTENSION: default match format.
//! SERVE_POLICY: `seed` or `coin-toss`.

use crate::logic::validation::validate_match_config;
use crate::logic::ServePolicyKind;
use crate::models::MatchConfig;
use std::str::FromStr;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Settings {
    pub host: String,
    pub port: u16,
    pub match_config: MatchConfig,
    pub serve_policy: ServePolicyKind,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            match_config: MatchConfig::default(),
            serve_policy: ServePolicyKind::Seed,
        }
    }
}

fn parse_or<T: FromStr + Copy>(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: T) -> T {
    match lookup(key) {
        None => default,
        Some(raw) => raw.trim().parse().unwrap_or_else(|_| {
            log::warn!("ignoring invalid {}={:?}", key, raw);
            default
        }),
    }
}

impl Settings {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build settings from any key lookup; unset or invalid values keep their defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        let host = lookup("HOST").unwrap_or(defaults.host);
        let port = parse_or(&lookup, "PORT", defaults.port);

        let base = defaults.match_config;
        let match_config = MatchConfig {
            points_per_set: parse_or(&lookup, "POINTS_PER_SET", base.points_per_set),
            sets_to_win: parse_or(&lookup, "SETS_TO_WIN", base.sets_to_win),
            max_sets: parse_or(&lookup, "MAX_SETS", base.max_sets),
            extension: parse_or(&lookup, "EXTENSION", base.extension),
        };
        let match_config = match validate_match_config(&match_config) {
            Ok(()) => match_config,
            Err(e) => {
                log::warn!("{}; using the default match format", e);
                base
            }
        };

        let serve_policy = match lookup("SERVE_POLICY") {
            None => defaults.serve_policy,
            Some(raw) => ServePolicyKind::parse(&raw).unwrap_or_else(|| {
                log::warn!("ignoring invalid SERVE_POLICY={:?}", raw);
                defaults.serve_policy
            }),
        };

        Self {
            host,
            port,
            match_config,
            serve_policy,
        }
    }
}
