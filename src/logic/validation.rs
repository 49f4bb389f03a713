//! Participant/qualifier checks and bracket size arithmetic.

use crate::models::{MatchConfig, Participant, ValidationError};
use std::collections::HashSet;

/// Smallest number of entrants any draw accepts.
pub const MIN_PARTICIPANTS: usize = 2;

/// Reject draws with fewer than two entrants or the same participant twice.
pub fn validate_participants(participants: &[Participant]) -> Result<(), ValidationError> {
    if participants.len() < MIN_PARTICIPANTS {
        return Err(ValidationError::NotEnoughParticipants {
            got: participants.len(),
        });
    }
    let mut seen = HashSet::with_capacity(participants.len());
    for p in participants {
        if !seen.insert(p.id) {
            return Err(ValidationError::DuplicateParticipant(p.id));
        }
    }
    Ok(())
}

/// Qualifiers taken from a group of `participants` must be in `[1, participants]`.
pub fn validate_qualifier_count(qualifiers: usize, participants: usize) -> Result<(), ValidationError> {
    if qualifiers == 0 || qualifiers > participants {
        return Err(ValidationError::QualifierCountOutOfRange {
            qualifiers,
            participants,
        });
    }
    Ok(())
}

/// `ceil(log2 n)`; 0 for fewer than two entrants.
pub fn total_rounds(n: usize) -> u32 {
    if n < MIN_PARTICIPANTS {
        return 0;
    }
    usize::BITS - (n - 1).leading_zeros()
}

/// Next power of two at or above `n`.
pub fn bracket_size(n: usize) -> usize {
    1usize << total_rounds(n)
}

pub fn bye_count(n: usize) -> usize {
    bracket_size(n).saturating_sub(n)
}

pub fn round_robin_match_count(n: usize) -> usize {
    n * n.saturating_sub(1) / 2
}

pub fn validate_match_config(config: &MatchConfig) -> Result<(), ValidationError> {
    if config.points_per_set == 0 {
        return Err(ValidationError::InvalidMatchConfig("points per set must be at least 1"));
    }
    if config.max_sets == 0 || config.sets_to_win == 0 {
        return Err(ValidationError::InvalidMatchConfig("a match needs at least one set"));
    }
    if config.sets_to_win > config.max_sets {
        return Err(ValidationError::InvalidMatchConfig("sets to win exceeds max sets"));
    }
    if u64::from(config.max_sets) > 2 * u64::from(config.sets_to_win) - 1 {
        return Err(ValidationError::InvalidMatchConfig(
            "max sets allows more sets than can be played",
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_and_bye_arithmetic() {
        assert_eq!(total_rounds(2), 1);
        assert_eq!(total_rounds(3), 2);
        assert_eq!(total_rounds(5), 3);
        assert_eq!(total_rounds(8), 3);
        assert_eq!(total_rounds(9), 4);
        assert_eq!(bracket_size(5), 8);
        assert_eq!(bye_count(5), 3);
        assert_eq!(bye_count(16), 0);
    }

    #[test]
    fn qualifier_bounds() {
        assert!(validate_qualifier_count(1, 4).is_ok());
        assert!(validate_qualifier_count(4, 4).is_ok());
        assert!(validate_qualifier_count(0, 4).is_err());
        assert!(validate_qualifier_count(5, 4).is_err());
    }

    #[test]
    fn single_set_config_is_valid() {
        let config = MatchConfig {
            points_per_set: 15,
            sets_to_win: 1,
            max_sets: 1,
            extension: false,
        };
        assert!(validate_match_config(&config).is_ok());
        let bad = MatchConfig { max_sets: 5, ..config };
        assert!(validate_match_config(&bad).is_err());
    }

    #[test]
    fn huge_set_counts_are_checked_without_overflow() {
        let huge = MatchConfig {
            points_per_set: 21,
            sets_to_win: 1 << 31,
            max_sets: 1 << 31,
            extension: false,
        };
        assert!(validate_match_config(&huge).is_ok());

        let widest = MatchConfig {
            sets_to_win: u32::MAX,
            max_sets: u32::MAX,
            ..huge
        };
        assert!(validate_match_config(&widest).is_ok());

        let beyond = MatchConfig {
            sets_to_win: 1 << 30,
            max_sets: u32::MAX,
            ..huge
        };
        assert_eq!(
            validate_match_config(&beyond),
            Err(ValidationError::InvalidMatchConfig(
                "max sets allows more sets than can be played"
            ))
        );

        let long_sets = MatchConfig {
            points_per_set: u32::MAX,
            extension: true,
            ..MatchConfig::default()
        };
        assert!(validate_match_config(&long_sets).is_ok());
        assert_eq!(long_sets.point_cap(), u32::MAX);
    }
}
