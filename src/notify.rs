//! Outbound notifications (emails, push). Delivery lives outside the engine.

use crate::models::{CategoryId, GameMatch, TournamentId};

/// Called fire-and-forget after the triggering change has committed.
pub trait Notifier: Send + Sync {
    fn draw_published(&self, tournament_id: TournamentId, category_id: CategoryId, matches: usize);

    fn match_starting_soon(&self, m: &GameMatch);
}

/// Default notifier: records the notification in the log and nothing else.
#[derive(Clone, Copy, Debug, Default)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn draw_published(&self, tournament_id: TournamentId, category_id: CategoryId, matches: usize) {
        log::info!(
            "draw published: tournament {} category {} ({} matches)",
            tournament_id,
            category_id,
            matches
        );
    }

    fn match_starting_soon(&self, m: &GameMatch) {
        log::info!(
            "match {} (round {}, #{}) starting soon",
            m.id,
            m.round,
            m.match_number
        );
    }
}
