//! Who serves first when a match starts.

use crate::models::{GameMatch, Side};
use rand::Rng;
use serde::{Deserialize, Serialize};

/// Picks the first server for a match that is about to start.
pub trait ServePolicy: Send + Sync {
    fn first_server(&self, m: &GameMatch) -> Side;
}

/// Better (lower) seed serves first; ties and unseeded matches go to player 1.
#[derive(Clone, Copy, Debug, Default)]
pub struct SeedServePolicy;

impl ServePolicy for SeedServePolicy {
    fn first_server(&self, m: &GameMatch) -> Side {
        match (m.player1_seed, m.player2_seed) {
            (Some(a), Some(b)) if b < a => Side::Player2,
            (None, Some(_)) => Side::Player2,
            _ => Side::Player1,
        }
    }
}

/// Random first server.
#[derive(Clone, Copy, Debug, Default)]
pub struct CoinTossServePolicy;

impl ServePolicy for CoinTossServePolicy {
    fn first_server(&self, _m: &GameMatch) -> Side {
        if rand::thread_rng().gen_bool(0.5) {
            Side::Player1
        } else {
            Side::Player2
        }
    }
}

/// Policy names accepted in configuration.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ServePolicyKind {
    #[default]
    Seed,
    CoinToss,
}

impl ServePolicyKind {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "seed" => Some(ServePolicyKind::Seed),
            "coin-toss" | "coin_toss" | "cointoss" => Some(ServePolicyKind::CoinToss),
            _ => None,
        }
    }

    pub fn build(self) -> Box<dyn ServePolicy> {
        match self {
            ServePolicyKind::Seed => Box::new(SeedServePolicy),
            ServePolicyKind::CoinToss => Box::new(CoinTossServePolicy),
        }
    }
}
