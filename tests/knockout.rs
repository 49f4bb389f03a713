//! Integration tests for knockout bracket generation.

use bracket_engine::{
    generate_knockout_bracket, GameMatch, KnockoutBracket, MatchStatus, Participant, Side, Stage,
    TournamentError, ValidationError,
};
use chrono::Utc;
use std::collections::HashMap;
use uuid::Uuid;

fn field(n: usize) -> Vec<Participant> {
    (0..n).map(|i| Participant::new(format!("P{i}"), i as u32 + 1)).collect()
}

fn bracket(n: usize) -> (Vec<Participant>, KnockoutBracket) {
    let players = field(n);
    let b = generate_knockout_bracket(Uuid::new_v4(), Uuid::new_v4(), &players, Utc::now()).unwrap();
    (players, b)
}

fn by_id(b: &KnockoutBracket) -> HashMap<Uuid, &GameMatch> {
    b.matches.iter().map(|m| (m.id, m)).collect()
}

#[test]
fn rejects_fewer_than_two_participants() {
    let result = generate_knockout_bracket(Uuid::new_v4(), Uuid::new_v4(), &field(1), Utc::now());
    assert!(matches!(
        result,
        Err(TournamentError::Validation(ValidationError::NotEnoughParticipants { .. }))
    ));
}

#[test]
fn two_participants_make_a_single_final() {
    let (players, b) = bracket(2);
    assert_eq!(b.rounds, 1);
    assert_eq!(b.matches.len(), 1);
    let m = &b.matches[0];
    assert_eq!(m.round, 1);
    assert!(m.parent_match_id.is_none());
    assert!(m.winner_position.is_none());
    assert_eq!(m.player1_id, Some(players[0].id));
    assert_eq!(m.player2_id, Some(players[1].id));
    assert_eq!(m.status, MatchStatus::Pending);
}

#[test]
fn eight_participants_have_no_byes() {
    let (_, b) = bracket(8);
    assert_eq!(b.rounds, 3);
    assert_eq!(b.matches.len(), 7);
    assert_eq!(b.round(3).count(), 4);
    assert_eq!(b.round(2).count(), 2);
    assert_eq!(b.round(1).count(), 1);
    assert!(b.matches.iter().all(|m| !m.is_bye()));
    assert!(b.round(3).all(|m| m.player1_id.is_some() && m.player2_id.is_some()));
    assert!(b.round(2).all(|m| m.player1_id.is_none() && m.player2_id.is_none()));
}

#[test]
fn five_participants_get_three_first_round_byes() {
    let (players, b) = bracket(5);
    assert_eq!(b.rounds, 3);
    assert_eq!(b.matches.len(), 7);

    let byes: Vec<_> = b.matches.iter().filter(|m| m.is_bye()).collect();
    assert_eq!(byes.len(), 3);
    for m in &byes {
        assert_eq!(m.round, 3);
        assert_eq!(m.status, MatchStatus::Completed);
        assert_eq!(m.winner_id, m.player1_id);
        assert!(m.player2_id.is_none());
        assert!(m.completed_at.is_some());
    }
    // the three strongest seeds get the byes
    let bye_players: Vec<_> = byes.iter().filter_map(|m| m.player1_id).collect();
    assert_eq!(bye_players, vec![players[0].id, players[1].id, players[2].id]);

    // seeds 4 and 5 play the only real first-round match
    let regular = b.round(3).find(|m| !m.is_bye()).unwrap();
    assert_eq!(regular.match_number, 1);
    assert_eq!(regular.player1_id, Some(players[3].id));
    assert_eq!(regular.player2_id, Some(players[4].id));
    assert_eq!(regular.player1_seed, Some(4));
    assert_eq!(regular.player2_seed, Some(5));
}

#[test]
fn bye_winners_already_sit_in_their_parent_slot() {
    for n in [3, 5, 6, 7, 11, 13] {
        let (_, b) = bracket(n);
        let index = by_id(&b);
        for bye in b.matches.iter().filter(|m| m.is_bye()) {
            let parent = index[&bye.parent_match_id.unwrap()];
            let slot = parent.player(bye.winner_position.unwrap());
            assert_eq!(slot, bye.winner_id, "n={n}");
        }
    }
}

#[test]
fn tree_is_wired_to_the_previous_round() {
    for n in 2..=17 {
        let (_, b) = bracket(n);
        let size = n.next_power_of_two();
        assert_eq!(b.matches.len(), size - 1, "n={n}");
        assert_eq!(b.matches.iter().filter(|m| m.is_bye()).count(), size - n);
        assert!(b.matches.iter().all(|m| m.stage == Stage::Knockout));
        assert!(b.matches.iter().all(|m| m.round == m.round_number));

        let finals: Vec<_> = b.matches.iter().filter(|m| m.parent_match_id.is_none()).collect();
        assert_eq!(finals.len(), 1);
        assert_eq!(finals[0].round, 1);
        assert_eq!(b.final_match().map(|m| m.id), Some(finals[0].id));

        let index = by_id(&b);
        let mut children: HashMap<Uuid, Vec<Side>> = HashMap::new();
        for m in b.matches.iter().filter(|m| m.round > 1) {
            let parent = index[&m.parent_match_id.unwrap()];
            assert_eq!(parent.round, m.round - 1);
            children
                .entry(parent.id)
                .or_default()
                .push(m.winner_position.unwrap());
        }
        for sides in children.values() {
            assert_eq!(sides.len(), 2);
            assert!(sides.contains(&Side::Player1));
            assert!(sides.contains(&Side::Player2));
        }
    }
}

#[test]
fn byes_only_appear_in_the_earliest_round() {
    let (_, b) = bracket(12);
    assert_eq!(b.rounds, 4);
    assert!(b
        .matches
        .iter()
        .filter(|m| m.is_bye())
        .all(|m| m.round == b.rounds));
    // later rounds are waiting on results, apart from bye winners already moved in
    assert!(b
        .matches
        .iter()
        .filter(|m| m.round < b.rounds)
        .all(|m| m.status == MatchStatus::Pending));
}
