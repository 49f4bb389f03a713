//! Integration tests for the in-memory store, CSV import, standings and settings.

use bracket_engine::logic::{add_point, start_match, ServePolicyKind};
use bracket_engine::{
    group_standings, parse_participants_csv, select_qualifiers, GameMatch, InMemoryStore,
    MatchConfig, MatchStore, Participant, Settings, Side, Stage, StoreError, TournamentError,
    ValidationError, WriteBatch,
};
use chrono::Utc;
use std::collections::HashMap;
use uuid::Uuid;

fn pending(t: Uuid, c: Uuid, number: u32) -> GameMatch {
    GameMatch::new(t, c, Stage::Knockout, 1, number)
}

#[test]
fn commit_is_all_or_nothing() {
    let store = InMemoryStore::new();
    let (t, c) = (Uuid::new_v4(), Uuid::new_v4());
    let existing = pending(t, c, 1);
    store.commit(WriteBatch::new().insert(existing.clone())).unwrap();

    // second insert is fine, but the update references a match that does not exist
    let batch = WriteBatch::new()
        .insert(pending(t, c, 2))
        .update(pending(t, c, 3));
    assert!(matches!(store.commit(batch), Err(StoreError::Missing(_))));
    assert_eq!(store.len(), 1);

    let duplicate = WriteBatch::new().insert(existing.clone());
    assert!(matches!(store.commit(duplicate), Err(StoreError::DuplicateKey(_))));
    assert_eq!(store.load_category(t, c).unwrap().len(), 1);
}

#[test]
fn updates_must_advance_the_version_by_one() {
    let store = InMemoryStore::new();
    let (t, c) = (Uuid::new_v4(), Uuid::new_v4());
    let mut m = pending(t, c, 1);
    store.commit(WriteBatch::new().insert(m.clone())).unwrap();

    let stale = m.clone();
    assert!(matches!(
        store.commit(WriteBatch::new().update(stale)),
        Err(StoreError::Conflict(_))
    ));

    m.version += 1;
    m.player1_seed = Some(4);
    store.commit(WriteBatch::new().update(m.clone())).unwrap();
    let loaded = store.load(m.id).unwrap().unwrap();
    assert_eq!(loaded, m);
}

#[test]
fn load_round_filters_a_category() {
    let store = InMemoryStore::new();
    let (t, c) = (Uuid::new_v4(), Uuid::new_v4());
    let mut batch = WriteBatch::new();
    for round in 1..=3 {
        batch = batch.insert(GameMatch::new(t, c, Stage::Knockout, round, 1));
    }
    batch = batch.insert(GameMatch::new(t, Uuid::new_v4(), Stage::Knockout, 2, 1));
    store.commit(batch).unwrap();

    let round_two = store.load_round(t, c, 2).unwrap();
    assert_eq!(round_two.len(), 1);
    assert_eq!(round_two[0].category_id, c);
    let rounds: Vec<_> = store.load_category(t, c).unwrap().iter().map(|m| m.round).collect();
    assert_eq!(rounds, vec![1, 2, 3]);
}

#[test]
fn csv_import_reads_ids_names_and_seeds() {
    let id = Uuid::new_v4();
    let csv = format!("id,name,seed\n{id},Alice,2\n,Bob,\n,Carol,1\n");
    let participants = parse_participants_csv(csv.as_bytes()).unwrap();
    assert_eq!(participants.len(), 3);
    assert_eq!(participants[0].id, id);
    assert_eq!(participants[0].seed, Some(2));
    assert_eq!(participants[1].name, "Bob");
    assert_eq!(participants[1].seed, Some(2));
    assert_eq!(participants[2].seed, Some(1));
}

#[test]
fn csv_import_rejects_bad_rows() {
    let id = Uuid::new_v4();
    let duplicate = format!("id,name,seed\n{id},A,1\n{id},B,2\n");
    assert!(matches!(
        parse_participants_csv(duplicate.as_bytes()),
        Err(ValidationError::DuplicateParticipant(d)) if d == id
    ));
    assert!(matches!(
        parse_participants_csv("id,name,seed\n,A,first\n".as_bytes()),
        Err(ValidationError::MalformedParticipants(_))
    ));
    assert!(matches!(
        parse_participants_csv("id,name,seed\n,,1\n".as_bytes()),
        Err(ValidationError::MalformedParticipants(_))
    ));
}

#[test]
fn standings_break_ties_on_set_and_point_difference() {
    let (t, c) = (Uuid::new_v4(), Uuid::new_v4());
    let players: Vec<_> = (0..3).map(|i| Participant::new(format!("P{i}"), i + 1)).collect();
    let config = MatchConfig {
        points_per_set: 2,
        sets_to_win: 1,
        max_sets: 1,
        extension: false,
    };
    let play = |a: usize, b: usize, winner: Side, loser_points: u32| {
        let mut m = GameMatch::new(t, c, Stage::Group, 1, 1);
        m.assign((&players[a], a), Some((&players[b], b)));
        start_match(&mut m, config, Side::Player1, Utc::now()).unwrap();
        for _ in 0..loser_points {
            add_point(&mut m, winner.opponent(), Utc::now()).unwrap();
        }
        add_point(&mut m, winner, Utc::now()).unwrap();
        add_point(&mut m, winner, Utc::now()).unwrap();
        m
    };
    // everyone wins once; point difference decides: P2 +1, P1 0, P0 -1
    let matches = vec![
        play(0, 1, Side::Player1, 1),
        play(1, 2, Side::Player1, 1),
        play(0, 2, Side::Player2, 0),
    ];
    let table = group_standings(&matches);
    let order: Vec<_> = table.iter().map(|s| s.participant_id).collect();
    assert_eq!(order, vec![players[2].id, players[1].id, players[0].id]);
    assert!(table.iter().all(|s| s.wins == 1 && s.losses == 1 && s.played == 2));

    let seeded = select_qualifiers(&table, 2).unwrap();
    assert_eq!(seeded[0].id, players[2].id);
    assert_eq!(seeded[0].seed, Some(1));
    assert_eq!(seeded[0].name, "P2");
    assert!(matches!(
        select_qualifiers(&table, 0),
        Err(TournamentError::Validation(ValidationError::QualifierCountOutOfRange { .. }))
    ));
}

#[test]
fn settings_fall_back_to_defaults() {
    let env: HashMap<&str, &str> = HashMap::from([
        ("PORT", "9090"),
        ("POINTS_PER_SET", "eleven"),
        ("SETS_TO_WIN", "3"),
        ("MAX_SETS", "5"),
        ("SERVE_POLICY", "coin-toss"),
    ]);
    let settings = Settings::from_lookup(|k| env.get(k).map(|v| v.to_string()));
    assert_eq!(settings.host, "0.0.0.0");
    assert_eq!(settings.port, 9090);
    assert_eq!(settings.match_config.points_per_set, 21);
    assert_eq!(settings.match_config.sets_to_win, 3);
    assert_eq!(settings.match_config.max_sets, 5);
    assert_eq!(settings.serve_policy, ServePolicyKind::CoinToss);

    let inconsistent: HashMap<&str, &str> = HashMap::from([("SETS_TO_WIN", "4"), ("MAX_SETS", "3")]);
    let settings = Settings::from_lookup(|k| inconsistent.get(k).map(|v| v.to_string()));
    assert_eq!(settings.match_config, MatchConfig::default());
}
