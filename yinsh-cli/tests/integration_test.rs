//! Integration tests for the YINSH engine and bot
//!
//! Tests the full stack: rules engine, wire format, MCTS, and the `yinsh` binary

use std::path::PathBuf;
use std::process::Command;

use rand::prelude::*;
use rand_chacha::ChaCha8Rng;
use rustc_hash::FxHashSet;
use yinsh_core::{GameState, Hex, IllegalMove, Move, Outcome, Player, Variant};
use yinsh_mcts::{search, MctsConfig, MctsPlayer};

// ============================================================================
// TEST FIXTURES
// ============================================================================

/// White ring on column q=0 and a black ring on column q=-4, each about to walk
fn scripted_setup(variant: Variant) -> GameState {
    let white = [(0, -4), (3, -3), (3, -2), (3, -1), (3, 0)];
    let black = [(-4, 4), (-2, 3), (-1, 4), (2, 2), (1, 3)];

    let mut game = GameState::new_game(variant);
    for (w, b) in white.iter().zip(black.iter()) {
        game.make_move(Move::place(Hex::new(w.0, w.1))).unwrap();
        game.make_move(Move::place(Hex::new(b.0, b.1))).unwrap();
    }
    game
}

/// Random game: setup plus `plays` random plays with random row resolution
fn random_position(seed: u64, plays: usize) -> GameState {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let mut game = GameState::new_game(Variant::Standard);
    let mut played = 0;
    while !game.is_over() && (game.requires_setup() || played < plays) {
        if !game.requires_setup() {
            played += 1;
        }
        let moves: Vec<_> = game.legal_moves().collect();
        game.make_move(*moves.choose(&mut rng).unwrap()).unwrap();
        game.resolve_rows_randomly(&mut rng);
    }
    game
}

fn write_state(name: &str, state: &GameState) -> PathBuf {
    let path = std::env::temp_dir().join(format!("yinsh-{}-{}.json", std::process::id(), name));
    std::fs::write(&path, state.to_json()).unwrap();
    path
}

fn yinsh(args: &[&str]) -> std::process::Output {
    Command::new(env!("CARGO_BIN_EXE_yinsh"))
        .args(args)
        .env("RUST_LOG", "warn")
        .output()
        .unwrap()
}

// ============================================================================
// GAME LOGIC TESTS
// ============================================================================

#[test]
fn test_blitz_end_to_end() {
    let mut game = scripted_setup(Variant::Blitz);
    assert!(!game.requires_setup());
    assert_eq!(game.next_player(), Player::White);
    assert_eq!(
        game.make_move(Move::place(Hex::ORIGIN)),
        Err(IllegalMove::SetupComplete)
    );

    for step in 0..4 {
        game.make_move(Move::play(Hex::new(0, step - 4), Hex::new(0, step - 3))).unwrap();
        game.make_move(Move::play(Hex::new(-4, 4 - step), Hex::new(-4, 3 - step))).unwrap();
    }
    game.make_move(Move::play(Hex::ORIGIN, Hex::new(0, 1))).unwrap();

    // Markers at (0,-4)..(0,0) form White's row
    let rows = game.pending_rows(Player::White);
    assert_eq!(rows.len(), 1);
    assert!(game.pending_rows(Player::Black).is_empty());
    assert!(!game.is_over());

    let winner = game.resolve_row(&rows[0], Hex::new(3, 0)).unwrap();
    assert_eq!(winner, Player::White);
    assert!(game.is_over());
    assert_eq!(game.outcome(), Some(Outcome::Win(Player::White)));
    assert_eq!(
        game.make_move(Move::play(Hex::new(-4, 0), Hex::new(-4, -1))),
        Err(IllegalMove::GameOver)
    );
}

#[test]
fn test_standard_game_continues_after_first_row() {
    let mut game = scripted_setup(Variant::Standard);
    for step in 0..4 {
        game.make_move(Move::play(Hex::new(0, step - 4), Hex::new(0, step - 3))).unwrap();
        game.make_move(Move::play(Hex::new(-4, 4 - step), Hex::new(-4, 3 - step))).unwrap();
    }
    game.make_move(Move::play(Hex::ORIGIN, Hex::new(0, 1))).unwrap();

    let row = game.pending_rows(Player::White)[0];
    // Black's ring cannot pay for White's row
    assert_eq!(
        game.resolve_row(&row, Hex::new(2, 2)),
        Err(IllegalMove::NotOwnRing(Hex::new(2, 2)))
    );
    game.resolve_row(&row, Hex::new(0, 1)).unwrap();

    assert!(!game.is_over());
    assert_eq!(game.removed_rings(Player::White), 1);
    assert_eq!(game.board().markers().count(), 4);
    assert_eq!(game.next_player(), Player::Black);
}

#[test]
fn test_random_games_terminate() {
    for seed in 0..5 {
        let game = random_position(seed, 500);
        assert!(game.is_over(), "seed {} did not finish", seed);
        assert!(game.outcome().is_some());
    }
}

// ============================================================================
// WIRE FORMAT TESTS
// ============================================================================

#[test]
fn test_round_trip_through_json() {
    for seed in 0..6 {
        let game = random_position(seed, seed as usize * 7);
        let decoded = GameState::from_json(&game.to_json()).unwrap();

        let a: FxHashSet<Move> = game.legal_moves().collect();
        let b: FxHashSet<Move> = decoded.legal_moves().collect();
        assert_eq!(a, b);
        assert_eq!(game.outcome(), decoded.outcome());
    }
}

// ============================================================================
// MCTS TESTS
// ============================================================================

#[test]
fn test_search_from_serialized_state() {
    let game = random_position(4, 6);
    let decoded = GameState::from_json(&game.to_json()).unwrap();

    let config = MctsConfig::default().with_iterations(80).with_seed(12);
    let mut player = MctsPlayer::new(config);
    let mv = player.best_move(&decoded).unwrap();

    let legal: FxHashSet<Move> = game.legal_moves().collect();
    assert!(legal.contains(&mv));
}

#[test]
fn test_mcts_visit_invariant() {
    let game = random_position(9, 3);
    let config = MctsConfig::default().with_iterations(120);
    let result = search(&game, &config, &mut ChaCha8Rng::seed_from_u64(1)).unwrap();

    let child_visits: u32 = result.move_stats.iter().map(|s| s.visits - 1).sum();
    assert_eq!(result.iterations, 120);
    assert_eq!(child_visits, 120);
    assert!(result.move_stats.iter().all(|s| s.wins < s.visits));
}

#[test]
fn test_mcts_plays_full_blitz_game() {
    let config = MctsConfig::default().with_iterations(20).with_seed(5);
    let mut player = MctsPlayer::new(config);

    let (final_state, history) = player
        .play_game(GameState::new_game(Variant::Blitz), 200)
        .unwrap();

    assert!(history.len() > 10, "Should have played past setup");
    assert!(final_state.is_over());
}

// ============================================================================
// BINARY TESTS
// ============================================================================

#[test]
fn test_cli_new_prints_wire_state() {
    let output = yinsh(&["new", "--variant", "blitz"]);
    assert!(output.status.success());

    let state = GameState::from_json(&String::from_utf8_lossy(&output.stdout)).unwrap();
    assert_eq!(state, GameState::new_game(Variant::Blitz));
}

#[test]
fn test_cli_rejects_unknown_variant() {
    let output = yinsh(&["new", "--variant", "speed"]);
    assert!(!output.status.success());
}

#[test]
fn test_cli_moves_lists_placements() {
    let path = write_state("moves", &GameState::new_game(Variant::Standard));
    let output = yinsh(&["moves", "--state", path.to_str().unwrap()]);
    assert!(output.status.success());

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("85 legal moves"));
    let _ = std::fs::remove_file(path);
}

#[test]
fn test_cli_search_json() {
    let game = random_position(2, 4);
    let path = write_state("search", &game);
    let output = yinsh(&[
        "search",
        "--state",
        path.to_str().unwrap(),
        "--iterations",
        "40",
        "--seed",
        "3",
        "--json",
    ]);
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));

    let value: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    let mv: Move = serde_json::from_value(value["move"].clone()).unwrap();
    assert!(game.legal_moves().any(|legal| legal == mv));
    assert!(value["state"]["rows"].is_object());
    let _ = std::fs::remove_file(path);
}

#[test]
fn test_cli_search_unbounded_time_limit() {
    let path = write_state("unbounded", &random_position(5, 2));
    let output = yinsh(&[
        "search",
        "--state",
        path.to_str().unwrap(),
        "--iterations",
        "20",
        "--time-limit",
        "inf",
    ]);
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));
    assert!(String::from_utf8_lossy(&output.stdout).contains("Best move"));
    let _ = std::fs::remove_file(path);
}

#[test]
fn test_cli_rejects_inconsistent_state() {
    let path = std::env::temp_dir().join(format!("yinsh-{}-inconsistent.json", std::process::id()));
    std::fs::write(
        &path,
        r#"{"grid": {"0": 1}, "rings": {"white": 3, "black": 0}, "color": "w", "requiresSetup": true}"#,
    )
    .unwrap();
    let output = yinsh(&["moves", "--state", path.to_str().unwrap()]);
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("Failed to load game state"));
    let _ = std::fs::remove_file(path);
}

#[test]
fn test_cli_search_missing_file_fails() {
    let output = yinsh(&["search", "--state", "/nonexistent/yinsh.json"]);
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("Failed to load game state"));
}
