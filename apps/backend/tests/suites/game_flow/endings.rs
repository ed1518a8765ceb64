use std::time::Duration;

use blitz_backend::config::ClockStart;
use blitz_backend::domain::{Color, GameOutcome, GameResult, Termination};
use blitz_backend::services::IgnoreReason;
use blitz_backend::MoveOutcome;

use crate::support::{build_arena, pair_humans, test_config, ScriptedFactory};

#[tokio::test(start_paused = true)]
async fn fools_mate_ends_the_game_for_black() {
    let arena = build_arena(test_config(0.0, ClockStart::FirstFlip), ScriptedFactory::new(1));
    let game = pair_humans(&arena).await;

    assert!(arena.process_move(game.white, "f2f3", true).is_applied());
    assert!(arena.process_move(game.black, "e7e5", false).is_applied());
    assert!(arena.process_move(game.white, "g2g4", false).is_applied());
    let outcome = arena.process_move(game.black, "d8h4", false);

    assert_eq!(
        outcome,
        MoveOutcome::Finished(GameOutcome {
            result: GameResult::BlackWon,
            termination: Termination::Checkmate,
        })
    );

    for transport in [&game.white_tx, &game.black_tx] {
        let ended = transport.with_state(99);
        assert_eq!(ended.len(), 1);
        assert_eq!(ended[0]["data"]["result"], "0-1");
        assert_eq!(ended[0]["data"]["reason"], "Checkmate");
        assert_eq!(ended[0]["data"]["isAI"], false);
        assert!(ended[0]["data"]["aiMeta"].is_null());
        assert!(transport.is_closed());
    }
    // The mating move is relayed but no turn prompt follows it.
    assert_eq!(game.white_tx.game_states(), vec![1, 78, 79, 78, 99]);

    assert!(game.session.is_ended());
    assert_eq!(game.session.active_turn(), None);
    assert!(arena.registry().session_for(game.white).is_none());
    assert!(arena.registry().session_for(game.black).is_none());
    assert!(arena.registry().get(game.session.id()).is_some());
    assert_eq!(arena.registry().live_count(), 0);
}

#[tokio::test(start_paused = true)]
async fn moves_after_the_end_are_ignored() {
    let arena = build_arena(test_config(0.0, ClockStart::FirstFlip), ScriptedFactory::new(1));
    let game = pair_humans(&arena).await;

    arena.handle_game_end(&game.session, None, GameOutcome::timeout(Color::White));

    assert_eq!(
        arena.process_move(game.white, "e2e4", true),
        MoveOutcome::Ignored(IgnoreReason::NoSession)
    );
    assert!(game.session.moves().is_empty());
}

#[tokio::test(start_paused = true)]
async fn expired_clock_loses_on_time() {
    let arena = build_arena(test_config(0.0, ClockStart::FirstFlip), ScriptedFactory::new(1));
    let game = pair_humans(&arena).await;

    arena.process_move(game.white, "e2e4", true);
    tokio::time::sleep(Duration::from_secs(61)).await;

    let ended = game.white_tx.with_state(99);
    assert_eq!(ended.len(), 1);
    assert_eq!(ended[0]["data"]["result"], "1-0");
    assert_eq!(ended[0]["data"]["reason"], "Time is up");

    let ticks = game.black_tx.with_state(80);
    assert_eq!(ticks.len(), 60);
    assert_eq!(ticks.last().unwrap()["data"]["remainingSeconds"], 0);
    assert_eq!(ticks.last().unwrap()["data"]["color"], "black");

    assert!(game.session.is_ended());
    assert!(game.black_tx.is_closed());
    assert!(arena.registry().session_for(game.black).is_none());
}

#[tokio::test(start_paused = true)]
async fn game_end_happens_once() {
    let arena = build_arena(test_config(0.0, ClockStart::FirstFlip), ScriptedFactory::new(1));
    let game = pair_humans(&arena).await;
    arena.process_move(game.white, "e2e4", true);

    let timeout = GameOutcome::timeout(Color::Black);
    assert!(arena.handle_game_end(&game.session, Some(game.black), timeout));
    assert!(!arena.handle_game_end(&game.session, Some(game.black), timeout));

    // The stopped clock must not end the game a second time.
    tokio::time::sleep(Duration::from_secs(70)).await;
    assert_eq!(game.white_tx.count(99), 1);
    assert_eq!(game.black_tx.count(99), 1);
}

#[tokio::test(start_paused = true)]
async fn ended_sessions_are_pruned_after_retention() {
    let mut config = test_config(0.0, ClockStart::FirstFlip);
    config.game.retention = Duration::from_secs(30);
    let arena = build_arena(config, ScriptedFactory::new(1));
    let _janitor = arena.spawn_janitor();
    let game = pair_humans(&arena).await;

    arena.handle_game_end(&game.session, None, GameOutcome::timeout(Color::White));
    tokio::time::sleep(Duration::from_secs(20)).await;
    assert!(arena.registry().get(game.session.id()).is_some());

    tokio::time::sleep(Duration::from_secs(45)).await;
    assert!(arena.registry().get(game.session.id()).is_none());
}
