use std::sync::Arc;
use std::time::Duration;

use blitz_backend::ai::SKILL_TABLE;
use blitz_backend::config::ClockStart;
use blitz_backend::domain::{Color, GameOutcome};
use blitz_backend::services::Session;
use blitz_backend::{Arena, Player};

use crate::support::{
    build_arena, connect, test_config, FailingMoveFactory, RecordingTransport, ScriptedFactory,
};

/// Connect one player and wait out the fixed AI delay.
async fn pair_with_ai(
    arena: &Arc<Arena>,
) -> (Arc<Player>, Arc<RecordingTransport>, Arc<Session>, Color) {
    let (player, transport) = connect(arena);
    tokio::time::sleep(Duration::from_millis(4100)).await;
    let session = arena
        .registry()
        .session_for(player.id())
        .expect("AI pairing");
    let color = session.color_of(player.id()).expect("human seated");
    (player, transport, session, color)
}

#[tokio::test(start_paused = true)]
async fn ai_answers_each_human_move() {
    let factory = ScriptedFactory::new(21);
    let arena = build_arena(test_config(1.0, ClockStart::FirstFlip), factory.clone());
    let (player, transport, session, human) = pair_with_ai(&arena).await;
    assert!(session.is_ai());

    let (reply, expected_history) = if human == Color::White {
        ("e2e4", "e2e4".to_string())
    } else {
        // The AI opened at full depth the moment the game started.
        let opening = session.moves();
        assert_eq!(opening.len(), 1);
        let calls = factory.engine().calls();
        assert_eq!(calls.last().unwrap(), &(String::new(), arena.config().ai.max_depth));
        // Nf6 is legal after any first move.
        ("g8f6", format!("{} g8f6", opening[0]))
    };
    let plies_before = session.moves().len();
    assert!(arena.process_move(player.id(), reply, true).is_applied());

    // One think window later the AI has replied.
    tokio::time::sleep(Duration::from_millis(1100)).await;
    let moves = session.moves();
    assert_eq!(moves.len(), plies_before + 2);
    assert_eq!(session.active_turn(), Some(human));

    let calls = factory.engine().calls();
    let (history, depth) = calls.last().unwrap();
    assert_eq!(history, &expected_history);
    assert!((1..=arena.config().ai.max_depth).contains(depth));

    let relayed = transport.with_state(78);
    assert_eq!(relayed.last().unwrap()["data"]["move"], moves.last().unwrap().as_str());
    assert_eq!(transport.count(79), relayed.len());
}

#[tokio::test(start_paused = true)]
async fn ai_game_end_carries_engine_metadata() {
    let factory = ScriptedFactory::new(4);
    let arena = build_arena(test_config(1.0, ClockStart::FirstFlip), factory.clone());
    let (_player, transport, session, human) = pair_with_ai(&arena).await;

    assert!(arena.handle_game_end(&session, None, GameOutcome::timeout(human.opponent())));

    let ended = transport.with_state(99);
    assert_eq!(ended.len(), 1);
    assert_eq!(ended[0]["data"]["isAI"], true);
    assert_eq!(ended[0]["data"]["aiMeta"]["engine"], "scripted");
    let rank = ended[0]["data"]["aiMeta"]["rank"].as_u64().unwrap();
    assert!(SKILL_TABLE.iter().any(|r| u64::from(*r) == rank), "rank {rank}");
}

#[tokio::test(start_paused = true)]
async fn ai_does_not_move_after_the_game_ended() {
    let factory = ScriptedFactory::new(9);
    let arena = build_arena(test_config(1.0, ClockStart::FirstFlip), factory.clone());

    // Find a game where the human has white so the AI reply is still pending.
    for _ in 0..32 {
        let (player, transport, session, human) = pair_with_ai(&arena).await;
        if human != Color::White {
            arena.handle_game_end(&session, None, GameOutcome::timeout(human));
            continue;
        }

        let before = factory.engine().calls().len();
        arena.process_move(player.id(), "d2d4", true);
        arena.handle_game_end(&session, None, GameOutcome::timeout(Color::Black));
        tokio::time::sleep(Duration::from_secs(2)).await;

        assert_eq!(session.moves(), vec!["d2d4".to_string()]);
        assert_eq!(factory.engine().calls().len(), before);
        assert_eq!(transport.count(99), 1);
        return;
    }
    panic!("human never drew white");
}

#[tokio::test(start_paused = true)]
async fn failing_engine_loses_on_time() {
    let arena = build_arena(
        test_config(1.0, ClockStart::FirstFlip),
        Arc::new(FailingMoveFactory),
    );
    let (player, transport, session, human) = pair_with_ai(&arena).await;

    if human == Color::White {
        assert!(arena.process_move(player.id(), "e2e4", true).is_applied());
    }

    tokio::time::sleep(Duration::from_secs(65)).await;

    assert!(session.is_ended());
    let ended = transport.with_state(99);
    assert_eq!(ended.len(), 1);
    let expected = if human == Color::White { "1-0" } else { "0-1" };
    assert_eq!(ended[0]["data"]["result"], expected);
    assert_eq!(ended[0]["data"]["reason"], "Time is up");
    assert_eq!(session.moves().len(), usize::from(human == Color::White));
}
