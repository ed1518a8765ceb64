// Two browsers playing through /ws.

use std::time::Duration;

use blitz_backend::config::ClockStart;
use serde_json::json;

use crate::support::websocket::start_test_server;
use crate::support::websocket_client::WebSocketClient;
use crate::support::{build_arena, test_config, ScriptedFactory};

const WAIT: Duration = Duration::from_secs(5);

fn fast_config() -> blitz_backend::ArenaConfig {
    let mut config = test_config(0.0, ClockStart::FirstFlip);
    config.matchmaking.poll_interval = Duration::from_millis(20);
    config
}

#[tokio::test]
async fn two_clients_play_fools_mate() -> Result<(), Box<dyn std::error::Error>> {
    let arena = build_arena(fast_config(), ScriptedFactory::new(1));
    let (server_handle, addr, server_join) = start_test_server(arena.clone()).await?;
    let url = format!("ws://{addr}/ws");

    let mut first = WebSocketClient::connect_retry(&url, Duration::from_secs(1)).await?;
    let mut second = WebSocketClient::connect_retry(&url, Duration::from_secs(1)).await?;

    let first_match = first.recv_state(1, WAIT).await?;
    let second_match = second.recv_state(1, WAIT).await?;
    assert_eq!(first_match["roomID"], second_match["roomID"]);
    assert_ne!(first_match["data"]["color"], second_match["data"]["color"]);

    let (mut white, mut black) = if first_match["data"]["color"] == "white" {
        (first, second)
    } else {
        (second, first)
    };

    white.send_json(&json!({ "move": "f2f3", "isFirstMove": true })).await?;
    let relayed = black.recv_state(78, WAIT).await?;
    assert_eq!(relayed["data"]["move"], "f2f3");
    black.recv_state(79, WAIT).await?;

    black.send_json(&json!({ "move": "e7e5" })).await?;
    white.recv_state(79, WAIT).await?;

    white.send_json(&json!({ "move": "g2g4" })).await?;
    black.recv_state(79, WAIT).await?;

    black.send_json(&json!({ "move": "d8h4" })).await?;
    for client in [&mut white, &mut black] {
        let ended = client.recv_state(99, WAIT).await?;
        assert_eq!(ended["data"]["result"], "0-1");
        assert_eq!(ended["data"]["reason"], "Checkmate");
        assert_eq!(ended["data"]["isAI"], false);
        assert!(client.wait_closed(WAIT).await);
    }

    assert_eq!(arena.registry().live_count(), 0);

    server_handle.stop(true).await;
    let _ = server_join.await;
    Ok(())
}

#[tokio::test]
async fn malformed_frames_are_ignored() -> Result<(), Box<dyn std::error::Error>> {
    let arena = build_arena(fast_config(), ScriptedFactory::new(1));
    let (server_handle, addr, server_join) = start_test_server(arena.clone()).await?;
    let url = format!("ws://{addr}/ws");

    let mut first = WebSocketClient::connect_retry(&url, Duration::from_secs(1)).await?;
    let mut second = WebSocketClient::connect_retry(&url, Duration::from_secs(1)).await?;
    let first_match = first.recv_state(1, WAIT).await?;
    second.recv_state(1, WAIT).await?;

    let (mut white, mut black) = if first_match["data"]["color"] == "white" {
        (first, second)
    } else {
        (second, first)
    };

    white.send_text("this is not json").await?;
    white.send_json(&json!({ "move": "e2e4" })).await?;

    let relayed = black.recv_state(78, WAIT).await?;
    assert_eq!(relayed["data"]["move"], "e2e4");

    server_handle.stop(true).await;
    let _ = server_join.await;
    Ok(())
}

#[tokio::test]
async fn disconnect_while_waiting_leaves_the_pool() -> Result<(), Box<dyn std::error::Error>> {
    let arena = build_arena(fast_config(), ScriptedFactory::new(1));
    let (server_handle, addr, server_join) = start_test_server(arena.clone()).await?;
    let url = format!("ws://{addr}/ws");

    let client = WebSocketClient::connect_retry(&url, Duration::from_secs(1)).await?;
    let deadline = tokio::time::Instant::now() + WAIT;
    while arena.waiting_count() == 0 {
        assert!(tokio::time::Instant::now() < deadline, "player never queued");
        tokio::time::sleep(Duration::from_millis(10)).await;
    }

    drop(client);
    while arena.waiting_count() != 0 {
        assert!(tokio::time::Instant::now() < deadline, "player still queued");
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    assert!(arena.registry().is_empty());

    server_handle.stop(true).await;
    let _ = server_join.await;
    Ok(())
}
