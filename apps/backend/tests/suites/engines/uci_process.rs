use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::PathBuf;

use blitz_backend::ai::{EngineError, EngineFactory, MoveEngine, UciEngineFactory};
use tempfile::TempDir;

/// Minimal UCI speaker: logs every command and always answers `e2e4`
/// unless asked to play from a position with `resign` in it.
const FAKE_ENGINE: &str = r#"#!/bin/sh
log="$(dirname "$0")/commands.log"
while IFS= read -r line; do
  echo "$line" >> "$log"
  case "$line" in
    uci) echo "id name fake"; echo "uciok" ;;
    isready) echo "readyok" ;;
    position*resign*) nomove=1 ;;
    position*) nomove=0 ;;
    go*)
      echo "info depth 1 score cp 12"
      if [ "$nomove" = "1" ]; then echo "bestmove (none)"; else echo "bestmove e2e4 ponder e7e5"; fi ;;
    quit) exit 0 ;;
  esac
done
"#;

fn install_fake_engine(dir: &TempDir) -> PathBuf {
    let path = dir.path().join("fake-engine.sh");
    fs::write(&path, FAKE_ENGINE).unwrap();
    fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).unwrap();
    path
}

fn logged_commands(dir: &TempDir) -> Vec<String> {
    fs::read_to_string(dir.path().join("commands.log"))
        .unwrap_or_default()
        .lines()
        .map(str::to_string)
        .collect()
}

#[tokio::test]
async fn handshake_sets_skill_and_reads_bestmove() {
    let dir = TempDir::new().unwrap();
    let path = install_fake_engine(&dir);
    let factory = UciEngineFactory::new(path.to_string_lossy());

    let engine = factory.spawn(7).await.expect("fake engine starts");
    let mv = engine.best_move("", 4).await.unwrap();
    assert_eq!(mv, "e2e4");

    let mv = engine.best_move("e2e4 e7e5", 2).await.unwrap();
    assert_eq!(mv, "e2e4");

    let commands = logged_commands(&dir);
    assert_eq!(
        commands,
        vec![
            "uci",
            "setoption name Skill Level value 7",
            "isready",
            "position startpos",
            "go depth 4",
            "position startpos moves e2e4 e7e5",
            "go depth 2",
        ]
    );
}

#[tokio::test]
async fn no_legal_move_is_reported() {
    let dir = TempDir::new().unwrap();
    let path = install_fake_engine(&dir);
    let factory = UciEngineFactory::new(path.to_string_lossy());

    let engine = factory.spawn(1).await.unwrap();
    let err = engine.best_move("resign", 1).await.unwrap_err();
    assert!(matches!(err, EngineError::InvalidPosition(_)));
}

#[tokio::test]
async fn engine_that_exits_mid_game_is_closed() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("dies.sh");
    fs::write(
        &path,
        "#!/bin/sh\nread line; echo uciok\nread line\nread line; echo readyok\nexit 0\n",
    )
    .unwrap();
    fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).unwrap();

    let engine = UciEngineFactory::new(path.to_string_lossy())
        .spawn(3)
        .await
        .unwrap();
    let err = engine.best_move("", 1).await.unwrap_err();
    assert!(matches!(err, EngineError::Closed | EngineError::Io(_)));
}
