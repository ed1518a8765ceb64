//! Move engine backed by a UCI subprocess (stockfish or compatible).

use std::process::Stdio;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, Lines};
use tokio::process::{Child, ChildStdin, ChildStdout, Command};
use tokio::sync::Mutex;
use tokio::time::timeout;
use tracing::{debug, info};

use super::trait_def::{EngineError, EngineFactory, MoveEngine};

/// Bound on `uci`/`isready` round trips while bringing an engine up.
/// Move searches themselves are not bounded.
const HANDSHAKE_TIMEOUT: Duration = Duration::from_secs(10);

struct EngineIo {
    stdin: ChildStdin,
    stdout: Lines<BufReader<ChildStdout>>,
    // Held so the process is killed when the engine is dropped.
    _child: Child,
}

impl EngineIo {
    async fn send(&mut self, line: &str) -> Result<(), EngineError> {
        debug!(line, "uci >");
        self.stdin.write_all(line.as_bytes()).await?;
        self.stdin.write_all(b"\n").await?;
        self.stdin.flush().await?;
        Ok(())
    }

    /// Read lines until one satisfies `done`, returning that line.
    async fn read_until<F>(&mut self, done: F) -> Result<String, EngineError>
    where
        F: Fn(&str) -> bool,
    {
        loop {
            let Some(line) = self.stdout.next_line().await? else {
                return Err(EngineError::Closed);
            };
            let line = line.trim().to_string();
            if done(&line) {
                debug!(line = %line, "uci <");
                return Ok(line);
            }
        }
    }

    async fn handshake(&mut self, line: &str, expect: &'static str) -> Result<(), EngineError> {
        self.send(line).await?;
        timeout(HANDSHAKE_TIMEOUT, self.read_until(|l| l == expect))
            .await
            .map_err(|_| EngineError::Protocol(format!("no `{expect}` within handshake timeout")))??;
        Ok(())
    }
}

pub struct UciEngine {
    io: Mutex<EngineIo>,
    level: u8,
}

impl UciEngine {
    /// Launch `path`, complete the UCI handshake and set `Skill Level`.
    pub async fn launch(path: &str, level: u8) -> Result<Self, EngineError> {
        let mut child = Command::new(path)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .spawn()
            .map_err(|source| EngineError::Spawn {
                path: path.to_string(),
                source,
            })?;

        let stdin = child.stdin.take().ok_or(EngineError::Closed)?;
        let stdout = child.stdout.take().ok_or(EngineError::Closed)?;
        let mut io = EngineIo {
            stdin,
            stdout: BufReader::new(stdout).lines(),
            _child: child,
        };

        io.handshake("uci", "uciok").await?;
        io.send(&format!("setoption name Skill Level value {level}"))
            .await?;
        io.handshake("isready", "readyok").await?;

        info!(path, level, "uci engine ready");
        Ok(Self {
            io: Mutex::new(io),
            level,
        })
    }

    pub fn level(&self) -> u8 {
        self.level
    }
}

#[async_trait]
impl MoveEngine for UciEngine {
    async fn best_move(&self, history: &str, depth: u8) -> Result<String, EngineError> {
        let history = history.trim();
        let position = if history.is_empty() {
            "position startpos".to_string()
        } else {
            format!("position startpos moves {history}")
        };

        let mut io = self.io.lock().await;
        io.send(&position).await?;
        io.send(&format!("go depth {depth}")).await?;
        let line = io.read_until(|l| l.starts_with("bestmove")).await?;
        parse_bestmove(&line)
    }
}

fn parse_bestmove(line: &str) -> Result<String, EngineError> {
    let mut parts = line.split_whitespace();
    match (parts.next(), parts.next()) {
        (Some("bestmove"), Some("(none)")) => Err(EngineError::InvalidPosition(
            "engine reports no legal move".to_string(),
        )),
        (Some("bestmove"), Some(mv)) => Ok(mv.to_string()),
        _ => Err(EngineError::Protocol(format!("unexpected reply `{line}`"))),
    }
}

/// Spawns one [`UciEngine`] process per AI opponent.
#[derive(Debug, Clone)]
pub struct UciEngineFactory {
    path: String,
}

impl UciEngineFactory {
    pub const NAME: &'static str = "stockfish";

    pub fn new(path: impl Into<String>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &str {
        &self.path
    }
}

#[async_trait]
impl EngineFactory for UciEngineFactory {
    fn name(&self) -> &str {
        Self::NAME
    }

    async fn spawn(&self, level: u8) -> Result<Arc<dyn MoveEngine>, EngineError> {
        let engine = UciEngine::launch(&self.path, level).await?;
        Ok(Arc::new(engine))
    }
}
