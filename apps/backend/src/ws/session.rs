use std::sync::Arc;
use std::time::{Duration, Instant};

use actix::prelude::*;
use actix_web::{web, Error, HttpRequest, HttpResponse};
use actix_web_actors::ws;
use tracing::{debug, info, warn};

use crate::domain::PlayerId;
use crate::services::{Arena, Player};
use crate::state::app_state::AppState;
use crate::ws::protocol::{ClientMsg, ServerMsg};
use crate::ws::transport::{Transport, TransportError};

const HEARTBEAT_INTERVAL: Duration = Duration::from_secs(20);
const CLIENT_TIMEOUT: Duration = Duration::from_secs(40);

/// Pre-encoded outbound frame.
#[derive(Message)]
#[rtype(result = "()")]
pub struct Outbound(pub String);

#[derive(Message)]
#[rtype(result = "()")]
pub struct CloseConnection;

pub async fn upgrade(
    req: HttpRequest,
    stream: web::Payload,
    app_state: web::Data<AppState>,
) -> Result<HttpResponse, Error> {
    let session = WsSession::new(app_state.arena());
    ws::start(session, &req, stream)
}

/// [`Transport`] backed by a websocket actor's mailbox.
pub struct WsTransport {
    addr: Addr<WsSession>,
}

impl WsTransport {
    pub fn new(addr: Addr<WsSession>) -> Self {
        Self { addr }
    }
}

impl Transport for WsTransport {
    fn send(&self, msg: &ServerMsg) -> Result<(), TransportError> {
        if !self.addr.connected() {
            return Err(TransportError::Closed);
        }
        let payload = serde_json::to_string(msg)?;
        self.addr.do_send(Outbound(payload));
        Ok(())
    }

    fn close(&self) {
        if self.addr.connected() {
            self.addr.do_send(CloseConnection);
        }
    }
}

/// One player's connection. The player exists for exactly as long as the
/// socket: opening it enters matchmaking, closing it withdraws.
pub struct WsSession {
    player_id: PlayerId,
    arena: Arc<Arena>,
    player: Option<Arc<Player>>,

    last_heartbeat: Instant,
    heartbeat_handle: Option<actix::SpawnHandle>,
}

impl WsSession {
    pub fn new(arena: Arc<Arena>) -> Self {
        Self {
            player_id: PlayerId::new(),
            arena,
            player: None,
            last_heartbeat: Instant::now(),
            heartbeat_handle: None,
        }
    }

    fn start_heartbeat(&mut self, ctx: &mut ws::WebsocketContext<Self>) {
        let handle = ctx.run_interval(HEARTBEAT_INTERVAL, |actor, ctx| {
            if Instant::now().duration_since(actor.last_heartbeat) > CLIENT_TIMEOUT {
                warn!(
                    player_id = %actor.player_id,
                    "[WS SESSION] heartbeat timed out"
                );
                ctx.close(Some(ws::CloseReason::from(ws::CloseCode::Normal)));
                ctx.stop();
                return;
            }
            ctx.ping(b"keepalive");
        });
        self.heartbeat_handle = Some(handle);
    }

    fn handle_text(&mut self, text: &str) {
        let cmd: ClientMsg = match serde_json::from_str(text) {
            Ok(cmd) => cmd,
            Err(err) => {
                warn!(
                    player_id = %self.player_id,
                    error = %err,
                    "[WS SESSION] malformed message ignored"
                );
                return;
            }
        };

        let outcome = self
            .arena
            .process_move(self.player_id, &cmd.mv, cmd.is_first_move);
        debug!(
            player_id = %self.player_id,
            mv = %cmd.mv,
            ?outcome,
            "[WS SESSION] move submitted"
        );
    }
}

impl Actor for WsSession {
    type Context = ws::WebsocketContext<Self>;

    fn started(&mut self, ctx: &mut Self::Context) {
        info!(player_id = %self.player_id, "[WS SESSION] started");

        let transport = Arc::new(WsTransport::new(ctx.address()));
        let player = Arc::new(Player::with_id(self.player_id, transport));
        self.player = Some(Arc::clone(&player));
        self.arena.find_opponent(player);

        self.start_heartbeat(ctx);
    }

    fn stopped(&mut self, _ctx: &mut Self::Context) {
        if let Some(player) = self.player.take() {
            self.arena.leave(&player);
        }
        info!(player_id = %self.player_id, "[WS SESSION] stopped");
    }
}

impl StreamHandler<Result<ws::Message, ws::ProtocolError>> for WsSession {
    fn handle(&mut self, msg: Result<ws::Message, ws::ProtocolError>, ctx: &mut Self::Context) {
        match msg {
            Ok(ws::Message::Ping(payload)) => {
                self.last_heartbeat = Instant::now();
                ctx.pong(&payload);
            }
            Ok(ws::Message::Pong(_)) => {
                self.last_heartbeat = Instant::now();
            }
            Ok(ws::Message::Text(text)) => {
                self.last_heartbeat = Instant::now();
                self.handle_text(&text);
            }
            Ok(ws::Message::Binary(_)) => {
                self.last_heartbeat = Instant::now();
                debug!(player_id = %self.player_id, "[WS SESSION] binary frame ignored");
            }
            Ok(ws::Message::Close(reason)) => {
                ctx.close(reason);
                ctx.stop();
            }
            Ok(ws::Message::Continuation(_)) | Ok(ws::Message::Nop) => {
                self.last_heartbeat = Instant::now();
            }
            Err(err) => {
                warn!(
                    player_id = %self.player_id,
                    error = %err,
                    "[WS SESSION] protocol error"
                );
                ctx.close(Some(ws::CloseReason::from(ws::CloseCode::Error)));
                ctx.stop();
            }
        }
    }
}

impl Handler<Outbound> for WsSession {
    type Result = ();

    fn handle(&mut self, msg: Outbound, ctx: &mut Self::Context) -> Self::Result {
        ctx.text(msg.0);
    }
}

impl Handler<CloseConnection> for WsSession {
    type Result = ();

    fn handle(&mut self, _msg: CloseConnection, ctx: &mut Self::Context) -> Self::Result {
        debug!(player_id = %self.player_id, "[WS SESSION] closing after game end");
        ctx.close(Some(ws::CloseReason::from(ws::CloseCode::Normal)));
        ctx.stop();
    }
}
