// In-process HTTP server for websocket tests.

use std::net::TcpListener;
use std::sync::Arc;

use actix_web::{web, App, HttpServer};
use blitz_backend::routes;
use blitz_backend::{AppState, Arena};

/// Serve every route on an ephemeral port. Returns the handle, the bound
/// address and the join handle of the server task.
pub async fn start_test_server(
    arena: Arc<Arena>,
) -> Result<
    (
        actix_web::dev::ServerHandle,
        std::net::SocketAddr,
        tokio::task::JoinHandle<Result<(), std::io::Error>>,
    ),
    Box<dyn std::error::Error>,
> {
    let listener = TcpListener::bind("127.0.0.1:0")?;
    let addr = listener.local_addr()?;
    let state_data = web::Data::new(AppState::new(arena));

    let server = HttpServer::new(move || {
        App::new()
            .app_data(state_data.clone())
            .configure(routes::configure)
    })
    .workers(1)
    .listen(listener)?
    .run();

    let server_handle = server.handle();
    let join = tokio::spawn(server);

    Ok((server_handle, addr, join))
}
