use std::sync::Arc;

use actix_web::{web, App, HttpServer};
use blitz_backend::ai::registry::factory_for;
use blitz_backend::domain::StandardRules;
use blitz_backend::routes;
use blitz_backend::{AppState, Arena, ArenaConfig, ServerConfig};
use tracing::{error, info};

mod telemetry;

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    telemetry::init_tracing();

    let server = match ServerConfig::from_env() {
        Ok(server) => server,
        Err(e) => {
            eprintln!("❌ {e}");
            std::process::exit(1);
        }
    };
    let config = match ArenaConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("❌ {e}");
            std::process::exit(1);
        }
    };

    let engines = match factory_for(&config.ai) {
        Ok(engines) => engines,
        Err(e) => {
            eprintln!("❌ {e}");
            std::process::exit(1);
        }
    };

    // Start the engine once; a server that cannot field AI opponents is
    // not worth starting.
    if let Err(e) = engines.spawn(0).await {
        error!(engine = engines.name(), error = %e, "engine check failed");
        eprintln!("❌ Failed to start move engine `{}`: {e}", engines.name());
        std::process::exit(1);
    }
    info!(engine = engines.name(), "move engine available");

    let arena = Arena::new(config, engines, Arc::new(StandardRules));
    let _janitor = arena.spawn_janitor();

    println!(
        "🚀 Starting Blitz Backend on http://{}:{}",
        server.host, server.port
    );

    let data = web::Data::new(AppState::new(arena));

    HttpServer::new(move || {
        App::new()
            .app_data(data.clone())
            .configure(routes::configure)
    })
    .bind((server.host.as_str(), server.port))?
    .run()
    .await
}
