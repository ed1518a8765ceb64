use actix_web::web;

pub mod health;
pub mod realtime;
pub mod sessions;

/// Register every route. Shared by `main.rs` and the integration tests.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.route("/", web::get().to(health::root));

    // Health check: /health
    cfg.service(web::scope("/health").configure(health::configure_routes));

    // Session audit: /api/sessions/{id}
    cfg.service(web::scope("/api/sessions").configure(sessions::configure_routes));

    // Player connections: /ws
    cfg.service(web::scope("/ws").configure(realtime::configure_routes));
}
