#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Actix-Web API server for the regional health report generator.
//!
//! Exposes report generation (`POST /research`) and follow-up questions
//! (`POST /ask`), plus a health check, and serves the front-end files
//! from the static directory.

mod handlers;

use actix_cors::Cors;
use actix_files::Files;
use actix_web::{App, HttpServer, middleware, web};
use health_report::ReportService;

/// Shared application state.
pub struct AppState {
    /// Report generation, caching and follow-up answers.
    pub reports: ReportService,
}

/// Registers the API routes.
pub fn configure_api(cfg: &mut web::ServiceConfig) {
    cfg.route("/research", web::post().to(handlers::research))
        .route("/ask", web::post().to(handlers::ask))
        .service(web::scope("/api").route("/health", web::get().to(handlers::health)));
}

/// Starts the health report API server.
///
/// Builds the report service from the environment and starts the
/// Actix-Web HTTP server. The caller provides the async runtime (e.g. via
/// `#[actix_web::main]`).
///
/// A missing `PERPLEXITY_API_KEY` does not stop the server; reports then
/// carry an error description instead of content.
///
/// # Errors
///
/// Returns an `std::io::Result` error if the report service cannot be
/// created, or if the HTTP server fails to bind or encounters a runtime
/// error.
#[allow(clippy::future_not_send)]
pub async fn run_server() -> std::io::Result<()> {
    pretty_env_logger::init_custom_env("RUST_LOG");

    log::info!("Creating report service...");
    let reports = ReportService::from_env().map_err(std::io::Error::other)?;
    let state = web::Data::new(AppState { reports });

    let bind_addr = std::env::var("BIND_ADDR").unwrap_or_else(|_| "127.0.0.1".to_string());
    let port: u16 = std::env::var("PORT")
        .ok()
        .and_then(|p| p.parse().ok())
        .unwrap_or(8000);
    let static_dir = std::env::var("STATIC_DIR").unwrap_or_else(|_| "static".to_string());

    log::info!("Starting server on {bind_addr}:{port} (static files from {static_dir})");

    HttpServer::new(move || {
        let cors = Cors::permissive();

        App::new()
            .wrap(cors)
            .wrap(middleware::Logger::default())
            .app_data(state.clone())
            .configure(configure_api)
            // Serve frontend static files
            .service(Files::new("/", &static_dir).index_file("index.html"))
    })
    .bind((bind_addr, port))?
    .run()
    .await
}
