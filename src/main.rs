use actix_cors::Cors;
use actix_web::{middleware, web, App, HttpServer};
use anyhow::Context;
use mathcanvas::analyzer::{Analyzer, DisabledAnalyzer, GeminiAnalyzer};
use mathcanvas::config::{RunMode, Settings, PROD_ORIGINS};
use mathcanvas::server::{self, routes};
use std::sync::Arc;

use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    let settings = Settings::from_env().context("failed to load configuration")?;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(settings.default_log_filter()));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let analyzer: Arc<dyn Analyzer> = match settings.gemini_api_key.as_deref() {
        Some(key) => Arc::new(GeminiAnalyzer::new(key)),
        None => {
            warn!("GEMINI_API_KEY is not set; /calculate will report a server error");
            Arc::new(DisabledAnalyzer)
        }
    };
    let analyzer = web::Data::from(analyzer);

    let bind = settings.bind_addr();
    info!("starting mathcanvas backend on {bind} ({:?} mode)", settings.env);

    let settings_data = web::Data::new(settings.clone());

    // Start the HTTP server
    HttpServer::new(move || {
        let cors = match settings.env {
            RunMode::Dev => Cors::permissive(),
            RunMode::Prod => {
                let mut cors = Cors::default()
                    .allowed_methods(["GET", "POST"])
                    .allow_any_header()
                    .supports_credentials();
                for origin in PROD_ORIGINS {
                    cors = cors.allowed_origin(origin);
                }
                cors
            }
        };

        App::new()
            .app_data(analyzer.clone())
            .app_data(settings_data.clone())
            .app_data(
                web::JsonConfig::default()
                    .limit(settings.json_body_limit())
                    .error_handler(server::json_error_handler),
            )
            .wrap(cors)
            .wrap(middleware::Logger::default())
            .service(routes::calculate)
            .service(routes::root)
            .service(routes::health)
    })
    .bind(&bind)
    .with_context(|| format!("failed to bind {bind}"))?
    .run()
    .await?;

    Ok(())
}
