use actix_cors::Cors;
use actix_files::Files;
use actix_web::middleware::{DefaultHeaders, Logger};
use actix_web::{web, App, HttpServer};
use anyhow::Context;
use log::{error, info};

use attrition_predictor::{inference, routes};

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_millis()
        .format_module_path(false)
        .init();

    info!("🚀 starting employee attrition prediction service");

    // The artifact is the only process-wide state: loaded once before the
    // server binds, read-only afterwards. A missing or malformed file is
    // fatal.
    let artifact = match inference::get_artifact() {
        Ok(artifact) => {
            info!("✅ prediction artifact loaded");
            artifact
        }
        Err(e) => {
            error!("❌ cannot load prediction artifact: {e}");
            return Err(e.into());
        }
    };
    let artifact_data = web::Data::new(artifact);

    let host = std::env::var("HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
    let port = std::env::var("PORT").unwrap_or_else(|_| "8080".to_string());
    let bind_address = format!("{host}:{port}");
    let allowed_origins = [
        format!("http://{bind_address}"),
        format!("http://localhost:{port}"),
    ];

    info!("🌐 listening on http://{bind_address}");
    info!("📊 form available on http://{bind_address}/");
    info!("🔧 endpoints:");
    info!("   GET  /api/health      - liveness");
    info!("   GET  /api/model-info  - artifact metadata");
    info!("   POST /api/predict     - one prediction per record");

    HttpServer::new(move || {
        let cors = allowed_origins
            .iter()
            .fold(Cors::default(), |cors, origin| cors.allowed_origin(origin))
            .allowed_methods(vec!["GET", "POST"])
            .allowed_headers(vec![actix_web::http::header::CONTENT_TYPE])
            .max_age(3600);

        App::new()
            .wrap(Logger::default())
            .wrap(DefaultHeaders::new().add(("X-Content-Type-Options", "nosniff")))
            .wrap(cors)
            .app_data(artifact_data.clone())
            .configure(routes::configure)
            .route("/", web::get().to(routes::index))
            .service(Files::new("/static", "./static").prefer_utf8(true))
            .default_service(web::route().to(routes::not_found))
    })
    // One interaction at a time: a prediction request runs to completion
    // before the next one is processed.
    .workers(1)
    .bind(&bind_address)
    .with_context(|| format!("cannot bind {bind_address}"))?
    .run()
    .await?;

    Ok(())
}
