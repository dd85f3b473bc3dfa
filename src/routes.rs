use std::sync::Arc;
use std::time::Instant;

use actix_files::NamedFile;
use actix_web::{get, post, web, HttpRequest, HttpResponse, Responder};
use log::{error, info, warn};

use crate::inference::AttritionArtifact;
use crate::models::{ApiResponse, EmployeeRecord, PredictionResult, MSG_MISSING_FIELDS};

/// Registers the API routes. Shared between the server and the tests.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(health).service(model_info).service(predict);
}

#[get("/api/health")]
async fn health() -> impl Responder {
    HttpResponse::Ok().json(ApiResponse::success("✅ attrition prediction service"))
}

#[get("/api/model-info")]
async fn model_info(artifact: web::Data<Arc<AttritionArtifact>>) -> impl Responder {
    HttpResponse::Ok().json(ApiResponse::success(artifact.info()))
}

/// One full interaction: collect → validate → predict. The record is a
/// complete snapshot of the form; validation rejects unset categorical
/// fields before any inference runs.
#[post("/api/predict")]
async fn predict(
    artifact: web::Data<Arc<AttritionArtifact>>,
    record: web::Json<EmployeeRecord>,
) -> impl Responder {
    let start = Instant::now();
    info!("prediction request received");

    let record = record.into_inner();
    let missing = artifact.missing_fields(&record);
    if !missing.is_empty() {
        warn!("rejected record with unset fields: {}", missing.join(", "));
        let mut response = ApiResponse::<PredictionResult>::error(MSG_MISSING_FIELDS);
        response.execution_time_ms = Some(start.elapsed().as_millis() as u64);
        return HttpResponse::BadRequest().json(response);
    }

    let shared = artifact.get_ref().clone();
    match web::block(move || shared.predict(&record)).await {
        Ok(Ok(prediction)) => {
            info!(
                "prediction {}: probability={:.3}",
                prediction.label.as_str(),
                prediction.probability
            );
            let result = PredictionResult::new(
                prediction.label,
                prediction.probability,
                &artifact.model.version,
            );
            let mut response = ApiResponse::success(result);
            response.execution_time_ms = Some(start.elapsed().as_millis() as u64);
            HttpResponse::Ok().json(response)
        }
        Ok(Err(e)) => {
            error!("prediction failed: {e}");
            let mut response =
                ApiResponse::<PredictionResult>::error(&format!("prediction failed: {e}"));
            response.execution_time_ms = Some(start.elapsed().as_millis() as u64);
            HttpResponse::InternalServerError().json(response)
        }
        Err(e) => {
            error!("blocking execution failed: {e}");
            let mut response = ApiResponse::<PredictionResult>::error("execution failed");
            response.execution_time_ms = Some(start.elapsed().as_millis() as u64);
            HttpResponse::InternalServerError().json(response)
        }
    }
}

/// The form page.
pub async fn index(req: HttpRequest) -> impl Responder {
    match NamedFile::open_async("./static/index.html").await {
        Ok(file) => file.into_response(&req),
        Err(e) => {
            error!("cannot open form page: {e}");
            HttpResponse::InternalServerError().body("form page unavailable")
        }
    }
}

/// Fallback for unknown routes.
pub async fn not_found() -> impl Responder {
    HttpResponse::NotFound().json(ApiResponse::<String>::error("endpoint not found"))
}
