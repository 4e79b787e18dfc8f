//! The user-facing JSON web server that accepts canvas snapshots. This is the
//! whole "front end": decode the data URL, hand the bitmap to the analysis
//! collaborator, wrap whatever it returns in the response envelope.

use super::protocol::{CalculateRequest, CalculateResponse};
use super::ApiError;
use crate::analyzer::Analyzer;
use crate::canvas;
use crate::config::Settings;
use actix_web::{get, post, web, HttpResponse, Responder};
use serde_json::json;
use tracing::{debug, info};

type Result<T> = std::result::Result<T, ApiError>;

#[post("/calculate")]
pub async fn calculate(
    req: web::Json<CalculateRequest>,
    analyzer: web::Data<dyn Analyzer>,
    settings: web::Data<Settings>,
) -> Result<impl Responder> {
    // Parse the input request
    let image = canvas::decode(&req.image, settings.max_image_bytes)?;
    let (width, height) = image.dimensions();
    debug!("decoded {width}x{height} canvas snapshot");

    // Hand the bitmap to the collaborator
    let results = analyzer.analyze(&image, &req.dict_of_vars).await?;

    info!("finished serving calculate request ({} results)", results.len());

    Ok(web::Json(CalculateResponse::new(results)))
}

#[get("/")]
pub async fn root() -> impl Responder {
    HttpResponse::Ok().json(json!({
        "message": "Math Canvas API is running",
        "status": "success",
    }))
}

#[get("/health")]
pub async fn health() -> impl Responder {
    HttpResponse::Ok().json(json!({ "status": "healthy" }))
}
