use actix_web::{web, HttpResponse, Responder};
use serde_json::json;

use crate::api_json::handlers::bad_request;
use crate::api_json::parse_programs_body;
use crate::requirements::extract_requirement_options;

/// POST /requirements/options
/// Lista plana de requisitos a los que se puede asignar un curso a mano.
pub async fn requirement_options_handler(body: web::Json<serde_json::Value>) -> impl Responder {
    match parse_programs_body(&body.into_inner()) {
        Ok(programs) => HttpResponse::Ok().json(json!({"options": extract_requirement_options(&programs)})),
        Err(e) => bad_request(e),
    }
}
