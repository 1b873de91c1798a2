use actix_web::{web, HttpResponse, Responder};
use chrono::Utc;

use crate::algorithm::TracingObserver;
use crate::api_json::handlers::bad_request;
use crate::api_json::run_audit_json;
use crate::server::AppState;

/// POST /audit
/// Recibe `{courses, programs, matchedAt?}` y devuelve los cursos anotados,
/// el progreso por programa y los cursos doblemente contados.
pub async fn audit_handler(state: web::Data<AppState>, body: web::Json<serde_json::Value>) -> impl Responder {
    let body_value = body.into_inner();
    let options = state.options.clone().with_matched_at(Utc::now());
    match run_audit_json(&body_value, &options, &TracingObserver) {
        Ok(outcome) => HttpResponse::Ok().json(outcome),
        Err(e) => bad_request(e),
    }
}
