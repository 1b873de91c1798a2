use actix_web::{web, HttpResponse, Responder};
use serde_json::json;

use crate::api_json::handlers::{bad_request, store_failure};
use crate::api_json::parse_programs_body;
use crate::server::AppState;

/// PUT /programs
/// Inserta o reemplaza programas del catálogo. El blob `requirements` se
/// guarda tal cual, aunque no se pueda leer.
pub async fn put_programs_handler(state: web::Data<AppState>, body: web::Json<serde_json::Value>) -> impl Responder {
    let programs = match parse_programs_body(&body.into_inner()) {
        Ok(p) => p,
        Err(e) => return bad_request(e),
    };
    for program in &programs {
        if let Err(e) = state.catalog.upsert_program(program) {
            return store_failure(e);
        }
    }
    HttpResponse::Ok().json(json!({"status": "ok", "count": programs.len()}))
}
