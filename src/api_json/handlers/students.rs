use actix_web::{web, HttpResponse, Responder};
use chrono::Utc;
use serde_json::json;

use crate::algorithm::{AuditCommand, AuditSession, TracingObserver};
use crate::api_json::handlers::{bad_request, store_failure};
use crate::api_json::{parse_courses_body, parse_program_ids};
use crate::server::AppState;

/// GET /students/{id}/courses
pub async fn get_courses_handler(state: web::Data<AppState>, path: web::Path<String>) -> impl Responder {
    let student_id = path.into_inner();
    match state.courses.fetch_courses(&student_id) {
        Ok(courses) => HttpResponse::Ok().json(json!({"studentId": student_id, "courses": courses})),
        Err(e) => store_failure(e),
    }
}

/// PUT /students/{id}/courses
/// Acepta un arreglo de cursos o `{courses}` y reemplaza la lista guardada.
pub async fn put_courses_handler(
    state: web::Data<AppState>,
    path: web::Path<String>,
    body: web::Json<serde_json::Value>,
) -> impl Responder {
    let student_id = path.into_inner();
    let courses = match parse_courses_body(&body.into_inner()) {
        Ok(c) => c,
        Err(e) => return bad_request(e),
    };
    match state.courses.update_courses(&student_id, &courses) {
        Ok(()) => HttpResponse::Ok().json(json!({"status": "ok", "count": courses.len()})),
        Err(e) => store_failure(e),
    }
}

/// POST /students/{id}/rematch
/// `{programIds}`: lee cursos y programas, re-evalúa, guarda los cursos
/// anotados y devuelve el resultado.
pub async fn rematch_handler(
    state: web::Data<AppState>,
    path: web::Path<String>,
    body: web::Json<serde_json::Value>,
) -> impl Responder {
    let student_id = path.into_inner();
    let program_ids = match parse_program_ids(&body.into_inner()) {
        Ok(ids) => ids,
        Err(e) => return bad_request(e),
    };
    let programs = match state.catalog.fetch_programs(&program_ids) {
        Ok(p) => p,
        Err(e) => return store_failure(e),
    };
    let courses = match state.courses.fetch_courses(&student_id) {
        Ok(c) => c,
        Err(e) => return store_failure(e),
    };

    let options = state.options.clone().with_matched_at(Utc::now());
    let mut session = AuditSession::new(courses, programs, options);
    let outcome = match session.apply(AuditCommand::Rematch, &TracingObserver) {
        Ok(o) => o,
        Err(e) => return bad_request(e),
    };

    if let Err(e) = state.courses.update_courses(&student_id, session.courses()) {
        return store_failure(e);
    }
    HttpResponse::Ok().json(outcome)
}
