use actix_web::{web, HttpResponse, Responder};
use serde_json::json;

use crate::algorithm::{compare_programs, TracingObserver};
use crate::api_json::handlers::{bad_request, store_failure};
use crate::api_json::parse_compare_request;
use crate::server::AppState;

/// POST /compare
/// `{courses, candidates, genEd?}`. Sin `genEd` se busca en el catálogo el
/// primer programa de un tipo con emparejamiento por sujeto.
pub async fn compare_handler(state: web::Data<AppState>, body: web::Json<serde_json::Value>) -> impl Responder {
    let request = match parse_compare_request(&body.into_inner()) {
        Ok(r) => r,
        Err(e) => return bad_request(e),
    };

    let gen_ed = match request.gen_ed {
        Some(g) => Some(g),
        None => {
            let mut found = None;
            for program_type in &state.options.subject_match_program_types {
                match state.catalog.fetch_programs_by_type(program_type) {
                    Ok(mut programs) if !programs.is_empty() => {
                        found = Some(programs.remove(0));
                        break;
                    }
                    Ok(_) => continue,
                    Err(e) => return store_failure(e),
                }
            }
            found
        }
    };

    let comparisons = compare_programs(
        &request.courses,
        &request.candidates,
        gen_ed.as_ref(),
        &state.options,
        &TracingObserver,
    );
    HttpResponse::Ok().json(json!({"comparisons": comparisons}))
}
