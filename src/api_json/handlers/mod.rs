pub mod audit;
pub mod compare;
pub mod options;
pub mod students;
pub mod programs;
pub mod docs;

pub use audit::*;
pub use compare::*;
pub use options::*;
pub use students::*;
pub use programs::*;
pub use docs::*;

use actix_web::HttpResponse;
use serde_json::json;
use tracing::error;

use crate::error::{AuditError, StoreError};

pub(crate) fn bad_request(e: AuditError) -> HttpResponse {
    HttpResponse::BadRequest().json(json!({"error": e.to_string()}))
}

pub(crate) fn store_failure(e: StoreError) -> HttpResponse {
    match e {
        StoreError::NotFound(what) => HttpResponse::NotFound().json(json!({"error": format!("not found: {}", what)})),
        other => {
            error!("store failure: {}", other);
            HttpResponse::InternalServerError().json(json!({"error": format!("store failure: {}", other)}))
        }
    }
}
