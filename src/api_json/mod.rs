//! Frontera JSON del servicio: cuerpos de petición y su validación.
//!
//! Los datos de catálogo sucios nunca se rechazan aquí (el motor los tolera);
//! sólo se rechaza un cuerpo con forma incorrecta, p. ej. `courses` que no es
//! un arreglo.
//!
//! # Cuerpo de `POST /audit`:
//! ```json
//! {
//!   "courses": [{"subject": "CS", "number": "142", "credits": 3, "grade": "A"}],
//!   "programs": [{"id": 12, "name": "Computer Science", "programType": "major", "requirements": "{...}"}],
//!   "matchedAt": "2024-05-01T12:00:00Z"
//! }
//! ```

pub mod handlers;

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::algorithm::{run_audit, AuditObserver, AuditOutcome, MatchOptions};
use crate::error::AuditError;
use crate::models::serde_helpers::value_to_string;
use crate::models::{Program, StudentCourse};

#[derive(Debug, Clone)]
pub struct AuditRequest {
    pub courses: Vec<StudentCourse>,
    pub programs: Vec<Program>,
    pub matched_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone)]
pub struct CompareRequest {
    pub courses: Vec<StudentCourse>,
    pub candidates: Vec<Program>,
    pub gen_ed: Option<Program>,
}

fn object<'a>(body: &'a Value, what: &str) -> Result<&'a serde_json::Map<String, Value>, AuditError> {
    body.as_object()
        .ok_or_else(|| AuditError::InvalidInput(format!("{} body must be a JSON object", what)))
}

/// Deserialize every element of the array at `field`.
fn array_field<T: DeserializeOwned>(obj: &serde_json::Map<String, Value>, field: &str) -> Result<Vec<T>, AuditError> {
    let items = match obj.get(field) {
        Some(Value::Array(items)) => items,
        None | Some(Value::Null) => return Err(AuditError::InvalidInput(format!("`{}` is required", field))),
        Some(_) => return Err(AuditError::InvalidInput(format!("`{}` must be an array", field))),
    };
    items
        .iter()
        .enumerate()
        .map(|(i, item)| {
            serde_json::from_value::<T>(item.clone())
                .map_err(|e| AuditError::InvalidInput(format!("`{}[{}]`: {}", field, i, e)))
        })
        .collect()
}

fn matched_at_field(obj: &serde_json::Map<String, Value>) -> Result<Option<DateTime<Utc>>, AuditError> {
    match obj.get("matchedAt") {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => DateTime::parse_from_rfc3339(s)
            .map(|d| Some(d.with_timezone(&Utc)))
            .map_err(|e| AuditError::InvalidInput(format!("`matchedAt` is not RFC 3339: {}", e))),
        Some(_) => Err(AuditError::InvalidInput("`matchedAt` must be a string".to_string())),
    }
}

pub fn parse_audit_request(body: &Value) -> Result<AuditRequest, AuditError> {
    let obj = object(body, "audit")?;
    Ok(AuditRequest {
        courses: array_field(obj, "courses")?,
        programs: array_field(obj, "programs")?,
        matched_at: matched_at_field(obj)?,
    })
}

pub fn parse_compare_request(body: &Value) -> Result<CompareRequest, AuditError> {
    let obj = object(body, "compare")?;
    let gen_ed = match obj.get("genEd") {
        None | Some(Value::Null) => None,
        Some(v) => Some(
            serde_json::from_value::<Program>(v.clone())
                .map_err(|e| AuditError::InvalidInput(format!("`genEd`: {}", e)))?,
        ),
    };
    Ok(CompareRequest {
        courses: array_field(obj, "courses")?,
        candidates: array_field(obj, "candidates")?,
        gen_ed,
    })
}

pub fn parse_programs_body(body: &Value) -> Result<Vec<Program>, AuditError> {
    array_field(object(body, "programs")?, "programs")
}

/// `PUT /students/{id}/courses` accepts either a bare array or `{courses}`.
pub fn parse_courses_body(body: &Value) -> Result<Vec<StudentCourse>, AuditError> {
    match body {
        Value::Array(_) => {
            let mut wrapper = serde_json::Map::new();
            wrapper.insert("courses".to_string(), body.clone());
            array_field(&wrapper, "courses")
        }
        _ => array_field(object(body, "courses")?, "courses"),
    }
}

/// Program ids as strings; numeric ids are accepted.
pub fn parse_program_ids(body: &Value) -> Result<Vec<String>, AuditError> {
    let obj = object(body, "rematch")?;
    match obj.get("programIds") {
        Some(Value::Array(items)) => Ok(items
            .iter()
            .map(value_to_string)
            .filter(|id| !id.is_empty())
            .collect()),
        Some(_) => Err(AuditError::InvalidInput("`programIds` must be an array".to_string())),
        None => Err(AuditError::InvalidInput("`programIds` is required".to_string())),
    }
}

/// Validate a raw audit body and run the engine on it.
pub fn run_audit_json(
    body: &Value,
    options: &MatchOptions,
    observer: &dyn AuditObserver,
) -> Result<AuditOutcome, AuditError> {
    let request = parse_audit_request(body)?;
    let mut options = options.clone();
    if request.matched_at.is_some() {
        options.matched_at = request.matched_at;
    }
    Ok(run_audit(&request.courses, &request.programs, &options, observer))
}
