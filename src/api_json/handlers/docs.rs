use actix_web::{HttpResponse, Responder};
use serde_json::json;

/// GET /help
/// Describe las rutas y muestra cuerpos de ejemplo.
pub async fn help_handler() -> impl Responder {
    let course = json!({
        "id": "c-1",
        "term": "Fall 2023",
        "subject": "CS",
        "number": "142",
        "title": "Intro to Programming",
        "credits": 3,
        "grade": "A",
        "fulfillsRequirements": []
    });
    let program = json!({
        "id": 12,
        "name": "Computer Science BS",
        "programType": "major",
        "requirements": {
            "programRequirements": [
                {"requirementId": 1, "description": "Core", "type": "allOf",
                 "courses": [{"code": "CS 142", "credits": 3}, {"code": "CS 235", "credits": 3}]},
                {"requirementId": 2, "description": "Upper electives", "type": "chooseNOf",
                 "constraints": {"n": 2}, "courses": [{"code": "CS 3XX"}, {"code": "CS 4XX"}]}
            ],
            "metadata": {"noDoubleCount": false}
        }
    });

    let help = json!({
        "description": "Requirement matching and audit service. Courses are matched by code against each program's requirement tree; manual fulfillments are never overwritten.",
        "routes": {
            "POST /audit": "{courses, programs, matchedAt?} -> {courses: [{course}], programs, doubleCounts}",
            "POST /compare": "{courses, candidates, genEd?} -> {comparisons}",
            "POST /requirements/options": "{programs} -> {options}",
            "GET /students/{id}/courses": "stored courses",
            "PUT /students/{id}/courses": "[course] or {courses}",
            "PUT /programs": "{programs}",
            "POST /students/{id}/rematch": "{programIds}"
        },
        "audit_example": {"courses": [course], "programs": [program]},
        "rematch_example": {"programIds": [12]}
    });

    HttpResponse::Ok().json(help)
}
