use degreeaudit::algorithm::matcher::{course_match, extract_subject, match_code, matches, matching_requirement_courses, MatchKind};
use degreeaudit::models::{CourseOrigin, StudentCourse, TransferCredit};
use degreeaudit::requirements::Course;

fn taken(subject: &str, number: &str) -> StudentCourse {
    StudentCourse::new(subject, number, Some(3.0), Some("A"))
}

#[test]
fn test_match_ignores_case_spaces_and_hyphens() {
    let req = Course::new("c s-142", 3.0);
    assert!(matches(&taken("CS", "142"), &req, false));
    assert!(matches(&taken("cs", " 142 "), &req, false));
}

#[test]
fn test_wildcard_stops_at_digit_boundary() {
    let req = Course::new("CS 1XX", 3.0);
    assert!(matches(&taken("CS", "142"), &req, false));
    assert!(matches(&taken("CS", "199"), &req, false));
    assert!(!matches(&taken("CS", "242"), &req, false));
    assert!(!matches(&taken("MATH", "142"), &req, false));
}

#[test]
fn test_subject_only_match_is_opt_in() {
    let req = Course::new("HIST 100", 3.0);
    assert!(!matches(&taken("HIST", "320"), &req, false));
    assert_eq!(match_code("HIST 320", &req, true), Some(MatchKind::Subject));
}

#[test]
fn test_multi_letter_subjects_with_spaces() {
    // "REL A" y "REL C" son sujetos distintos
    let req = Course::new("REL A 275", 2.0);
    assert_eq!(extract_subject("REL C 200"), "RELC");
    assert!(!matches(&taken("REL C", "200"), &req, true));
    assert!(matches(&taken("REL A", "121"), &req, true));
}

#[test]
fn test_transfer_original_code_matches() {
    let mut course = taken("MATH", "1XX");
    course.transfer = Some(TransferCredit {
        institution: "Salt Lake CC".into(),
        original_subject: "MATH".into(),
        original_number: "1210".into(),
        original_title: "Calculus I".into(),
        original_credits: 4.0,
        original_grade: "A".into(),
    });
    assert!(course_match(&course, &Course::new("MATH 1210", 4.0), false).is_none());

    course.origin = Some(CourseOrigin::Transfer);
    let m = course_match(&course, &Course::new("MATH 1210", 4.0), false).unwrap();
    assert_eq!(m.kind, MatchKind::Exact);
    assert_eq!(m.via_code.as_deref(), Some("MATH 1210"));

    // el código propio gana cuando ambos coinciden
    let own = course_match(&course, &Course::new("MATH 1XX", 4.0), false).unwrap();
    assert_eq!(own.via_code, None);
}

#[test]
fn test_matching_requirement_courses_returns_all_hits() {
    let pool = vec![Course::new("CS 142", 3.0), Course::new("CS 1XX", 3.0), Course::new("CS 235", 3.0)];
    let hits = matching_requirement_courses(&taken("CS", "142"), &pool, false);
    let codes: Vec<&str> = hits.iter().map(|c| c.code.as_str()).collect();
    assert_eq!(codes, vec!["CS 142", "CS 1XX"]);
}

#[test]
fn test_empty_codes_never_match() {
    assert_eq!(match_code("", &Course::new("CS 142", 3.0), true), None);
    assert_eq!(match_code("CS 142", &Course::new("XX", 3.0), false), None);
}
