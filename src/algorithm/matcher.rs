//! Emparejamiento de códigos de curso: exacto, prefijo con comodín y sólo
//! sujeto (pools de educación general).
//!
//! Matching is code-based only; titles are never compared.

use crate::models::StudentCourse;
use crate::requirements::Course;

/// How a student code matched a catalog code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum MatchKind {
    Exact,
    /// `"CS 1XX"` or a bare prefix such as `"CS 1"`.
    Prefix,
    /// Same leading subject letters only. Lenient pools only.
    Subject,
}

/// Result of matching one student course against one catalog course.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CodeMatch {
    pub kind: MatchKind,
    /// The transfer original code, when that is what matched.
    pub via_code: Option<String>,
}

/// Strip whitespace and hyphens, upper-case.
pub fn normalize_code(code: &str) -> String {
    code.chars()
        .filter(|c| !c.is_whitespace() && *c != '-')
        .collect::<String>()
        .to_uppercase()
}

/// Leading 1-4 alphabetic characters of a code (`"REL A 275"` -> `"RELA"`).
pub fn extract_subject(code: &str) -> String {
    normalize_code(code)
        .chars()
        .take_while(|c| c.is_ascii_alphabetic())
        .take(4)
        .collect()
}

/// Match a single code string against a catalog course.
pub fn match_code(student_code: &str, requirement: &Course, allow_subject_match: bool) -> Option<MatchKind> {
    let student = normalize_code(student_code);
    let required = normalize_code(&requirement.code);
    if student.is_empty() || required.is_empty() {
        return None;
    }

    if student == required {
        return Some(MatchKind::Exact);
    }

    let stem = required.trim_end_matches('X');
    if !stem.is_empty() && student.starts_with(stem) {
        return Some(MatchKind::Prefix);
    }

    if allow_subject_match {
        let student_subject = extract_subject(&student);
        let required_subject = extract_subject(&required);
        if !student_subject.is_empty() && student_subject == required_subject {
            return Some(MatchKind::Subject);
        }
    }

    None
}

/// Try every candidate code of the student course (own code first, then a
/// transfer original) and return the first match.
pub fn course_match(student: &StudentCourse, requirement: &Course, allow_subject_match: bool) -> Option<CodeMatch> {
    student.candidate_codes().into_iter().find_map(|(code, is_equivalent)| {
        match_code(&code, requirement, allow_subject_match).map(|kind| CodeMatch {
            kind,
            via_code: if is_equivalent { None } else { Some(code) },
        })
    })
}

/// True when any candidate code of `student` matches `requirement`.
pub fn matches(student: &StudentCourse, requirement: &Course, allow_subject_match: bool) -> bool {
    course_match(student, requirement, allow_subject_match).is_some()
}

/// All catalog courses in `pool` the student course matches, in pool order.
pub fn matching_requirement_courses<'a>(
    student: &StudentCourse,
    pool: &'a [Course],
    allow_subject_match: bool,
) -> Vec<&'a Course> {
    pool.iter().filter(|c| matches(student, c, allow_subject_match)).collect()
}

/// True when the student course's subject is in a declared subject pool.
pub fn subject_in_pool(student: &StudentCourse, subjects: &[String]) -> bool {
    let own = extract_subject(&student.subject);
    if own.is_empty() {
        return false;
    }
    subjects.iter().any(|s| extract_subject(s) == own)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn req(code: &str) -> Course {
        Course::new(code, 3.0)
    }

    #[test]
    fn test_normalize_code() {
        assert_eq!(normalize_code("cs 142"), "CS142");
        assert_eq!(normalize_code("M COM-320"), "MCOM320");
    }

    #[test]
    fn test_extract_subject() {
        assert_eq!(extract_subject("REL A 275"), "RELA");
        assert_eq!(extract_subject("MATH 110"), "MATH");
        assert_eq!(extract_subject("142"), "");
    }

    #[test]
    fn test_wildcard_prefix() {
        assert_eq!(match_code("CS 142", &req("CS1XX"), false), Some(MatchKind::Prefix));
        assert_eq!(match_code("CS 199", &req("CS 1XX"), false), Some(MatchKind::Prefix));
        assert_eq!(match_code("CS 242", &req("CS1XX"), false), None);
    }

    #[test]
    fn test_subject_only_requires_flag() {
        assert_eq!(match_code("HIST 201", &req("HIST 100"), false), None);
        assert_eq!(match_code("HIST 201", &req("HIST 100"), true), Some(MatchKind::Subject));
        assert_eq!(match_code("HIST 201", &req("PHIL 100"), true), None);
    }

    #[test]
    fn test_exact_wins_regardless_of_flag() {
        assert_eq!(match_code("CS 142", &req("cs-142"), false), Some(MatchKind::Exact));
        assert_eq!(match_code("CS 142", &req("CS142"), true), Some(MatchKind::Exact));
    }
}
