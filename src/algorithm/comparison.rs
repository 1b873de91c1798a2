// Comparación lado a lado de programas candidatos ("what-if"): para cada uno,
// qué cursos cuentan, qué falta y qué queda sin usar.

use std::collections::HashSet;

use serde::Serialize;

use crate::algorithm::evaluator::{evaluate_requirements, EvalContext, RequirementResult};
use crate::algorithm::matcher::normalize_code;
use crate::algorithm::observer::AuditObserver;
use crate::algorithm::progress::ProgramProgress;
use crate::algorithm::{run_audit, MatchOptions};
use crate::models::{Program, StudentCourse};
use crate::requirements::{parse_program_requirements, Course};

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CourseAnnotation {
    pub course: StudentCourse,
    /// Also matched by the gen-ed program.
    pub is_double_count: bool,
    /// Names of the programs the course counts toward.
    pub double_counts_with: Vec<String>,
    /// Paths of the candidate's nodes the course is attributed to.
    pub satisfies_requirements: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgramComparison {
    pub program_id: String,
    pub program_name: String,
    pub progress: ProgramProgress,
    /// Top-level requirements met.
    pub requirements_satisfied: usize,
    pub total_requirements: usize,
    pub courses_that_count: Vec<CourseAnnotation>,
    pub still_needed: Vec<Course>,
    pub not_used: Vec<StudentCourse>,
    pub results: Vec<RequirementResult>,
}

/// Indexes of student courses the gen-ed program matches, subject pools
/// allowed.
fn gen_ed_matches(courses: &[StudentCourse], gen_ed: &Program, observer: &dyn AuditObserver) -> HashSet<usize> {
    let Ok(parsed) = parse_program_requirements(&gen_ed.requirements) else {
        observer.requirements_unparsed(gen_ed, "gen-ed requirements unparsable; no double counts reported");
        return HashSet::new();
    };
    let ctx = EvalContext { program_id: &gen_ed.id, allow_subject_match: true, observer };
    evaluate_requirements(courses, &parsed.requirements, &ctx)
        .iter()
        .flat_map(|r| r.attributions().into_iter().map(|a| a.applied.course_index).collect::<Vec<_>>())
        .collect()
}

/// Audit every candidate on its own against the same course list.
pub fn compare_programs(
    courses: &[StudentCourse],
    candidates: &[Program],
    gen_ed: Option<&Program>,
    options: &MatchOptions,
    observer: &dyn AuditObserver,
) -> Vec<ProgramComparison> {
    let gen_ed_hits = gen_ed.map(|g| gen_ed_matches(courses, g, observer)).unwrap_or_default();

    candidates
        .iter()
        .filter_map(|candidate| {
            let outcome = run_audit(courses, std::slice::from_ref(candidate), options, observer);
            let audit = outcome.programs.into_iter().next()?;

            let mut satisfies: Vec<Vec<String>> = vec![Vec::new(); courses.len()];
            for result in &audit.results {
                for a in result.attributions() {
                    let paths = &mut satisfies[a.applied.course_index];
                    if !paths.iter().any(|p| p == a.requirement_id) {
                        paths.push(a.requirement_id.to_string());
                    }
                }
            }

            let mut courses_that_count = Vec::new();
            let mut not_used = Vec::new();
            for (i, course) in courses.iter().enumerate() {
                if satisfies[i].is_empty() {
                    not_used.push(course.clone());
                    continue;
                }
                let is_double_count = gen_ed_hits.contains(&i);
                let double_counts_with = match (is_double_count, gen_ed) {
                    (true, Some(g)) => vec![candidate.name.clone(), g.name.clone()],
                    _ => Vec::new(),
                };
                courses_that_count.push(CourseAnnotation {
                    course: course.clone(),
                    is_double_count,
                    double_counts_with,
                    satisfies_requirements: std::mem::take(&mut satisfies[i]),
                });
            }

            let mut seen = HashSet::new();
            let still_needed: Vec<Course> = audit
                .results
                .iter()
                .flat_map(|r| r.still_needed(&audit.selected_tracks))
                .filter(|c| seen.insert(normalize_code(&c.code)))
                .cloned()
                .collect();

            Some(ProgramComparison {
                program_id: audit.program_id,
                program_name: audit.program_name,
                progress: audit.progress,
                requirements_satisfied: audit.results.iter().filter(|r| r.met).count(),
                total_requirements: audit.results.len(),
                courses_that_count,
                still_needed,
                not_used,
                results: audit.results,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::algorithm::observer::NoopObserver;
    use serde_json::json;

    #[test]
    fn test_compare_splits_counting_and_unused() {
        let major = Program::new(
            "cs",
            "Computer Science",
            "major",
            json!({"programRequirements": [
                {"requirementId": 1, "description": "Intro", "type": "allOf",
                 "courses": [{"code": "CS 142"}, {"code": "CS 235"}]}
            ]}),
        );
        let gen_ed = Program::new(
            "ge",
            "General Education",
            "gen_ed",
            json!({"programRequirements": [
                {"requirementId": 1, "description": "Quantitative", "type": "chooseNOf", "constraints": {"n": 1},
                 "courses": [{"code": "CS 100"}]}
            ]}),
        );
        let courses = vec![
            StudentCourse::new("CS", "142", Some(3.0), Some("A")),
            StudentCourse::new("ART", "101", Some(3.0), Some("B")),
        ];
        let out = compare_programs(&courses, &[major], Some(&gen_ed), &MatchOptions::default(), &NoopObserver);
        assert_eq!(out.len(), 1);
        let cmp = &out[0];
        assert_eq!(cmp.courses_that_count.len(), 1);
        assert!(cmp.courses_that_count[0].is_double_count);
        assert_eq!(cmp.courses_that_count[0].satisfies_requirements, vec!["1"]);
        assert_eq!(cmp.not_used.len(), 1);
        assert_eq!(cmp.not_used[0].subject, "ART");
        assert_eq!(cmp.still_needed.len(), 1);
        assert_eq!(cmp.still_needed[0].code, "CS 235");
        assert_eq!(cmp.requirements_satisfied, 0);
    }

    #[test]
    fn test_still_needed_follows_the_selected_track() {
        let major = Program::new(
            "is",
            "Information Systems",
            "major",
            json!({"programRequirements": [
                {"requirementId": 1, "description": "Emphasis", "type": "optionGroup", "options": [
                    {"trackId": "a", "requirements": [{"requirementId": 1, "description": "A", "type": "allOf", "courses": [{"code": "IS 300"}]}]},
                    {"trackId": "b", "requirements": [{"requirementId": 1, "description": "B", "type": "allOf", "courses": [{"code": "IS 400"}]}]}
                ]},
                {"requirementId": 2, "description": "Pick two", "type": "chooseNOf", "constraints": {"n": 2},
                 "courses": [{"code": "IS 510"}, {"code": "IS 520"}, {"code": "IS 530"}]}
            ]}),
        );
        let courses = vec![
            StudentCourse::new("IS", "400", Some(3.0), Some("A")),
            StudentCourse::new("IS", "520", Some(3.0), Some("A")),
        ];
        let out = compare_programs(&courses, &[major], None, &MatchOptions::default(), &NoopObserver);
        let needed: Vec<&str> = out[0].still_needed.iter().map(|c| c.code.as_str()).collect();
        // el track b ya está cumplido; a chooseNOf le falta uno solo
        assert_eq!(needed, vec!["IS 510"]);
    }
}
