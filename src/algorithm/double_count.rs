// Detección de cursos contados en más de un programa. Sólo marca: nunca
// borra fulfillments, la resolución es manual.

use serde::Serialize;

use crate::models::{Program, StudentCourse};
use crate::requirements::no_double_count_flag;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgramRef {
    pub program_id: String,
    pub program_name: String,
}

/// A course applied to requirements of two or more programs while at least
/// one active program forbids double counting.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DoubleCountFlag {
    pub course_index: usize,
    pub course_id: String,
    pub course_code: String,
    /// Programs the course currently counts toward, first-seen order.
    pub programs: Vec<ProgramRef>,
    /// `programId:requirementId` of every fulfillment involved.
    pub requirement_keys: Vec<String>,
    /// Active programs whose requirements set `noDoubleCount`.
    pub forbidden_by: Vec<ProgramRef>,
}

/// Courses whose fulfillments span at least two distinct programs.
pub fn courses_in_multiple_programs(courses: &[StudentCourse]) -> Vec<(usize, Vec<ProgramRef>)> {
    courses
        .iter()
        .enumerate()
        .filter_map(|(i, c)| {
            let mut programs: Vec<ProgramRef> = Vec::new();
            for f in &c.fulfills_requirements {
                if !programs.iter().any(|p| p.program_id == f.program_id) {
                    programs.push(ProgramRef { program_id: f.program_id.clone(), program_name: f.program_name.clone() });
                }
            }
            (programs.len() >= 2).then_some((i, programs))
        })
        .collect()
}

/// Flag doubly-counted courses when any active program sets `noDoubleCount`.
/// Returns nothing when no program forbids it.
pub fn resolve_double_counts(courses: &[StudentCourse], programs: &[Program]) -> Vec<DoubleCountFlag> {
    let forbidden_by: Vec<ProgramRef> = programs
        .iter()
        .filter(|p| no_double_count_flag(&p.requirements))
        .map(|p| ProgramRef { program_id: p.id.clone(), program_name: p.name.clone() })
        .collect();
    if forbidden_by.is_empty() {
        return Vec::new();
    }

    courses_in_multiple_programs(courses)
        .into_iter()
        .map(|(i, programs)| {
            let course = &courses[i];
            DoubleCountFlag {
                course_index: i,
                course_id: course.display_id(),
                course_code: course.code(),
                programs,
                requirement_keys: course.fulfills_requirements.iter().map(|f| f.key()).collect(),
                forbidden_by: forbidden_by.clone(),
            }
        })
        .collect()
}
