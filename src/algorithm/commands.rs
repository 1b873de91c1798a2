// Sesión de auditoría: guarda cursos y programas activos y re-evalúa ante
// comandos explícitos. El motor (`run_audit`) sigue sin estado.

use crate::algorithm::observer::AuditObserver;
use crate::algorithm::{run_audit, AuditOutcome, MatchOptions};
use crate::error::AuditError;
use crate::models::{Fulfillment, MatchType, Program, StudentCourse};
use crate::requirements::RequirementOption;

#[derive(Debug, Clone)]
pub enum AuditCommand {
    /// The course list was replaced (upload, edit, delete).
    CoursesChanged(Vec<StudentCourse>),
    /// The set of active programs changed.
    ProgramSelectionChanged(Vec<Program>),
    /// Pin a course to a requirement by hand.
    AssignManual { course_index: usize, option: RequirementOption },
    /// Remove one fulfillment (manual or automatic) from a course.
    RemoveFulfillment { course_index: usize, program_id: String, requirement_id: String },
    /// Re-run matching with the current state.
    Rematch,
}

/// Host-side snapshot of one student's audit inputs.
#[derive(Debug, Clone)]
pub struct AuditSession {
    courses: Vec<StudentCourse>,
    programs: Vec<Program>,
    options: MatchOptions,
}

impl AuditSession {
    pub fn new(courses: Vec<StudentCourse>, programs: Vec<Program>, options: MatchOptions) -> Self {
        AuditSession { courses, programs, options }
    }

    pub fn courses(&self) -> &[StudentCourse] {
        &self.courses
    }

    pub fn programs(&self) -> &[Program] {
        &self.programs
    }

    /// Apply `command`, re-run the audit and keep its annotated courses as
    /// the new state.
    pub fn apply(&mut self, command: AuditCommand, observer: &dyn AuditObserver) -> Result<AuditOutcome, AuditError> {
        match command {
            AuditCommand::CoursesChanged(courses) => self.courses = courses,
            AuditCommand::ProgramSelectionChanged(programs) => self.programs = programs,
            AuditCommand::AssignManual { course_index, option } => {
                let stamp = self.options.matched_at;
                let course = self.course_mut(course_index)?;
                let manual = Fulfillment {
                    program_id: option.program_id,
                    program_name: option.program_name,
                    requirement_id: option.requirement_id,
                    requirement_description: option.requirement_description,
                    match_type: MatchType::Manual,
                    matched_at: stamp,
                    matched_course_code: None,
                    requirement_type: Some(option.requirement_type),
                };
                let key = manual.key();
                course.fulfills_requirements.retain(|f| f.key() != key);
                course.fulfills_requirements.push(manual);
            }
            AuditCommand::RemoveFulfillment { course_index, program_id, requirement_id } => {
                let course = self.course_mut(course_index)?;
                course
                    .fulfills_requirements
                    .retain(|f| !(f.program_id == program_id && f.requirement_id == requirement_id));
            }
            AuditCommand::Rematch => {}
        }

        let outcome = run_audit(&self.courses, &self.programs, &self.options, observer);
        self.courses = outcome.annotated_courses();
        Ok(outcome)
    }

    fn course_mut(&mut self, index: usize) -> Result<&mut StudentCourse, AuditError> {
        let len = self.courses.len();
        self.courses
            .get_mut(index)
            .ok_or_else(|| AuditError::InvalidInput(format!("course index {} out of range ({} courses)", index, len)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::algorithm::observer::NoopObserver;
    use serde_json::json;

    fn program() -> Program {
        Program::new(
            "cs",
            "Computer Science",
            "major",
            json!({"programRequirements": [
                {"requirementId": 1, "description": "Intro", "type": "allOf", "courses": [{"code": "CS 142"}]},
                {"requirementId": 2, "description": "Elective", "type": "allOf", "courses": [{"code": "CS 400"}]}
            ]}),
        )
    }

    #[test]
    fn test_manual_assignment_survives_rematch() {
        let mut session = AuditSession::new(
            vec![StudentCourse::new("CS", "450", Some(3.0), Some("A"))],
            vec![program()],
            MatchOptions::default(),
        );
        let option = RequirementOption {
            program_id: "cs".into(),
            program_name: "Computer Science".into(),
            requirement_id: "2".into(),
            requirement_description: "Elective".into(),
            requirement_type: "allOf".into(),
        };
        let outcome = session
            .apply(AuditCommand::AssignManual { course_index: 0, option }, &NoopObserver)
            .unwrap();
        assert!((outcome.programs[0].progress.percentage - 50.0).abs() < 1e-9);

        let again = session.apply(AuditCommand::Rematch, &NoopObserver).unwrap();
        let fulfillments = &again.courses[0].course.fulfills_requirements;
        assert_eq!(fulfillments.len(), 1);
        assert!(fulfillments[0].is_manual());
    }

    #[test]
    fn test_out_of_range_index_is_rejected() {
        let mut session = AuditSession::new(Vec::new(), vec![program()], MatchOptions::default());
        let err = session
            .apply(
                AuditCommand::RemoveFulfillment { course_index: 3, program_id: "cs".into(), requirement_id: "1".into() },
                &NoopObserver,
            )
            .unwrap_err();
        assert!(matches!(err, AuditError::InvalidInput(_)));
    }
}
