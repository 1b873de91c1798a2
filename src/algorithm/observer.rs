// Observadores del motor de auditoría. El motor nunca escribe logs por su
// cuenta: emite eventos a un `AuditObserver` inyectado.

use std::sync::Mutex;

use tracing::{debug, info, warn};

use crate::algorithm::evaluator::RequirementResult;
use crate::algorithm::progress::ProgramProgress;
use crate::models::{Program, StudentCourse};
use crate::requirements::ParseWarning;

/// Hooks called while a program is audited. Every method defaults to a no-op.
pub trait AuditObserver: Send + Sync {
    fn program_started(&self, _program: &Program) {}

    /// The requirements blob did not parse; coarse progress follows.
    fn requirements_unparsed(&self, _program: &Program, _reason: &str) {}

    fn parse_warning(&self, _program: &Program, _warning: &ParseWarning) {}

    fn course_matched(&self, _program_id: &str, _requirement_path: &str, _course: &StudentCourse) {}

    fn requirement_evaluated(&self, _program_id: &str, _result: &RequirementResult) {}

    fn program_finished(&self, _program: &Program, _progress: &ProgramProgress) {}
}

/// Discards every event.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopObserver;

impl AuditObserver for NoopObserver {}

/// Forwards events to `tracing`.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingObserver;

impl AuditObserver for TracingObserver {
    fn program_started(&self, program: &Program) {
        debug!(program_id = %program.id, program_type = %program.program_type, "auditing program");
    }

    fn requirements_unparsed(&self, program: &Program, reason: &str) {
        warn!(program_id = %program.id, %reason, "requirements unparsable, using coarse progress");
    }

    fn parse_warning(&self, program: &Program, warning: &ParseWarning) {
        warn!(program_id = %program.id, path = %warning.path, "{}", warning.message);
    }

    fn course_matched(&self, program_id: &str, requirement_path: &str, course: &StudentCourse) {
        debug!(%program_id, requirement = %requirement_path, course = %course.code(), "course matched");
    }

    fn requirement_evaluated(&self, program_id: &str, result: &RequirementResult) {
        debug!(
            %program_id,
            requirement = %result.requirement_id,
            kind = result.tag.as_str(),
            met = result.met,
            "requirement evaluated"
        );
    }

    fn program_finished(&self, program: &Program, progress: &ProgramProgress) {
        info!(
            program_id = %program.id,
            fulfilled = progress.fulfilled,
            total = progress.total,
            percentage = progress.percentage,
            "program audited"
        );
    }
}

/// Keeps a textual trace of events, for tests.
#[derive(Debug, Default)]
pub struct RecordingObserver {
    events: Mutex<Vec<String>>,
}

impl RecordingObserver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<String> {
        match self.events.lock() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    fn push(&self, event: String) {
        match self.events.lock() {
            Ok(mut guard) => guard.push(event),
            Err(poisoned) => poisoned.into_inner().push(event),
        }
    }
}

impl AuditObserver for RecordingObserver {
    fn program_started(&self, program: &Program) {
        self.push(format!("start {}", program.id));
    }

    fn requirements_unparsed(&self, program: &Program, reason: &str) {
        self.push(format!("unparsed {}: {}", program.id, reason));
    }

    fn parse_warning(&self, program: &Program, warning: &ParseWarning) {
        self.push(format!("warning {} {}: {}", program.id, warning.path, warning.message));
    }

    fn course_matched(&self, program_id: &str, requirement_path: &str, course: &StudentCourse) {
        self.push(format!("match {}:{} {}", program_id, requirement_path, course.code()));
    }

    fn requirement_evaluated(&self, program_id: &str, result: &RequirementResult) {
        self.push(format!("eval {}:{} met={}", program_id, result.requirement_id, result.met));
    }

    fn program_finished(&self, program: &Program, progress: &ProgramProgress) {
        self.push(format!("finish {} {:.1}", program.id, progress.percentage));
    }
}
