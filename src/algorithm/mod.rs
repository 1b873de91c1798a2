//! Módulo `algorithm`: motor de auditoría de requisitos.
//!
//! Submódulos:
//! - `matcher`: emparejamiento de códigos (exacto, comodín, sujeto)
//! - `evaluator`: evaluación recursiva del árbol de requisitos
//! - `progress`: porcentaje ponderado por programa y selección de track
//! - `double_count`: marca de cursos contados en varios programas
//! - `comparison`: comparación de programas candidatos
//! - `observer`: eventos del motor (tracing, no-op, grabación)
//! - `commands`: sesión que re-evalúa ante comandos explícitos
//!
//! `run_audit` es la entrada principal: evalúa, anota los cursos con sus
//! fulfillments y calcula el progreso. No muta la entrada.

pub mod matcher;
pub mod observer;
pub mod evaluator;
pub mod progress;
pub mod double_count;
pub mod comparison;
pub mod commands;

use std::collections::{HashMap, HashSet};

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::models::{Fulfillment, MatchType, Program, StudentCourse};
use crate::requirements::{parse_program_requirements, ParseWarning, ParsedRequirements, RequirementsLayout};

pub use commands::{AuditCommand, AuditSession};
pub use comparison::{compare_programs, CourseAnnotation, ProgramComparison};
pub use double_count::{resolve_double_counts, DoubleCountFlag, ProgramRef};
pub use evaluator::{evaluate_requirement, evaluate_requirements, AppliedCourse, EvalContext, RequirementResult};
pub use matcher::{extract_subject, match_code, matches, normalize_code, MatchKind};
pub use observer::{AuditObserver, NoopObserver, RecordingObserver, TracingObserver};
pub use progress::{compute_progress, fallback_progress, ProgramProgress, SelectedTrack};

/// Program types whose `chooseNOf`/`creditBucket` nodes accept subject-only
/// matches unless configured otherwise.
pub const DEFAULT_SUBJECT_MATCH_TYPES: &[&str] = &["gen_ed", "general education"];

/// Settings of one match run.
#[derive(Debug, Clone, PartialEq)]
pub struct MatchOptions {
    /// Stamp for new automatic fulfillments. `None` leaves them unstamped.
    pub matched_at: Option<DateTime<Utc>>,
    pub subject_match_program_types: Vec<String>,
}

impl Default for MatchOptions {
    fn default() -> Self {
        MatchOptions {
            matched_at: None,
            subject_match_program_types: DEFAULT_SUBJECT_MATCH_TYPES.iter().map(|s| s.to_string()).collect(),
        }
    }
}

impl MatchOptions {
    pub fn with_matched_at(mut self, at: DateTime<Utc>) -> Self {
        self.matched_at = Some(at);
        self
    }

    pub fn allows_subject_match(&self, program: &Program) -> bool {
        let own = normalize_program_type(&program.program_type);
        !own.is_empty()
            && self
                .subject_match_program_types
                .iter()
                .any(|t| normalize_program_type(t) == own)
    }
}

/// `"Gen-Ed"`, `"gen_ed"` and `"GenEd"` compare equal.
pub fn normalize_program_type(raw: &str) -> String {
    raw.chars()
        .filter(|c| c.is_alphanumeric())
        .flat_map(char::to_lowercase)
        .collect()
}

/// A student course with its recomputed fulfillment list.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnnotatedCourse {
    pub course: StudentCourse,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgramAudit {
    pub program_id: String,
    pub program_name: String,
    pub program_type: String,
    /// False when the coarse progress path was used.
    pub parsed: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub layout: Option<RequirementsLayout>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parse_error: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<ParseWarning>,
    pub progress: ProgramProgress,
    pub results: Vec<RequirementResult>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub selected_tracks: Vec<SelectedTrack>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditOutcome {
    pub courses: Vec<AnnotatedCourse>,
    pub programs: Vec<ProgramAudit>,
    pub double_counts: Vec<DoubleCountFlag>,
}

impl AuditOutcome {
    pub fn annotated_courses(&self) -> Vec<StudentCourse> {
        self.courses.iter().map(|a| a.course.clone()).collect()
    }

    pub fn program(&self, program_id: &str) -> Option<&ProgramAudit> {
        self.programs.iter().find(|p| p.program_id == program_id)
    }
}

struct Evaluated<'p> {
    program: &'p Program,
    parsed: Option<ParsedRequirements>,
    parse_error: Option<String>,
    results: Vec<RequirementResult>,
}

/// Match `courses` against every program, rewrite their automatic
/// fulfillments and compute progress.
///
/// Manual fulfillments are kept untouched and first; automatic ones are
/// replaced by this run's matches in tree order. Re-running on the output
/// yields the same output.
pub fn run_audit(
    courses: &[StudentCourse],
    programs: &[Program],
    options: &MatchOptions,
    observer: &dyn AuditObserver,
) -> AuditOutcome {
    let evaluated: Vec<Evaluated<'_>> = programs.iter().map(|p| evaluate_program(courses, p, options, observer)).collect();

    let mut autos: Vec<Vec<Fulfillment>> = vec![Vec::new(); courses.len()];
    for ev in &evaluated {
        for result in &ev.results {
            for a in result.attributions() {
                autos[a.applied.course_index].push(Fulfillment {
                    program_id: ev.program.id.clone(),
                    program_name: ev.program.name.clone(),
                    requirement_id: a.requirement_id.to_string(),
                    requirement_description: a.description.to_string(),
                    match_type: MatchType::Auto,
                    matched_at: options.matched_at,
                    matched_course_code: a.applied.matched_course_code.clone(),
                    requirement_type: Some(a.tag.as_str().to_string()),
                });
            }
        }
    }

    let annotated: Vec<StudentCourse> = courses
        .iter()
        .zip(autos)
        .map(|(course, new_autos)| {
            let mut out = course.clone();
            out.fulfills_requirements = merge_fulfillments(&course.fulfills_requirements, new_autos);
            out
        })
        .collect();

    let audits: Vec<ProgramAudit> = evaluated
        .into_iter()
        .map(|ev| {
            let (progress, selected_tracks) = match &ev.parsed {
                Some(parsed) => (
                    compute_progress(ev.program, &parsed.requirements, &ev.results, &annotated),
                    progress::select_tracks(&parsed.requirements, &ev.results, &annotated, &ev.program.id),
                ),
                None => (fallback_progress(ev.program, &annotated), Vec::new()),
            };
            observer.program_finished(ev.program, &progress);
            ProgramAudit {
                program_id: ev.program.id.clone(),
                program_name: ev.program.name.clone(),
                program_type: ev.program.program_type.clone(),
                parsed: ev.parsed.is_some(),
                layout: ev.parsed.as_ref().map(|p| p.layout),
                parse_error: ev.parse_error,
                warnings: ev.parsed.map(|p| p.warnings).unwrap_or_default(),
                progress,
                results: ev.results,
                selected_tracks,
            }
        })
        .collect();

    let double_counts = resolve_double_counts(&annotated, programs);

    AuditOutcome {
        courses: annotated.into_iter().map(|course| AnnotatedCourse { course }).collect(),
        programs: audits,
        double_counts,
    }
}

fn evaluate_program<'p>(
    courses: &[StudentCourse],
    program: &'p Program,
    options: &MatchOptions,
    observer: &dyn AuditObserver,
) -> Evaluated<'p> {
    observer.program_started(program);
    match parse_program_requirements(&program.requirements) {
        Ok(parsed) => {
            for w in &parsed.warnings {
                observer.parse_warning(program, w);
            }
            let ctx = EvalContext {
                program_id: &program.id,
                allow_subject_match: options.allows_subject_match(program),
                observer,
            };
            let results = evaluate_requirements(courses, &parsed.requirements, &ctx);
            Evaluated { program, parsed: Some(parsed), parse_error: None, results }
        }
        Err(e) => {
            let reason = e.to_string();
            observer.requirements_unparsed(program, &reason);
            Evaluated { program, parsed: None, parse_error: Some(reason), results: Vec::new() }
        }
    }
}

/// Manual entries first in their stored order, then this run's automatic
/// entries. An automatic entry whose key a manual entry already holds is
/// dropped; an unchanged automatic entry keeps its original timestamp.
pub fn merge_fulfillments(existing: &[Fulfillment], new_autos: Vec<Fulfillment>) -> Vec<Fulfillment> {
    let previous_stamps: HashMap<String, Option<DateTime<Utc>>> = existing
        .iter()
        .filter(|f| !f.is_manual())
        .map(|f| (f.key(), f.matched_at))
        .collect();

    let mut seen = HashSet::new();
    let mut out = Vec::with_capacity(existing.len() + new_autos.len());
    for f in existing.iter().filter(|f| f.is_manual()) {
        if seen.insert(f.key()) {
            out.push(f.clone());
        }
    }
    for mut f in new_autos {
        let key = f.key();
        if !seen.insert(key.clone()) {
            continue;
        }
        if let Some(stamp) = previous_stamps.get(&key) {
            f.matched_at = *stamp;
        }
        out.push(f);
    }
    out
}
