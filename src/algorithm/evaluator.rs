// Evaluación recursiva del árbol de requisitos contra la lista de cursos del
// alumno. Funciones puras: no muta cursos ni requisitos.

use serde::Serialize;

use crate::algorithm::matcher::{course_match, subject_in_pool};
use crate::algorithm::observer::AuditObserver;
use crate::algorithm::progress::SelectedTrack;
use crate::models::StudentCourse;
use crate::requirements::{child_path, Course, ProgramRequirement, ProgramRequirements, RequirementKind, RequirementTag};

/// Per-program evaluation settings.
pub struct EvalContext<'a> {
    pub program_id: &'a str,
    /// Lets `chooseNOf`/`creditBucket` nodes accept same-subject courses.
    pub allow_subject_match: bool,
    pub observer: &'a dyn AuditObserver,
}

/// A student course attributed to a node.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AppliedCourse {
    /// Position in the input course list.
    pub course_index: usize,
    pub course_code: String,
    /// Transfer original code, when that is what matched.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub matched_course_code: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackResult {
    pub track_id: String,
    pub track_name: String,
    pub path: String,
    pub met: bool,
    pub results: Vec<RequirementResult>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BlockResult {
    pub sequence_id: String,
    pub path: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub term: Option<String>,
    pub met: bool,
    pub applied_courses: Vec<AppliedCourse>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub missing_courses: Vec<Course>,
}

/// Outcome of one requirement node. `requirement_id` is the full dotted path.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RequirementResult {
    pub requirement_id: String,
    pub description: String,
    #[serde(rename = "type")]
    pub tag: RequirementTag,
    pub met: bool,
    pub applied_courses: Vec<AppliedCourse>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub matched_count: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub required_count: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub earned_credits: Option<f64>,
    /// Earned credits capped at the bucket maximum.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub applied_credits: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub required_credits: Option<f64>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub missing_courses: Vec<Course>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub sub_results: Vec<RequirementResult>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub tracks: Vec<TrackResult>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub blocks: Vec<BlockResult>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub steps: Vec<String>,
}

/// One (node, course) pair to be written back as a fulfillment.
#[derive(Debug, Clone, Copy)]
pub struct Attribution<'a> {
    pub requirement_id: &'a str,
    pub description: &'a str,
    pub tag: RequirementTag,
    pub applied: &'a AppliedCourse,
}

impl RequirementResult {
    fn empty(path: String, req: &ProgramRequirement) -> Self {
        RequirementResult {
            requirement_id: path,
            description: req.description.clone(),
            tag: req.tag(),
            met: false,
            applied_courses: Vec::new(),
            matched_count: None,
            required_count: None,
            earned_credits: None,
            applied_credits: None,
            required_credits: None,
            missing_courses: Vec::new(),
            sub_results: Vec::new(),
            tracks: Vec::new(),
            blocks: Vec::new(),
            steps: Vec::new(),
        }
    }

    /// Every attribution in this subtree, in tree order. Sequence courses are
    /// attributed to their block path; every option track is walked.
    pub fn attributions(&self) -> Vec<Attribution<'_>> {
        let mut out = Vec::new();
        self.collect_attributions(&mut out);
        out
    }

    fn collect_attributions<'a>(&'a self, out: &mut Vec<Attribution<'a>>) {
        if self.tag == RequirementTag::Sequence {
            for block in &self.blocks {
                for applied in &block.applied_courses {
                    out.push(Attribution {
                        requirement_id: &block.path,
                        description: &self.description,
                        tag: self.tag,
                        applied,
                    });
                }
            }
        } else {
            for applied in &self.applied_courses {
                out.push(Attribution {
                    requirement_id: &self.requirement_id,
                    description: &self.description,
                    tag: self.tag,
                    applied,
                });
            }
        }
        for track in &self.tracks {
            for r in &track.results {
                r.collect_attributions(out);
            }
        }
        for sub in &self.sub_results {
            sub.collect_attributions(out);
        }
    }

    /// Courses still needed to meet this subtree. Met nodes need nothing;
    /// an option group only looks at its selected track (the first one when
    /// none was selected); an unmet `chooseNOf` lists only as many unmatched
    /// courses as it is short.
    pub fn still_needed(&self, selected: &[SelectedTrack]) -> Vec<&Course> {
        if self.met {
            return Vec::new();
        }
        let mut out: Vec<&Course> = match (self.tag, self.required_count, self.matched_count) {
            (RequirementTag::ChooseNOf, Some(required), Some(matched)) => {
                self.missing_courses.iter().take(required.saturating_sub(matched)).collect()
            }
            _ => self.missing_courses.iter().collect(),
        };
        if !self.tracks.is_empty() {
            let chosen = selected
                .iter()
                .find(|s| s.requirement_id == self.requirement_id)
                .and_then(|s| self.tracks.iter().find(|t| t.track_id == s.track_id))
                .or_else(|| self.tracks.first());
            if let Some(track) = chosen {
                for r in &track.results {
                    out.extend(r.still_needed(selected));
                }
            }
        }
        for sub in &self.sub_results {
            out.extend(sub.still_needed(selected));
        }
        out
    }

    /// Look up a node of this subtree by its full path.
    pub fn find(&self, path: &str) -> Option<&RequirementResult> {
        if self.requirement_id == path {
            return Some(self);
        }
        self.tracks
            .iter()
            .flat_map(|t| t.results.iter())
            .chain(self.sub_results.iter())
            .find_map(|r| r.find(path))
    }
}

struct SlotOutcome {
    applied: Vec<AppliedCourse>,
    satisfied: usize,
    missing: Vec<Course>,
}

fn push_distinct(into: &mut Vec<AppliedCourse>, applied: AppliedCourse) {
    if !into.iter().any(|a| a.course_index == applied.course_index) {
        into.push(applied);
    }
}

/// Match every listed course. A slot is satisfied when at least one student
/// course matches it; all matching student courses are attributed.
fn evaluate_slots(courses: &[StudentCourse], listed: &[Course], allow_subject_match: bool) -> SlotOutcome {
    let mut out = SlotOutcome { applied: Vec::new(), satisfied: 0, missing: Vec::new() };
    for required in listed {
        let mut hit = false;
        for (index, student) in courses.iter().enumerate() {
            if let Some(m) = course_match(student, required, allow_subject_match) {
                hit = true;
                push_distinct(
                    &mut out.applied,
                    AppliedCourse { course_index: index, course_code: student.code(), matched_course_code: m.via_code },
                );
            }
        }
        if hit {
            out.satisfied += 1;
        } else {
            out.missing.push(required.clone());
        }
    }
    out.applied.sort_by_key(|a| a.course_index);
    out
}

fn subject_pool(courses: &[StudentCourse], subjects: &[String]) -> Vec<AppliedCourse> {
    courses
        .iter()
        .enumerate()
        .filter(|(_, c)| subject_in_pool(c, subjects))
        .map(|(index, c)| AppliedCourse { course_index: index, course_code: c.code(), matched_course_code: None })
        .collect()
}

/// Evaluate the top level of a parsed tree. Results are parallel to
/// `requirements.program_requirements`.
pub fn evaluate_requirements(
    courses: &[StudentCourse],
    requirements: &ProgramRequirements,
    ctx: &EvalContext<'_>,
) -> Vec<RequirementResult> {
    requirements
        .program_requirements
        .iter()
        .map(|r| evaluate_requirement(courses, r, "", ctx))
        .collect()
}

/// Evaluate one node and its descendants. Sub-requirements are conjunctive.
pub fn evaluate_requirement(
    courses: &[StudentCourse],
    req: &ProgramRequirement,
    parent_path: &str,
    ctx: &EvalContext<'_>,
) -> RequirementResult {
    let path = child_path(parent_path, &req.requirement_id);
    let mut result = RequirementResult::empty(path.clone(), req);

    let met_self = match &req.kind {
        RequirementKind::AllOf { courses: listed } => {
            let slots = evaluate_slots(courses, listed, false);
            result.matched_count = Some(slots.satisfied);
            result.required_count = Some(listed.len());
            result.applied_courses = slots.applied;
            result.missing_courses = slots.missing;
            slots.satisfied == listed.len()
        }
        RequirementKind::ChooseNOf { courses: listed, .. } => {
            let required = req.kind.effective_n().unwrap_or(listed.len());
            // sin n válido se comporta como allOf
            let degraded = req.kind.is_degraded_choose();
            let slots = evaluate_slots(courses, listed, ctx.allow_subject_match && !degraded);
            let count = if degraded { slots.satisfied } else { slots.applied.len() };
            let met = count >= required;
            result.matched_count = Some(count);
            result.required_count = Some(required);
            result.applied_courses = slots.applied;
            if !met {
                result.missing_courses = slots.missing;
            }
            met
        }
        RequirementKind::CreditBucket { courses: listed, min_total_credits, max_total_credits, subjects } => {
            let (applied, missing) = if !listed.is_empty() {
                let slots = evaluate_slots(courses, listed, ctx.allow_subject_match);
                (slots.applied, slots.missing)
            } else {
                (subject_pool(courses, subjects), Vec::new())
            };
            let earned: f64 = applied.iter().map(|a| courses[a.course_index].credit_value()).sum();
            let usable = max_total_credits.map_or(earned, |max| earned.min(max));
            let met = earned >= *min_total_credits;
            result.earned_credits = Some(earned);
            result.applied_credits = Some(usable);
            result.required_credits = Some(*min_total_credits);
            result.applied_courses = applied;
            if !met {
                result.missing_courses = missing;
            }
            met
        }
        RequirementKind::OptionGroup { options } => {
            result.tracks = options
                .iter()
                .map(|opt| {
                    let track_path = child_path(&path, &opt.track_id);
                    let results: Vec<RequirementResult> = opt
                        .requirements
                        .iter()
                        .map(|r| evaluate_requirement(courses, r, &track_path, ctx))
                        .collect();
                    let met = !results.is_empty() && results.iter().all(|r| r.met);
                    TrackResult {
                        track_id: opt.track_id.clone(),
                        track_name: opt.track_name.clone(),
                        path: track_path,
                        met,
                        results,
                    }
                })
                .collect();
            result.tracks.iter().any(|t| t.met)
        }
        RequirementKind::Sequence { blocks } => {
            let mut satisfied = 0;
            let mut listed = 0;
            for block in blocks {
                let slots = evaluate_slots(courses, &block.courses, false);
                satisfied += slots.satisfied;
                listed += block.courses.len();
                for applied in &slots.applied {
                    push_distinct(&mut result.applied_courses, applied.clone());
                }
                result.missing_courses.extend(slots.missing.iter().cloned());
                result.blocks.push(BlockResult {
                    sequence_id: block.sequence_id.clone(),
                    path: child_path(&path, &block.sequence_id),
                    term: block.term.clone(),
                    met: slots.satisfied == block.courses.len(),
                    applied_courses: slots.applied,
                    missing_courses: slots.missing,
                });
            }
            result.matched_count = Some(satisfied);
            result.required_count = Some(listed);
            result.blocks.iter().all(|b| b.met)
        }
        RequirementKind::NoteOnly { steps } => {
            result.steps = steps.clone();
            true
        }
        RequirementKind::Unknown { .. } => true,
    };

    result.sub_results = req
        .sub_requirements
        .iter()
        .map(|sub| evaluate_requirement(courses, sub, &path, ctx))
        .collect();
    result.met = met_self && result.sub_results.iter().all(|r| r.met);

    if result.tag == RequirementTag::Sequence {
        for block in &result.blocks {
            for applied in &block.applied_courses {
                ctx.observer.course_matched(ctx.program_id, &block.path, &courses[applied.course_index]);
            }
        }
    } else {
        for applied in &result.applied_courses {
            ctx.observer.course_matched(ctx.program_id, &result.requirement_id, &courses[applied.course_index]);
        }
    }
    ctx.observer.requirement_evaluated(ctx.program_id, &result);

    result
}
