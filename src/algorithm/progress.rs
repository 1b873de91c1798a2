// Agregación de progreso por programa: promedio ponderado de los requisitos
// de primer nivel, o conteo grueso cuando los requisitos no se pueden leer.

use std::collections::HashSet;

use serde::Serialize;

use crate::algorithm::evaluator::RequirementResult;
use crate::models::{Program, StudentCourse};
use crate::requirements::{top_level_count, ProgramRequirement, ProgramRequirements, RequirementKind};

/// Progress shown on a program card. `fulfilled`/`total` are display counts
/// back-derived from `percentage`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgramProgress {
    pub fulfilled: usize,
    pub total: usize,
    /// 0..=100
    pub percentage: f64,
}

impl ProgramProgress {
    pub fn empty() -> Self {
        ProgramProgress { fulfilled: 0, total: 0, percentage: 0.0 }
    }
}

/// The track an `optionGroup` is reported under.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SelectedTrack {
    pub requirement_id: String,
    pub track_id: String,
    pub track_name: String,
    pub met: bool,
}

/// Weight of a node in the weighted average.
pub fn requirement_weight(req: &ProgramRequirement) -> f64 {
    match &req.kind {
        RequirementKind::ChooseNOf { .. } => req.kind.effective_n().unwrap_or(0) as f64,
        RequirementKind::CreditBucket { min_total_credits, .. } => min_total_credits.max(0.0),
        RequirementKind::NoteOnly { .. } => 0.0,
        RequirementKind::AllOf { .. }
        | RequirementKind::OptionGroup { .. }
        | RequirementKind::Sequence { .. }
        | RequirementKind::Unknown { .. } => 1.0,
    }
}

/// Courses with any fulfillment (auto or manual) at `path` or below it.
fn fulfilling_courses<'a>(courses: &'a [StudentCourse], program_id: &str, path: &str) -> Vec<&'a StudentCourse> {
    courses
        .iter()
        .filter(|c| c.fulfills_requirements.iter().any(|f| f.falls_under(program_id, path)))
        .collect()
}

fn manually_assigned(courses: &[StudentCourse], program_id: &str, path: &str) -> bool {
    courses
        .iter()
        .flat_map(|c| c.fulfills_requirements.iter())
        .any(|f| f.is_manual() && f.program_id == program_id && f.requirement_id == path)
}

/// Fraction in `[0, 1]` of one node.
pub fn requirement_fraction(
    req: &ProgramRequirement,
    result: &RequirementResult,
    courses: &[StudentCourse],
    program_id: &str,
) -> f64 {
    let path = result.requirement_id.as_str();
    let fulfilling = fulfilling_courses(courses, program_id, path);
    let fraction = match &req.kind {
        RequirementKind::ChooseNOf { .. } if !req.kind.is_degraded_choose() => {
            let n = req.kind.effective_n().unwrap_or(0);
            if n == 0 { 0.0 } else { fulfilling.len() as f64 / n as f64 }
        }
        RequirementKind::CreditBucket { min_total_credits, max_total_credits, .. } => {
            if *min_total_credits <= 0.0 {
                0.0
            } else {
                let earned: f64 = fulfilling.iter().map(|c| c.credit_value()).sum();
                let usable = max_total_credits.map_or(earned, |max| earned.min(max));
                usable / min_total_credits
            }
        }
        RequirementKind::NoteOnly { .. } => 0.0,
        // binarios (y chooseNOf sin n): cumplido con al menos un curso, o asignado a mano
        _ => {
            if (result.met && !fulfilling.is_empty()) || manually_assigned(courses, program_id, path) {
                1.0
            } else {
                0.0
            }
        }
    };
    if fraction.is_finite() { fraction.clamp(0.0, 1.0) } else { 0.0 }
}

/// (Σ fraction·weight, Σ weight) over parallel requirement/result slices.
fn weighted(
    reqs: &[ProgramRequirement],
    results: &[RequirementResult],
    courses: &[StudentCourse],
    program_id: &str,
) -> (f64, f64) {
    reqs.iter().zip(results.iter()).fold((0.0, 0.0), |(earned, total), (req, result)| {
        let weight = requirement_weight(req);
        if weight <= 0.0 {
            return (earned, total);
        }
        (earned + requirement_fraction(req, result, courses, program_id) * weight, total + weight)
    })
}

/// Weighted progress of a program with a parsed tree. `courses` must carry
/// the fulfillments written by the current match run.
pub fn compute_progress(
    program: &Program,
    requirements: &ProgramRequirements,
    results: &[RequirementResult],
    courses: &[StudentCourse],
) -> ProgramProgress {
    let (earned, weight) = weighted(&requirements.program_requirements, results, courses, &program.id);
    let percentage = if weight > 0.0 { (earned / weight * 100.0).clamp(0.0, 100.0) } else { 0.0 };
    let total = requirements.node_count();
    ProgramProgress {
        fulfilled: (percentage / 100.0 * total as f64).round() as usize,
        total,
        percentage,
    }
}

/// Coarse progress for a program whose requirements could not be parsed:
/// distinct requirement ids with a fulfillment over the top-level count.
pub fn fallback_progress(program: &Program, courses: &[StudentCourse]) -> ProgramProgress {
    let fulfilled: HashSet<&str> = courses
        .iter()
        .flat_map(|c| c.fulfills_requirements.iter())
        .filter(|f| f.program_id == program.id)
        .map(|f| f.requirement_id.as_str())
        .collect();
    let total = top_level_count(&program.requirements);
    let percentage = if total > 0 {
        (fulfilled.len() as f64 / total as f64).min(1.0) * 100.0
    } else {
        0.0
    };
    ProgramProgress { fulfilled: fulfilled.len(), total, percentage }
}

/// Pick the reported track of every `optionGroup` in the tree: met tracks
/// first, then highest weighted progress; ties go to the first listed.
pub fn select_tracks(
    requirements: &ProgramRequirements,
    results: &[RequirementResult],
    courses: &[StudentCourse],
    program_id: &str,
) -> Vec<SelectedTrack> {
    let mut out = Vec::new();
    for (req, result) in requirements.program_requirements.iter().zip(results.iter()) {
        collect_tracks(req, result, courses, program_id, &mut out);
    }
    out
}

fn collect_tracks(
    req: &ProgramRequirement,
    result: &RequirementResult,
    courses: &[StudentCourse],
    program_id: &str,
    out: &mut Vec<SelectedTrack>,
) {
    if let RequirementKind::OptionGroup { options } = &req.kind {
        let mut best: Option<(usize, bool, f64)> = None;
        for (i, (opt, track)) in options.iter().zip(result.tracks.iter()).enumerate() {
            let (earned, weight) = weighted(&opt.requirements, &track.results, courses, program_id);
            let score = if weight > 0.0 { earned / weight } else if track.met { 1.0 } else { 0.0 };
            let better = match best {
                None => true,
                Some((_, best_met, best_score)) => (track.met && !best_met) || (track.met == best_met && score > best_score),
            };
            if better {
                best = Some((i, track.met, score));
            }
        }
        if let Some((i, met, _)) = best {
            let track = &result.tracks[i];
            out.push(SelectedTrack {
                requirement_id: result.requirement_id.clone(),
                track_id: track.track_id.clone(),
                track_name: track.track_name.clone(),
                met,
            });
        }
        for (opt, track) in options.iter().zip(result.tracks.iter()) {
            for (r, rr) in opt.requirements.iter().zip(track.results.iter()) {
                collect_tracks(r, rr, courses, program_id, out);
            }
        }
    }
    for (sub, sub_result) in req.sub_requirements.iter().zip(result.sub_results.iter()) {
        collect_tracks(sub, sub_result, courses, program_id, out);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Fulfillment, MatchType};
    use serde_json::json;

    fn fulfilled(subject: &str, number: &str, program_id: &str, requirement_id: &str) -> StudentCourse {
        let mut c = StudentCourse::new(subject, number, Some(3.0), Some("A"));
        c.fulfills_requirements.push(Fulfillment {
            program_id: program_id.into(),
            program_name: String::new(),
            requirement_id: requirement_id.into(),
            requirement_description: String::new(),
            match_type: MatchType::Auto,
            matched_at: None,
            matched_course_code: None,
            requirement_type: None,
        });
        c
    }

    #[test]
    fn test_fallback_counts_distinct_requirement_ids() {
        let program = Program::new("p", "Broken", "major", json!({"0": {}, "1": {}, "2": {}, "3": {}}));
        let courses = vec![fulfilled("A", "1", "p", "1"), fulfilled("A", "2", "p", "1"), fulfilled("A", "3", "p", "2")];
        let progress = fallback_progress(&program, &courses);
        assert_eq!(progress.fulfilled, 2);
        assert_eq!(progress.total, 4);
        assert!((progress.percentage - 50.0).abs() < 1e-9);
    }

    #[test]
    fn test_fallback_with_no_top_level_is_zero() {
        let program = Program::new("p", "Broken", "major", json!("garbage"));
        let progress = fallback_progress(&program, &[fulfilled("A", "1", "p", "1")]);
        assert_eq!(progress.percentage, 0.0);
    }

    #[test]
    fn test_note_only_weighs_nothing() {
        let req = ProgramRequirement::new("1", "Advising", RequirementKind::NoteOnly { steps: vec!["Meet advisor".into()] });
        assert_eq!(requirement_weight(&req), 0.0);
    }
}
