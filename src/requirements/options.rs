use std::collections::HashSet;

use serde::Serialize;

use crate::models::Program;
use crate::requirements::parse::parse_program_requirements;
use crate::requirements::types::{child_path, ProgramRequirement, ProgramRequirements, RequirementKind};

/// A requirement a course can be assigned to by hand, as listed in the
/// override dialog.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RequirementOption {
    pub program_id: String,
    pub program_name: String,
    pub requirement_id: String,
    pub requirement_description: String,
    pub requirement_type: String,
}

/// Every requirement node of every program whose requirements parse.
/// Programs with malformed requirements contribute nothing.
pub fn extract_requirement_options(programs: &[Program]) -> Vec<RequirementOption> {
    let mut out = Vec::new();
    let mut seen = HashSet::new();
    for program in programs {
        if let Ok(parsed) = parse_program_requirements(&program.requirements) {
            collect_program(program, &parsed.requirements, &mut out, &mut seen);
        }
    }
    out
}

fn collect_program(
    program: &Program,
    requirements: &ProgramRequirements,
    out: &mut Vec<RequirementOption>,
    seen: &mut HashSet<String>,
) {
    for req in &requirements.program_requirements {
        collect(program, req, "", out, seen);
    }
}

fn collect(
    program: &Program,
    req: &ProgramRequirement,
    parent_path: &str,
    out: &mut Vec<RequirementOption>,
    seen: &mut HashSet<String>,
) {
    let path = child_path(parent_path, &req.requirement_id);
    if seen.insert(format!("{}:{}", program.id, path)) {
        out.push(RequirementOption {
            program_id: program.id.clone(),
            program_name: program.name.clone(),
            requirement_id: path.clone(),
            requirement_description: req.description.clone(),
            requirement_type: req.tag().as_str().to_string(),
        });
    }

    if let RequirementKind::OptionGroup { options } = &req.kind {
        for opt in options {
            let track_path = child_path(&path, &opt.track_id);
            for sub in &opt.requirements {
                collect(program, sub, &track_path, out, seen);
            }
        }
    }

    for sub in &req.sub_requirements {
        collect(program, sub, &path, out, seen);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_options_cover_nested_and_track_nodes() {
        let program = Program::new(
            "42",
            "Information Systems",
            "major",
            json!({
                "programRequirements": [
                    {"requirementId": 1, "description": "Core", "type": "allOf",
                     "courses": [{"code": "IS 201"}],
                     "subRequirements": [{"requirementId": 1, "description": "Lab", "type": "allOf", "courses": []}]},
                    {"requirementId": 2, "description": "Emphasis", "type": "optionGroup",
                     "options": [{"trackId": "a", "trackName": "Analytics",
                                  "requirements": [{"requirementId": 1, "description": "Stats", "type": "allOf", "courses": []}]}]}
                ]
            }),
        );
        let options = extract_requirement_options(&[program]);
        let ids: Vec<&str> = options.iter().map(|o| o.requirement_id.as_str()).collect();
        assert_eq!(ids, vec!["1", "1.1", "2", "2.a.1"]);
        assert_eq!(options[3].requirement_type, "allOf");
    }

    #[test]
    fn test_malformed_program_contributes_nothing() {
        let program = Program::new("9", "Broken", "major", json!("{not json"));
        assert!(extract_requirement_options(&[program]).is_empty());
    }
}
