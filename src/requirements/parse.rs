// Frontera de ingestión: convierte el blob `requirements` tal como está
// persistido en un árbol `ProgramRequirements` normalizado.

use std::borrow::Cow;

use serde::Serialize;
use serde_json::{Map, Value};

use crate::error::RequirementsError;
use crate::models::serde_helpers::{value_to_credits, value_to_string};
use crate::requirements::types::{
    child_path, Course, ProgramRequirement, ProgramRequirements, RequirementKind, RequirementsMetadata,
    SequenceBlock, TrackOption,
};

/// Which of the accepted layouts the blob used.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum RequirementsLayout {
    /// `{ programRequirements: [...], metadata }`
    Standard,
    /// `{ "0": {...}, "1": {...} }`
    NumericKeys,
    /// `[{ subtitle, requirement, blocks }]`
    GenEdBlocks,
}

/// Something in the blob that was skipped or repaired.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ParseWarning {
    pub path: String,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ParsedRequirements {
    pub requirements: ProgramRequirements,
    pub layout: RequirementsLayout,
    pub warnings: Vec<ParseWarning>,
}

/// Parse a program's `requirements` blob. Accepts a JSON string or an
/// already-parsed value.
pub fn parse_program_requirements(raw: &Value) -> Result<ParsedRequirements, RequirementsError> {
    let blob = resolve_blob(raw)?;
    let mut warnings = Vec::new();

    match blob.as_ref() {
        Value::Object(obj) => {
            let metadata = read_metadata(obj);
            if let Some(list) = obj.get("programRequirements") {
                let Value::Array(items) = list else {
                    return Err(RequirementsError::UnknownLayout("programRequirements is not an array".to_string()));
                };
                let reqs = parse_nodes(items, "", &mut warnings);
                return Ok(ParsedRequirements {
                    requirements: ProgramRequirements { program_requirements: reqs, metadata },
                    layout: RequirementsLayout::Standard,
                    warnings,
                });
            }

            let mut numeric: Vec<(u64, &Value)> = obj
                .iter()
                .filter_map(|(k, v)| k.parse::<u64>().ok().map(|n| (n, v)))
                .collect();
            if numeric.is_empty() {
                return Err(RequirementsError::UnknownLayout(format!(
                    "object without programRequirements (keys: {})",
                    obj.keys().take(5).cloned().collect::<Vec<_>>().join(", ")
                )));
            }
            numeric.sort_by_key(|(n, _)| *n);
            let items: Vec<Value> = numeric.into_iter().map(|(_, v)| v.clone()).collect();
            let reqs = parse_nodes(&items, "", &mut warnings);
            Ok(ParsedRequirements {
                requirements: ProgramRequirements { program_requirements: reqs, metadata },
                layout: RequirementsLayout::NumericKeys,
                warnings,
            })
        }
        Value::Array(items) if is_gen_ed_format(items) => {
            let reqs = items
                .iter()
                .enumerate()
                .filter_map(|(i, entry)| convert_gen_ed_entry(entry, i, &mut warnings))
                .collect();
            Ok(ParsedRequirements {
                requirements: ProgramRequirements {
                    program_requirements: reqs,
                    metadata: RequirementsMetadata::default(),
                },
                layout: RequirementsLayout::GenEdBlocks,
                warnings,
            })
        }
        Value::Array(_) => Err(RequirementsError::UnknownLayout("array is not in gen-ed block format".to_string())),
        other => Err(RequirementsError::UnknownLayout(format!("unexpected top-level value: {}", type_name(other)))),
    }
}

/// Number of top-level requirement entries visible in a blob, without
/// requiring it to parse. Used by the coarse progress path.
pub fn top_level_count(raw: &Value) -> usize {
    let Ok(blob) = resolve_blob(raw) else { return 0 };
    match blob.as_ref() {
        Value::Array(items) => items.len(),
        Value::Object(obj) => match obj.get("programRequirements") {
            Some(Value::Array(items)) => items.len(),
            Some(_) => 0,
            None => obj.keys().filter(|k| k.parse::<u64>().is_ok()).count(),
        },
        _ => 0,
    }
}

/// `noDoubleCount` from `metadata` or from the top level of the blob. Falls
/// back to `false` when the blob does not parse.
pub fn no_double_count_flag(raw: &Value) -> bool {
    match resolve_blob(raw) {
        Ok(blob) => match blob.as_ref() {
            Value::Object(obj) => read_metadata(obj).no_double_count,
            _ => false,
        },
        Err(_) => false,
    }
}

fn resolve_blob(raw: &Value) -> Result<Cow<'_, Value>, RequirementsError> {
    match raw {
        Value::Null => Err(RequirementsError::Empty),
        Value::String(s) => {
            if s.trim().is_empty() {
                return Err(RequirementsError::Empty);
            }
            let parsed: Value = serde_json::from_str(s)?;
            if parsed.is_null() {
                return Err(RequirementsError::Empty);
            }
            Ok(Cow::Owned(parsed))
        }
        other => Ok(Cow::Borrowed(other)),
    }
}

fn type_name(v: &Value) -> &'static str {
    match v {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

fn read_metadata(obj: &Map<String, Value>) -> RequirementsMetadata {
    let meta = obj.get("metadata").and_then(Value::as_object);
    let flag = |m: Option<&Map<String, Value>>| m.and_then(|m| m.get("noDoubleCount")).and_then(Value::as_bool).unwrap_or(false);
    RequirementsMetadata {
        no_double_count: flag(meta) || flag(Some(obj)),
    }
}

fn parse_nodes(items: &[Value], parent_path: &str, warnings: &mut Vec<ParseWarning>) -> Vec<ProgramRequirement> {
    items
        .iter()
        .enumerate()
        .filter_map(|(i, v)| parse_node(v, i, parent_path, warnings))
        .collect()
}

fn parse_node(value: &Value, position: usize, parent_path: &str, warnings: &mut Vec<ParseWarning>) -> Option<ProgramRequirement> {
    let Some(obj) = value.as_object() else {
        warnings.push(ParseWarning {
            path: child_path(parent_path, &(position + 1).to_string()),
            message: format!("requirement entry is a {}, not an object; skipped", type_name(value)),
        });
        return None;
    };

    let mut requirement_id = obj.get("requirementId").map(value_to_string).unwrap_or_default();
    if requirement_id.is_empty() {
        requirement_id = (position + 1).to_string();
        warnings.push(ParseWarning {
            path: child_path(parent_path, &requirement_id),
            message: "missing requirementId; using position".to_string(),
        });
    }
    let path = child_path(parent_path, &requirement_id);

    let description = obj
        .get("description")
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| format!("Requirement {}", path));

    let has_course_list = matches!(obj.get("courses"), Some(Value::Array(_)));
    let mut courses = parse_courses(obj.get("courses"), &path, warnings);
    if !has_course_list {
        if let Some(Value::Array(blocks)) = obj.get("blocks") {
            courses = extract_courses_from_blocks(blocks);
        }
    }

    // `subrequirements` es la grafía antigua; ambas se normalizan aquí.
    let sub_values = obj
        .get("subRequirements")
        .or_else(|| obj.get("subrequirements"))
        .and_then(Value::as_array);
    let sub_requirements = match sub_values {
        Some(items) => parse_nodes(items, &path, warnings),
        None => Vec::new(),
    };

    let constraints = obj.get("constraints").and_then(Value::as_object);
    let steps = string_list(obj.get("steps"));

    let kind = match obj.get("type").and_then(Value::as_str) {
        Some("allOf") => RequirementKind::AllOf { courses },
        Some("chooseNOf") => RequirementKind::ChooseNOf { courses, n: constraint_int(constraints, "n") },
        Some("creditBucket") => credit_bucket(obj, constraints, courses, None),
        Some("optionGroup") => RequirementKind::OptionGroup { options: parse_options(obj.get("options"), &path, warnings) },
        Some("sequence") => RequirementKind::Sequence { blocks: parse_sequence(obj.get("sequence"), &path, warnings) },
        Some("noteOnly") => RequirementKind::NoteOnly { steps },
        Some(other) => {
            warnings.push(ParseWarning {
                path: path.clone(),
                message: format!("unknown requirement type '{}'; treated as informational", other),
            });
            RequirementKind::Unknown { type_name: other.to_string() }
        }
        None => infer_kind(obj, &description, courses, has_course_list, !sub_requirements.is_empty(), constraints, steps),
    };

    Some(ProgramRequirement {
        requirement_id,
        description,
        kind,
        sub_requirements,
        notes: text_field(obj.get("notes")),
        sequencing_notes: text_field(obj.get("sequencingNotes")),
        other_requirement: text_field(obj.get("otherRequirement")),
    })
}

/// Type inference for entries authored without `type`.
fn infer_kind(
    obj: &Map<String, Value>,
    description: &str,
    courses: Vec<Course>,
    has_course_list: bool,
    has_subs: bool,
    constraints: Option<&Map<String, Value>>,
    steps: Vec<String>,
) -> RequirementKind {
    if matches!(obj.get("steps"), Some(Value::Array(_))) && !has_course_list {
        return RequirementKind::NoteOnly { steps };
    }
    if let Some(min) = credits_in_text(description) {
        return credit_bucket(obj, constraints, courses, Some(min));
    }
    if constraints.and_then(|c| c.get("minTotalCredits")).and_then(value_to_credits).is_some() {
        return credit_bucket(obj, constraints, courses, None);
    }
    if has_course_list {
        if let Some(n) = n_of_m_in_text(description) {
            return RequirementKind::ChooseNOf { courses, n: Some(n) };
        }
    }
    if has_course_list || !courses.is_empty() || has_subs {
        return RequirementKind::AllOf { courses };
    }
    RequirementKind::NoteOnly { steps }
}

fn credit_bucket(
    obj: &Map<String, Value>,
    constraints: Option<&Map<String, Value>>,
    courses: Vec<Course>,
    min_override: Option<f64>,
) -> RequirementKind {
    let min_total_credits = min_override
        .or_else(|| constraints.and_then(|c| c.get("minTotalCredits")).and_then(value_to_credits))
        .filter(|v| *v >= 0.0)
        .unwrap_or(0.0);
    let max_total_credits = constraints
        .and_then(|c| c.get("maxTotalCredits"))
        .and_then(value_to_credits)
        .filter(|v| *v >= 0.0);
    let mut subjects = string_list(constraints.and_then(|c| c.get("subjects")));
    if subjects.is_empty() {
        subjects = string_list(obj.get("subjects"));
    }
    RequirementKind::CreditBucket { courses, min_total_credits, max_total_credits, subjects }
}

fn constraint_int(constraints: Option<&Map<String, Value>>, key: &str) -> Option<i64> {
    let v = constraints?.get(key)?;
    match v {
        Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f.floor() as i64)),
        Value::String(s) => s.trim().parse::<i64>().ok(),
        _ => None,
    }
}

fn parse_courses(value: Option<&Value>, path: &str, warnings: &mut Vec<ParseWarning>) -> Vec<Course> {
    let Some(Value::Array(items)) = value else { return Vec::new() };
    let mut out = Vec::with_capacity(items.len());
    for item in items {
        match serde_json::from_value::<Course>(item.clone()) {
            Ok(c) if !c.code.is_empty() => out.push(c),
            Ok(_) => warnings.push(ParseWarning { path: path.to_string(), message: "course without code; skipped".to_string() }),
            Err(e) => warnings.push(ParseWarning { path: path.to_string(), message: format!("invalid course entry: {}", e) }),
        }
    }
    out
}

fn parse_options(value: Option<&Value>, path: &str, warnings: &mut Vec<ParseWarning>) -> Vec<TrackOption> {
    let Some(Value::Array(items)) = value else {
        warnings.push(ParseWarning { path: path.to_string(), message: "optionGroup without options".to_string() });
        return Vec::new();
    };
    items
        .iter()
        .enumerate()
        .filter_map(|(i, item)| {
            let obj = item.as_object()?;
            let mut track_id = obj.get("trackId").map(value_to_string).unwrap_or_default();
            if track_id.is_empty() {
                track_id = (i + 1).to_string();
            }
            let track_path = child_path(path, &track_id);
            let requirements = match obj.get("requirements").and_then(Value::as_array) {
                Some(reqs) => parse_nodes(reqs, &track_path, warnings),
                None => Vec::new(),
            };
            Some(TrackOption {
                track_name: obj.get("trackName").and_then(Value::as_str).unwrap_or(&track_id).to_string(),
                track_id,
                requirements,
            })
        })
        .collect()
}

fn parse_sequence(value: Option<&Value>, path: &str, warnings: &mut Vec<ParseWarning>) -> Vec<SequenceBlock> {
    let Some(Value::Array(items)) = value else {
        warnings.push(ParseWarning { path: path.to_string(), message: "sequence without blocks".to_string() });
        return Vec::new();
    };
    items
        .iter()
        .enumerate()
        .filter_map(|(i, item)| {
            let obj = item.as_object()?;
            let mut sequence_id = obj.get("sequenceId").map(value_to_string).unwrap_or_default();
            if sequence_id.is_empty() {
                sequence_id = (i + 1).to_string();
            }
            let block_path = child_path(path, &sequence_id);
            Some(SequenceBlock {
                courses: parse_courses(obj.get("courses"), &block_path, warnings),
                term: text_field(obj.get("term")),
                cohort: text_field(obj.get("cohort")),
                sequence_id,
            })
        })
        .collect()
}

fn string_list(value: Option<&Value>) -> Vec<String> {
    match value {
        Some(Value::Array(items)) => items
            .iter()
            .map(value_to_string)
            .filter(|s| !s.is_empty())
            .collect(),
        Some(Value::String(s)) if !s.trim().is_empty() => vec![s.trim().to_string()],
        _ => Vec::new(),
    }
}

fn text_field(value: Option<&Value>) -> Option<String> {
    match value {
        Some(Value::String(s)) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Some(Value::Array(_)) => {
            let lines = string_list(value);
            if lines.is_empty() { None } else { Some(lines.join("\n")) }
        }
        _ => None,
    }
}

/// "Complete 9 credit hours", "12.0 hours of electives" -> 9 / 12.0
fn credits_in_text(text: &str) -> Option<f64> {
    let tokens: Vec<String> = text
        .split_whitespace()
        .map(|t| t.trim_matches(|c: char| !c.is_alphanumeric() && c != '.').to_lowercase())
        .collect();
    tokens.windows(2).find_map(|w| {
        let n = w[0].trim_end_matches('.').parse::<f64>().ok()?;
        let unit = w[1].as_str();
        if n.is_finite() && (unit.starts_with("hour") || unit.starts_with("credit")) {
            Some(n)
        } else {
            None
        }
    })
}

/// "Complete 3 of 19 Courses" -> 3
fn n_of_m_in_text(text: &str) -> Option<i64> {
    let tokens: Vec<String> = text
        .split_whitespace()
        .map(|t| t.trim_matches(|c: char| !c.is_alphanumeric()).to_lowercase())
        .collect();
    tokens.windows(3).find_map(|w| {
        let n = w[0].parse::<i64>().ok()?;
        if w[1] == "of" && w[2].parse::<i64>().is_ok() { Some(n) } else { None }
    })
}

// --- formato de bloques de educación general ---

fn is_gen_ed_format(items: &[Value]) -> bool {
    match items.first().and_then(Value::as_object) {
        Some(first) => first.contains_key("subtitle") && first.contains_key("requirement") && first.contains_key("blocks"),
        None => false,
    }
}

fn convert_gen_ed_entry(entry: &Value, index: usize, warnings: &mut Vec<ParseWarning>) -> Option<ProgramRequirement> {
    let Some(obj) = entry.as_object() else {
        warnings.push(ParseWarning {
            path: (index + 1).to_string(),
            message: "gen-ed entry is not an object; skipped".to_string(),
        });
        return None;
    };
    let requirement = obj.get("requirement").and_then(Value::as_object);
    let requirement_id = requirement
        .and_then(|r| r.get("index"))
        .map(value_to_string)
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| (index + 1).to_string());
    let description = obj
        .get("subtitle")
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| format!("Requirement {}", index + 1));

    let courses = match obj.get("blocks") {
        Some(Value::Array(blocks)) => extract_courses_from_blocks(blocks),
        _ => Vec::new(),
    };

    let rule = requirement.and_then(|r| r.get("rule")).and_then(Value::as_object);
    let min_count = rule.and_then(|r| r.get("min_count")).and_then(value_to_credits);
    let unit = rule.and_then(|r| r.get("unit")).and_then(Value::as_str).unwrap_or("").to_lowercase();

    let kind = match min_count {
        Some(min) if unit.contains("credit") || unit.contains("hour") => RequirementKind::CreditBucket {
            courses,
            min_total_credits: min.max(0.0),
            max_total_credits: None,
            subjects: Vec::new(),
        },
        Some(min) => RequirementKind::ChooseNOf { courses, n: Some(min.floor() as i64) },
        None => RequirementKind::AllOf { courses },
    };

    Some(ProgramRequirement::new(&requirement_id, &description, kind))
}

/// Flattens `course` / `option` / `requirement` blocks into a course list.
fn extract_courses_from_blocks(blocks: &[Value]) -> Vec<Course> {
    let mut courses = Vec::new();
    for block in blocks {
        let Some(obj) = block.as_object() else { continue };
        match obj.get("type").and_then(Value::as_str) {
            Some("course") => {
                let code = obj.get("code").map(value_to_string).unwrap_or_default();
                if code.is_empty() {
                    continue;
                }
                let (credits, min_credits, max_credits) = gen_ed_credits(obj.get("credits"));
                courses.push(Course {
                    code,
                    title: obj.get("title").and_then(Value::as_str).unwrap_or("").to_string(),
                    credits,
                    min_credits,
                    max_credits,
                    prerequisite: text_field(obj.get("prerequisite")),
                    ..Default::default()
                });
            }
            Some("option") | Some("requirement") => {
                if let Some(Value::Array(nested)) = obj.get("blocks") {
                    courses.extend(extract_courses_from_blocks(nested));
                }
            }
            _ => {}
        }
        if let Some(Value::Array(old)) = obj.get("courses") {
            courses.extend(old.iter().filter_map(|c| serde_json::from_value::<Course>(c.clone()).ok()));
        }
    }
    courses
}

/// `{fixed: 2}` or `{variable: true, min: 1, max: 3}` or a bare number.
fn gen_ed_credits(value: Option<&Value>) -> (Option<f64>, Option<f64>, Option<f64>) {
    match value {
        Some(Value::Object(c)) => {
            if let Some(fixed) = c.get("fixed").and_then(value_to_credits) {
                return (Some(fixed), None, None);
            }
            if c.get("variable").and_then(Value::as_bool).unwrap_or(false) {
                let min = c.get("min").and_then(value_to_credits);
                let max = c.get("max").and_then(value_to_credits);
                return (min.or(max), min, max);
            }
            (None, None, None)
        }
        Some(v) => (value_to_credits(v), None, None),
        None => (None, None, None),
    }
}
