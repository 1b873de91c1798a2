// Estructuras de datos principales: cursos del alumno, fulfillments y programas.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Origin of a match between a student course and a requirement.
///
/// `Manual` entries come from a human override and are never touched by
/// automatic re-matching.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum MatchType {
    #[default]
    Auto,
    Manual,
}

impl MatchType {
    pub fn as_str(&self) -> &'static str {
        match self {
            MatchType::Auto => "auto",
            MatchType::Manual => "manual",
        }
    }
}

impl Serialize for MatchType {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

// Cualquier valor distinto de "manual" se trata como "auto".
impl<'de> Deserialize<'de> for MatchType {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = Option::<String>::deserialize(deserializer)?;
        Ok(match raw.as_deref() {
            Some("manual") => MatchType::Manual,
            _ => MatchType::Auto,
        })
    }
}

/// Where a student course record came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CourseOrigin {
    #[default]
    Parsed,
    Manual,
    Transfer,
}

impl Serialize for CourseOrigin {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(match self {
            CourseOrigin::Parsed => "parsed",
            CourseOrigin::Manual => "manual",
            CourseOrigin::Transfer => "transfer",
        })
    }
}

impl<'de> Deserialize<'de> for CourseOrigin {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = Option::<String>::deserialize(deserializer)?;
        Ok(match raw.as_deref() {
            Some("manual") => CourseOrigin::Manual,
            Some("transfer") => CourseOrigin::Transfer,
            _ => CourseOrigin::Parsed,
        })
    }
}

/// Original course data for transfer credit. `subject`/`number` on the
/// owning [`StudentCourse`] hold the local equivalent.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TransferCredit {
    pub institution: String,
    pub original_subject: String,
    pub original_number: String,
    pub original_title: String,
    pub original_credits: f64,
    pub original_grade: String,
}

/// Link between one student course and one requirement it satisfies.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Fulfillment {
    #[serde(deserialize_with = "serde_helpers::string_or_number")]
    pub program_id: String,
    #[serde(default)]
    pub program_name: String,
    #[serde(deserialize_with = "serde_helpers::string_or_number")]
    pub requirement_id: String,
    #[serde(default)]
    pub requirement_description: String,
    #[serde(default)]
    pub match_type: MatchType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub matched_at: Option<DateTime<Utc>>,
    /// Set when the match went through the transfer course's original code.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub matched_course_code: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub requirement_type: Option<String>,
}

impl Fulfillment {
    pub fn is_manual(&self) -> bool {
        self.match_type == MatchType::Manual
    }

    /// `programId:requirementId`, the identity used for de-duplication.
    pub fn key(&self) -> String {
        format!("{}:{}", self.program_id, self.requirement_id)
    }

    /// True when this fulfillment targets `requirement_path` itself or a node
    /// nested below it (`"3"` covers `"3"` and `"3.2"`, not `"30"`).
    pub fn falls_under(&self, program_id: &str, requirement_path: &str) -> bool {
        if self.program_id != program_id {
            return false;
        }
        let id = self.requirement_id.as_str();
        id == requirement_path
            || (id.len() > requirement_path.len()
                && id.starts_with(requirement_path)
                && id.as_bytes()[requirement_path.len()] == b'.')
    }
}

/// A transcript or planned entry.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StudentCourse {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, deserialize_with = "serde_helpers::null_as_default")]
    pub term: String,
    #[serde(default, deserialize_with = "serde_helpers::null_as_default")]
    pub subject: String,
    #[serde(default, deserialize_with = "serde_helpers::string_or_number")]
    pub number: String,
    #[serde(default, deserialize_with = "serde_helpers::null_as_default")]
    pub title: String,
    /// `None` until the course is graded/credited.
    #[serde(default, deserialize_with = "serde_helpers::lenient_credits")]
    pub credits: Option<f64>,
    #[serde(default)]
    pub grade: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty", deserialize_with = "serde_helpers::null_as_default")]
    pub tags: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub origin: Option<CourseOrigin>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transfer: Option<TransferCredit>,
    #[serde(default, deserialize_with = "serde_helpers::null_as_default")]
    pub fulfills_requirements: Vec<Fulfillment>,
}

impl StudentCourse {
    pub fn new(subject: &str, number: &str, credits: Option<f64>, grade: Option<&str>) -> Self {
        StudentCourse {
            subject: subject.to_string(),
            number: number.to_string(),
            credits,
            grade: grade.map(|g| g.to_string()),
            ..Default::default()
        }
    }

    /// `"SUBJ NUM"` as shown on a transcript.
    pub fn code(&self) -> String {
        format!("{} {}", self.subject.trim(), self.number.trim()).trim().to_string()
    }

    /// Codes tried against the catalog, in order. The flag is `true` for the
    /// course's own (equivalent) code and `false` for a transfer original,
    /// which is only tried when the course's origin is `transfer`.
    pub fn candidate_codes(&self) -> Vec<(String, bool)> {
        let mut codes = Vec::new();
        let own = self.code();
        if !own.is_empty() {
            codes.push((own, true));
        }
        if let (Some(CourseOrigin::Transfer), Some(t)) = (self.origin, self.transfer.as_ref()) {
            let original = format!("{} {}", t.original_subject.trim(), t.original_number.trim()).trim().to_string();
            if !original.is_empty() {
                codes.push((original, false));
            }
        }
        codes
    }

    /// Credits usable for sums: null, negative and non-finite values count as 0.
    pub fn credit_value(&self) -> f64 {
        match self.credits {
            Some(c) if c.is_finite() && c > 0.0 => c,
            _ => 0.0,
        }
    }

    /// Stable identifier used in reports: the stored id, or `SUBJ_NUM`.
    pub fn display_id(&self) -> String {
        match &self.id {
            Some(id) if !id.is_empty() => id.clone(),
            _ => format!("{}_{}", self.subject.trim(), self.number.trim()),
        }
    }
}

/// A program row as delivered by the catalog. `requirements` is kept raw:
/// it may be a JSON string or an object, and is parsed by
/// [`crate::requirements::parse_program_requirements`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Program {
    #[serde(deserialize_with = "serde_helpers::string_or_number")]
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default, alias = "program_type", deserialize_with = "serde_helpers::null_as_default")]
    pub program_type: String,
    #[serde(default)]
    pub requirements: serde_json::Value,
}

impl Program {
    pub fn new(id: &str, name: &str, program_type: &str, requirements: serde_json::Value) -> Self {
        Program {
            id: id.to_string(),
            name: name.to_string(),
            program_type: program_type.to_string(),
            requirements,
        }
    }
}

pub mod serde_helpers {
    use serde::{Deserialize, Deserializer};
    use serde_json::Value;

    /// Ids and course numbers show up both as `"142"` and `142`.
    pub fn string_or_number<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
        let v = Value::deserialize(deserializer)?;
        Ok(value_to_string(&v))
    }

    pub fn value_to_string(v: &Value) -> String {
        match v {
            Value::String(s) => s.trim().to_string(),
            Value::Number(n) => n.to_string(),
            Value::Bool(b) => b.to_string(),
            _ => String::new(),
        }
    }

    pub fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
    where
        D: Deserializer<'de>,
        T: Default + Deserialize<'de>,
    {
        Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
    }

    /// Credits arrive as numbers, numeric strings or null. Anything that does
    /// not yield a finite number becomes `None`.
    pub fn lenient_credits<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<f64>, D::Error> {
        let v = Value::deserialize(deserializer)?;
        Ok(value_to_credits(&v))
    }

    pub fn value_to_credits(v: &Value) -> Option<f64> {
        let n = match v {
            Value::Number(n) => n.as_f64(),
            Value::String(s) => s.trim().replace(',', ".").parse::<f64>().ok(),
            _ => None,
        }?;
        if n.is_finite() { Some(n) } else { None }
    }
}
