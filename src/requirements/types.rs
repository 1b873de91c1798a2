use serde::{Deserialize, Serialize};

use crate::models::serde_helpers;

/// Catalog course reference inside a requirement.
///
/// `code` may carry a trailing wildcard (`"CS 1XX"`).
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Course {
    #[serde(deserialize_with = "serde_helpers::string_or_number")]
    pub code: String,
    #[serde(default, deserialize_with = "serde_helpers::null_as_default")]
    pub title: String,
    #[serde(default, deserialize_with = "serde_helpers::lenient_credits")]
    pub credits: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_credits: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_credits: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prerequisite: Option<String>,
    #[serde(default, alias = "terms", skip_serializing_if = "Option::is_none")]
    pub terms_offered: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sequence_group: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sequence_order: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_repeats: Option<u32>,
}

impl Course {
    pub fn new(code: &str, credits: f64) -> Self {
        Course {
            code: code.to_string(),
            credits: Some(credits),
            ..Default::default()
        }
    }
}

/// Discriminant of [`RequirementKind`], used in results and on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum RequirementTag {
    AllOf,
    ChooseNOf,
    CreditBucket,
    OptionGroup,
    Sequence,
    NoteOnly,
    Unknown,
}

impl RequirementTag {
    pub fn as_str(&self) -> &'static str {
        match self {
            RequirementTag::AllOf => "allOf",
            RequirementTag::ChooseNOf => "chooseNOf",
            RequirementTag::CreditBucket => "creditBucket",
            RequirementTag::OptionGroup => "optionGroup",
            RequirementTag::Sequence => "sequence",
            RequirementTag::NoteOnly => "noteOnly",
            RequirementTag::Unknown => "unknown",
        }
    }
}

/// One mutually exclusive track of an `optionGroup`.
#[derive(Debug, Clone, PartialEq)]
pub struct TrackOption {
    pub track_id: String,
    pub track_name: String,
    pub requirements: Vec<ProgramRequirement>,
}

/// One ordered block of a `sequence`. Order is informational only.
#[derive(Debug, Clone, PartialEq)]
pub struct SequenceBlock {
    pub sequence_id: String,
    pub term: Option<String>,
    pub cohort: Option<String>,
    pub courses: Vec<Course>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum RequirementKind {
    AllOf {
        courses: Vec<Course>,
    },
    /// `n` is kept as authored; see [`RequirementKind::effective_n`].
    ChooseNOf {
        courses: Vec<Course>,
        n: Option<i64>,
    },
    CreditBucket {
        courses: Vec<Course>,
        min_total_credits: f64,
        max_total_credits: Option<f64>,
        /// Subject pool used when `courses` is empty.
        subjects: Vec<String>,
    },
    OptionGroup {
        options: Vec<TrackOption>,
    },
    Sequence {
        blocks: Vec<SequenceBlock>,
    },
    NoteOnly {
        steps: Vec<String>,
    },
    /// A `type` this engine does not know. Evaluated like `NoteOnly`.
    Unknown {
        type_name: String,
    },
}

impl RequirementKind {
    pub fn tag(&self) -> RequirementTag {
        match self {
            RequirementKind::AllOf { .. } => RequirementTag::AllOf,
            RequirementKind::ChooseNOf { .. } => RequirementTag::ChooseNOf,
            RequirementKind::CreditBucket { .. } => RequirementTag::CreditBucket,
            RequirementKind::OptionGroup { .. } => RequirementTag::OptionGroup,
            RequirementKind::Sequence { .. } => RequirementTag::Sequence,
            RequirementKind::NoteOnly { .. } => RequirementTag::NoteOnly,
            RequirementKind::Unknown { .. } => RequirementTag::Unknown,
        }
    }

    /// Courses listed directly on the node (sequence blocks included).
    pub fn direct_courses(&self) -> Vec<&Course> {
        match self {
            RequirementKind::AllOf { courses }
            | RequirementKind::ChooseNOf { courses, .. }
            | RequirementKind::CreditBucket { courses, .. } => courses.iter().collect(),
            RequirementKind::Sequence { blocks } => blocks.iter().flat_map(|b| b.courses.iter()).collect(),
            _ => Vec::new(),
        }
    }

    /// `n` for a `chooseNOf`: a missing or non-positive value degrades to
    /// the number of listed courses.
    pub fn effective_n(&self) -> Option<usize> {
        match self {
            RequirementKind::ChooseNOf { courses, n } => Some(match n {
                Some(v) if *v > 0 => *v as usize,
                _ => courses.len(),
            }),
            _ => None,
        }
    }

    /// A `chooseNOf` without a positive `n`, which is evaluated as `allOf`.
    pub fn is_degraded_choose(&self) -> bool {
        matches!(self, RequirementKind::ChooseNOf { n, .. } if !matches!(n, Some(v) if *v > 0))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ProgramRequirement {
    /// Id as authored (`"3"`, `"3.2"`, `"7"`).
    pub requirement_id: String,
    pub description: String,
    pub kind: RequirementKind,
    pub sub_requirements: Vec<ProgramRequirement>,
    pub notes: Option<String>,
    pub sequencing_notes: Option<String>,
    pub other_requirement: Option<String>,
}

impl ProgramRequirement {
    pub fn new(requirement_id: &str, description: &str, kind: RequirementKind) -> Self {
        ProgramRequirement {
            requirement_id: requirement_id.to_string(),
            description: description.to_string(),
            kind,
            sub_requirements: Vec::new(),
            notes: None,
            sequencing_notes: None,
            other_requirement: None,
        }
    }

    pub fn with_sub_requirements(mut self, subs: Vec<ProgramRequirement>) -> Self {
        self.sub_requirements = subs;
        self
    }

    pub fn tag(&self) -> RequirementTag {
        self.kind.tag()
    }

    /// Every catalog course reachable from this node: direct courses, sequence
    /// blocks, option tracks and sub-requirements.
    pub fn all_courses(&self) -> Vec<&Course> {
        let mut out = self.kind.direct_courses();
        if let RequirementKind::OptionGroup { options } = &self.kind {
            for opt in options {
                for r in &opt.requirements {
                    out.extend(r.all_courses());
                }
            }
        }
        for sub in &self.sub_requirements {
            out.extend(sub.all_courses());
        }
        out
    }
}

/// Dotted path of a child node: `<parent>.<childId>`, or the id itself at
/// the top level.
pub fn child_path(parent: &str, child_id: &str) -> String {
    if parent.is_empty() {
        return child_id.to_string();
    }
    format!("{}.{}", parent, child_id)
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct RequirementsMetadata {
    pub no_double_count: bool,
}

/// Parsed, normalised requirement tree of one program.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ProgramRequirements {
    pub program_requirements: Vec<ProgramRequirement>,
    pub metadata: RequirementsMetadata,
}

impl ProgramRequirements {
    /// Number of nodes in the tree, option tracks' requirements included.
    pub fn node_count(&self) -> usize {
        fn count(reqs: &[ProgramRequirement]) -> usize {
            reqs.iter()
                .map(|r| {
                    let tracks = match &r.kind {
                        RequirementKind::OptionGroup { options } => options.iter().map(|o| count(&o.requirements)).sum(),
                        _ => 0,
                    };
                    1 + tracks + count(&r.sub_requirements)
                })
                .sum()
        }
        count(&self.program_requirements)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_child_path() {
        assert_eq!(child_path("", "3"), "3");
        assert_eq!(child_path("3", "2"), "3.2");
        // ids ya punteados se concatenan igual; así dos hermanos nunca colisionan
        assert_eq!(child_path("3", "3.2"), "3.3.2");
        assert_eq!(child_path("3", "32"), "3.32");
    }

    #[test]
    fn test_effective_n_degrades_to_course_count() {
        let courses = vec![Course::new("A 1", 3.0), Course::new("A 2", 3.0), Course::new("A 3", 3.0)];
        let missing = RequirementKind::ChooseNOf { courses: courses.clone(), n: None };
        let zero = RequirementKind::ChooseNOf { courses: courses.clone(), n: Some(0) };
        let two = RequirementKind::ChooseNOf { courses, n: Some(2) };
        assert_eq!(missing.effective_n(), Some(3));
        assert_eq!(zero.effective_n(), Some(3));
        assert_eq!(two.effective_n(), Some(2));
    }
}
