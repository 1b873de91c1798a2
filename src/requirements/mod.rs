//! Módulo `requirements`: modelo de requisitos de programa y su ingestión.
//!
//! Submódulos:
//! - `types`: árbol de requisitos (`ProgramRequirement`, `RequirementKind`, `Course`)
//! - `parse`: lectura del blob persistido (string u objeto, tres formatos aceptados)
//! - `options`: catálogo plano de requisitos para asignación manual

pub mod types;
pub mod parse;
pub mod options;

pub use types::{
    child_path, Course, ProgramRequirement, ProgramRequirements, RequirementKind, RequirementTag,
    RequirementsMetadata, SequenceBlock, TrackOption,
};
pub use parse::{
    no_double_count_flag, parse_program_requirements, top_level_count, ParseWarning, ParsedRequirements,
    RequirementsLayout,
};
pub use options::{extract_requirement_options, RequirementOption};
