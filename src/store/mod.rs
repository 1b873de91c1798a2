//! Módulo `store`: adaptadores de persistencia.
//!
//! El motor no conoce la base de datos; el servidor usa estos traits para
//! leer cursos y programas y para guardar los fulfillments recalculados.
//!
//! Submódulos:
//! - `sqlite`: implementación sobre un fichero SQLite con conexiones cortas

pub mod sqlite;

use crate::error::StoreError;
use crate::models::{Program, StudentCourse};

pub use sqlite::SqliteStore;

/// Per-student course lists, stored as one document per student.
pub trait CourseStore: Send + Sync {
    /// A student with no stored row has no courses.
    fn fetch_courses(&self, student_id: &str) -> Result<Vec<StudentCourse>, StoreError>;

    fn update_courses(&self, student_id: &str, courses: &[StudentCourse]) -> Result<(), StoreError>;
}

/// Program catalog.
pub trait ProgramCatalog: Send + Sync {
    /// Programs in the order of `ids`. Any unknown id is `NotFound`.
    fn fetch_programs(&self, ids: &[String]) -> Result<Vec<Program>, StoreError>;

    fn fetch_programs_by_type(&self, program_type: &str) -> Result<Vec<Program>, StoreError>;

    fn upsert_program(&self, program: &Program) -> Result<(), StoreError>;
}
