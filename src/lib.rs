// Biblioteca raíz del crate `degreeaudit`.
// Motor de emparejamiento de cursos contra requisitos de programa, con la
// capa HTTP y de persistencia que lo rodea.
pub mod error;
pub mod models;
pub mod requirements;
pub mod algorithm;
pub mod api_json;
pub mod store;
pub mod config;
pub mod server;

/// Ejecuta el servidor HTTP (reexport para facilitar uso desde `main`)
pub use server::run_server;

pub use algorithm::{run_audit, AuditOutcome, MatchOptions};
pub use error::{AuditError, RequirementsError, StoreError};
