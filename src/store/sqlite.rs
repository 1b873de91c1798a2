use std::fs;
use std::path::PathBuf;

use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension};
use serde_json::Value;
use tracing::warn;

use crate::error::StoreError;
use crate::models::{Program, StudentCourse};
use crate::store::{CourseStore, ProgramCatalog};

/// SQLite-backed store. Every call opens its own short-lived connection.
#[derive(Debug, Clone)]
pub struct SqliteStore {
    path: PathBuf,
}

impl SqliteStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        SqliteStore { path: path.into() }
    }

    /// Create the parent directory and the tables if missing.
    pub fn init(&self) -> Result<(), StoreError> {
        if let Some(dir) = self.path.parent() {
            if !dir.as_os_str().is_empty() && !dir.exists() {
                fs::create_dir_all(dir)?;
            }
        }
        let conn = self.open()?;
        conn.execute(
            "CREATE TABLE IF NOT EXISTS user_courses (
                student_id TEXT PRIMARY KEY,
                courses_json TEXT NOT NULL,
                updated_at TEXT NOT NULL
            )",
            [],
        )?;
        conn.execute(
            "CREATE TABLE IF NOT EXISTS programs (
                id TEXT PRIMARY KEY,
                name TEXT NOT NULL,
                program_type TEXT NOT NULL,
                requirements_json TEXT NOT NULL,
                updated_at TEXT NOT NULL
            )",
            [],
        )?;
        Ok(())
    }

    fn open(&self) -> Result<Connection, StoreError> {
        Ok(Connection::open(&self.path)?)
    }
}

/// Stored course documents are parsed entry by entry; an entry that no longer
/// deserializes is skipped rather than failing the whole list.
fn courses_from_json(student_id: &str, text: &str) -> Result<Vec<StudentCourse>, StoreError> {
    let items = match serde_json::from_str::<Value>(text)? {
        Value::Array(items) => items,
        Value::Null => return Ok(Vec::new()),
        other => {
            warn!(%student_id, "stored courses are not an array ({}), ignoring", other);
            return Ok(Vec::new());
        }
    };
    Ok(items
        .into_iter()
        .enumerate()
        .filter_map(|(i, item)| match serde_json::from_value::<StudentCourse>(item) {
            Ok(c) => Some(c),
            Err(e) => {
                warn!(%student_id, index = i, "skipping stored course: {}", e);
                None
            }
        })
        .collect())
}

// el blob se guarda tal cual: un string se persiste sin re-serializar
fn requirements_to_text(requirements: &Value) -> Result<String, StoreError> {
    match requirements {
        Value::String(s) => Ok(s.clone()),
        other => Ok(serde_json::to_string(other)?),
    }
}

fn program_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Program> {
    let requirements: String = row.get(3)?;
    Ok(Program {
        id: row.get(0)?,
        name: row.get(1)?,
        program_type: row.get(2)?,
        requirements: Value::String(requirements),
    })
}

impl CourseStore for SqliteStore {
    fn fetch_courses(&self, student_id: &str) -> Result<Vec<StudentCourse>, StoreError> {
        let conn = self.open()?;
        let text: Option<String> = conn
            .query_row(
                "SELECT courses_json FROM user_courses WHERE student_id = ?1",
                params![student_id],
                |row| row.get(0),
            )
            .optional()?;
        match text {
            Some(t) => courses_from_json(student_id, &t),
            None => Ok(Vec::new()),
        }
    }

    fn update_courses(&self, student_id: &str, courses: &[StudentCourse]) -> Result<(), StoreError> {
        let conn = self.open()?;
        let text = serde_json::to_string(courses)?;
        conn.execute(
            "INSERT INTO user_courses (student_id, courses_json, updated_at) VALUES (?1, ?2, ?3)
             ON CONFLICT(student_id) DO UPDATE SET courses_json = excluded.courses_json, updated_at = excluded.updated_at",
            params![student_id, text, Utc::now().to_rfc3339()],
        )?;
        Ok(())
    }
}

impl ProgramCatalog for SqliteStore {
    fn fetch_programs(&self, ids: &[String]) -> Result<Vec<Program>, StoreError> {
        let conn = self.open()?;
        let mut stmt = conn.prepare("SELECT id, name, program_type, requirements_json FROM programs WHERE id = ?1")?;
        let mut out = Vec::with_capacity(ids.len());
        for id in ids {
            let program = stmt
                .query_row(params![id], program_from_row)
                .optional()?
                .ok_or_else(|| StoreError::NotFound(format!("program {}", id)))?;
            out.push(program);
        }
        Ok(out)
    }

    fn fetch_programs_by_type(&self, program_type: &str) -> Result<Vec<Program>, StoreError> {
        let conn = self.open()?;
        let mut stmt = conn.prepare(
            "SELECT id, name, program_type, requirements_json FROM programs WHERE lower(program_type) = lower(?1) ORDER BY id",
        )?;
        let rows = stmt.query_map(params![program_type], program_from_row)?;
        let mut out = Vec::new();
        for r in rows {
            out.push(r?);
        }
        Ok(out)
    }

    fn upsert_program(&self, program: &Program) -> Result<(), StoreError> {
        let conn = self.open()?;
        conn.execute(
            "INSERT INTO programs (id, name, program_type, requirements_json, updated_at) VALUES (?1, ?2, ?3, ?4, ?5)
             ON CONFLICT(id) DO UPDATE SET name = excluded.name, program_type = excluded.program_type,
                requirements_json = excluded.requirements_json, updated_at = excluded.updated_at",
            params![
                program.id,
                program.name,
                program.program_type,
                requirements_to_text(&program.requirements)?,
                Utc::now().to_rfc3339()
            ],
        )?;
        Ok(())
    }
}
