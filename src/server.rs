use std::sync::Arc;

use actix_cors::Cors;
use actix_web::{web, App, HttpServer};
use tracing::info;

use crate::algorithm::MatchOptions;
use crate::api_json::handlers::{
    audit_handler, compare_handler, get_courses_handler, help_handler, put_courses_handler, put_programs_handler,
    rematch_handler, requirement_options_handler,
};
use crate::config::AppConfig;
use crate::error::StoreError;
use crate::store::{CourseStore, ProgramCatalog, SqliteStore};

/// Shared state handed to every handler.
pub struct AppState {
    pub courses: Arc<dyn CourseStore>,
    pub catalog: Arc<dyn ProgramCatalog>,
    pub options: MatchOptions,
}

impl AppState {
    /// One SQLite file backs both the course store and the catalog.
    pub fn with_sqlite(store: SqliteStore, options: MatchOptions) -> Result<Self, StoreError> {
        store.init()?;
        let store = Arc::new(store);
        Ok(AppState { courses: store.clone(), catalog: store, options })
    }
}

/// Route table, shared by `run_server` and the HTTP tests.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.route("/audit", web::post().to(audit_handler))
        .route("/compare", web::post().to(compare_handler))
        .route("/requirements/options", web::post().to(requirement_options_handler))
        .route("/students/{id}/courses", web::get().to(get_courses_handler))
        .route("/students/{id}/courses", web::put().to(put_courses_handler))
        .route("/students/{id}/rematch", web::post().to(rematch_handler))
        .route("/programs", web::put().to(put_programs_handler))
        .route("/help", web::get().to(help_handler));
}

pub async fn run_server(config: AppConfig) -> std::io::Result<()> {
    let state = AppState::with_sqlite(SqliteStore::new(config.db_path.clone()), config.match_options())
        .map_err(|e| std::io::Error::other(format!("failed to open store: {}", e)))?;
    let state = web::Data::new(state);

    info!(bind = %config.bind, db = %config.db_path.display(), "starting degree audit service");
    HttpServer::new(move || {
        App::new()
            .wrap(Cors::permissive())
            .app_data(state.clone())
            .app_data(web::JsonConfig::default().limit(8 * 1024 * 1024))
            .configure(configure)
    })
    .bind(config.bind.as_str())?
    .run()
    .await
}
