//! A placeholder projects endpoint that answers every verb with a fixed list
//! and does not persist anything.
use crate::state::AppState;
use axum::{Router, response::Json, routing::get};

pub fn router() -> Router<AppState> {
    Router::new().route(
        "/",
        get(list_projects)
            .post(add_project)
            .put(modify_project)
            .delete(delete_project),
    )
}

async fn list_projects() -> Json<Vec<&'static str>> {
    Json(vec!["Projeto 1", "Projeto 2", "Projeto 3"])
}

async fn add_project() -> Json<Vec<&'static str>> {
    Json(vec!["Projeto 1", "Projeto 2", "Projeto 3", "Projeto 4"])
}

async fn modify_project() -> Json<Vec<&'static str>> {
    Json(vec!["Projeto 1", "Projeto 2", "Projeto 3", "Projeto 5"])
}

async fn delete_project() -> Json<Vec<&'static str>> {
    Json(vec!["Projeto 1", "Projeto 2"])
}
