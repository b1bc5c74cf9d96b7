use crate::state::AppState;
use axum::Router;

mod item;
mod location;
mod project;
#[cfg(test)]
mod tests;

pub fn router() -> Router<AppState> {
    Router::new()
        .nest("/locations", location::router())
        .nest("/items", item::router())
        .nest("/projects", project::router())
}
