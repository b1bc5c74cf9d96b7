use crate::{error, state::AppState};
use axum::{Router, extract::State, response::Json, routing::get};
use libecoleta::item::Item;

pub fn router() -> Router<AppState> {
    Router::new().route("/", get(list_items))
}

async fn list_items(State(state): State<AppState>) -> Result<Json<Vec<Item>>, error::Error> {
    let items = Item::load_all(&state.db).await?;
    Ok(Json(items))
}
