use super::*;
use test_log::test;

#[test(sqlx::test(migrations = "../db/migrations/"))]
async fn test_list_items(pool: Pool<Sqlite>) {
    let (mut app, _state, _uploads) = test_app(pool).expect("failed to create test app");
    let response = get(&mut app, "/items").await;
    assert_eq!(response.status(), StatusCode::OK);
    let items = body_json(response.into_body()).await;
    let items = items.as_array().expect("expected an array of items");
    assert_eq!(items.len(), 6);
    assert_eq!(items[1]["id"], 2);
    assert_eq!(items[1]["title"], "Pilhas e Baterias");
}
