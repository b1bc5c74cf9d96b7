use crate::test_app;
use axum::{
    Router,
    body::{Body, Bytes, HttpBody},
    http::{Request, Response, StatusCode, header::CONTENT_TYPE},
};
use http_body_util::BodyExt;
use serde_json::Value;
use sqlx::{Pool, Sqlite};
use test_log::test;
use tower::Service;

mod item;

/// run a single request through the app
async fn send(app: &mut Router, request: Request<Body>) -> Response<Body> {
    app.as_service()
        .call(request)
        .await
        .expect("Failed to execute request")
}

async fn get(app: &mut Router, uri: &str) -> Response<Body> {
    let req = Request::builder()
        .uri(uri)
        .method("GET")
        .body(Body::empty())
        .expect("Failed to build request");
    send(app, req).await
}

/// collect the response body and parse it as json. This consumes the body.
async fn body_json<B>(body: B) -> Value
where
    B: HttpBody<Data = Bytes>,
    B::Error: std::fmt::Debug,
{
    let bytes = body
        .collect()
        .await
        .expect("failed to collect body")
        .to_bytes();
    serde_json::from_slice(&bytes).expect("response body is not json")
}

#[test(sqlx::test(migrations = "../db/migrations/"))]
async fn test_unknown_route(pool: Pool<Sqlite>) {
    let (mut app, _state, _uploads) = test_app(pool).expect("failed to create test app");
    let response = get(&mut app, "/nowhere").await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[test(sqlx::test(migrations = "../db/migrations/"))]
async fn test_request_id_is_propagated(pool: Pool<Sqlite>) {
    let (mut app, _state, _uploads) = test_app(pool).expect("failed to create test app");
    let req = Request::builder()
        .uri("/items")
        .method("GET")
        .header("x-request-id", "abc-123")
        .header(CONTENT_TYPE, "application/json")
        .body(Body::empty())
        .expect("Failed to build request");
    let response = send(&mut app, req).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response
            .headers()
            .get("x-request-id")
            .and_then(|v| v.to_str().ok()),
        Some("abc-123")
    );

    // one is generated when the client doesn't send one
    let response = get(&mut app, "/items").await;
    assert!(response.headers().get("x-request-id").is_some());
}
