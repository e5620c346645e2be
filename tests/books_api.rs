use axum::{
    body::{to_bytes, Body},
    http::{header, Method, Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use shelf_kernel::settings::{DatabaseSettings, Settings};
use tower::ServiceExt;

const SEEDED_ISBN: &str = "0486661105";

fn seeded_book() -> Value {
    json!({
        "isbn": SEEDED_ISBN,
        "amazon_url": "https://amazon.com/blahblah",
        "author": "Rutherford Aris",
        "language": "English",
        "pages": 286,
        "publisher": "Dover Publications, inc.",
        "title": "Vectors, Tensors, and the Basic Equations of Fluid Mechanics",
        "year": 1962
    })
}

fn manifolds() -> Value {
    json!({
        "isbn": "9780805390216",
        "amazon_url": "https://wwww.amazon.com/Calculus-Manifolds",
        "author": "Michael Spivak",
        "language": "english",
        "pages": 114,
        "publisher": "W.A Benjamin, inc.",
        "title": "Calculus On Manifolds",
        "year": 1965
    })
}

fn revised_fields() -> Value {
    json!({
        "amazon_url": "https://amazon.com/blahblahNEW",
        "author": "Rutherford Aris",
        "language": "english",
        "pages": 143,
        "publisher": "Dover Publications, inc.",
        "title": "Vectors, Tensors, and the Basic Equations of Fluid Mechanics, NEW",
        "year": 1967
    })
}

async fn send(
    router: &Router,
    method: Method,
    uri: &str,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let builder = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = router.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let json = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };

    (status, json)
}

/// Fresh in-memory database with one seeded book
async fn seeded_app() -> Router {
    let settings = Settings {
        database: DatabaseSettings::in_memory(),
        ..Settings::default()
    };

    let app = shelf_app::prepare(settings).await.unwrap();
    app.migrate().await.unwrap();
    let router = app.router();

    let (status, _) = send(&router, Method::POST, "/books", Some(seeded_book())).await;
    assert_eq!(status, StatusCode::CREATED);

    router
}

#[tokio::test]
async fn test_create_with_all_fields_echoes_book() {
    let router = seeded_app().await;

    let (status, body) = send(&router, Method::POST, "/books", Some(manifolds())).await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["book"], manifolds());
}

#[tokio::test]
async fn test_create_with_missing_fields_lists_each_one() {
    let router = seeded_app().await;

    let (status, body) = send(
        &router,
        Method::POST,
        "/books",
        Some(json!({ "year": 2000 })),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(
        body["error"]["error"],
        json!([
            "instance requires property \"isbn\"",
            "instance requires property \"amazon_url\"",
            "instance requires property \"author\"",
            "instance requires property \"language\"",
            "instance requires property \"pages\"",
            "instance requires property \"publisher\"",
            "instance requires property \"title\""
        ])
    );
}

#[tokio::test]
async fn test_create_duplicate_isbn_conflicts() {
    let router = seeded_app().await;

    let (status, body) = send(&router, Method::POST, "/books", Some(seeded_book())).await;

    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(
        body["error"]["message"],
        "There is already a book with an isbn 0486661105"
    );
}

#[tokio::test]
async fn test_create_with_malformed_json_is_bad_request() {
    let router = seeded_app().await;

    let request = Request::builder()
        .method(Method::POST)
        .uri("/books")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{\"isbn\": "))
        .unwrap();
    let response = router.clone().oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(body["error"]["code"], "bad_request");
}

#[tokio::test]
async fn test_list_returns_every_book() {
    let router = seeded_app().await;

    let (status, body) = send(&router, Method::GET, "/books", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["books"], json!([seeded_book()]));

    send(&router, Method::POST, "/books", Some(manifolds())).await;

    let (_, body) = send(&router, Method::GET, "/books", None).await;
    assert_eq!(body["books"].as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn test_list_filters_by_field_equality() {
    let router = seeded_app().await;
    send(&router, Method::POST, "/books", Some(manifolds())).await;

    let (status, body) =
        send(&router, Method::GET, "/books?author=Michael%20Spivak", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["books"], json!([manifolds()]));

    let (_, body) = send(&router, Method::GET, "/books?year=1962&sort=title", None).await;
    assert_eq!(body["books"], json!([seeded_book()]));
}

#[tokio::test]
async fn test_list_rejects_non_integer_filter() {
    let router = seeded_app().await;

    let (status, body) = send(&router, Method::GET, "/books?pages=lots", None).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "bad_request");
}

#[tokio::test]
async fn test_list_reports_first_invalid_integer_filter() {
    let router = seeded_app().await;

    for _ in 0..8 {
        let (status, body) = send(&router, Method::GET, "/books?year=y&pages=x", None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(
            body["error"]["message"],
            "filter 'pages' must be an integer, got 'x'"
        );
    }
}

#[tokio::test]
async fn test_get_existing_book() {
    let router = seeded_app().await;

    let (status, body) = send(&router, Method::GET, "/books/0486661105", None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["book"], seeded_book());
}

#[tokio::test]
async fn test_get_missing_book_is_not_found() {
    let router = seeded_app().await;

    let (status, body) = send(&router, Method::GET, "/books/0", None).await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"]["message"], "There is no book with an isbn 0");
    assert_eq!(body["error"]["status"], 404);
}

#[tokio::test]
async fn test_update_replaces_fields_and_keeps_isbn() {
    let router = seeded_app().await;

    let (status, body) = send(
        &router,
        Method::PUT,
        "/books/0486661105",
        Some(revised_fields()),
    )
    .await;

    let mut expected = revised_fields();
    expected["isbn"] = json!(SEEDED_ISBN);

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["book"], expected);

    let (_, body) = send(&router, Method::GET, "/books/0486661105", None).await;
    assert_eq!(body["book"], expected);
}

#[tokio::test]
async fn test_update_with_isbn_in_body_is_rejected_first() {
    let router = seeded_app().await;

    let mut full = revised_fields();
    full["isbn"] = json!(SEEDED_ISBN);
    let (status, body) = send(&router, Method::PUT, "/books/0486661105", Some(full)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["error"], "isbn already exists");

    // Other violations are not reported while isbn is present.
    let (status, body) = send(
        &router,
        Method::PUT,
        "/books/0486661105",
        Some(json!({ "isbn": "123" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["error"], "isbn already exists");
}

#[tokio::test]
async fn test_update_with_missing_fields_lists_them() {
    let router = seeded_app().await;

    let (status, body) = send(
        &router,
        Method::PUT,
        "/books/0486661105",
        Some(json!({
            "author": "Rutherford Aris",
            "language": "english",
            "pages": 143,
            "publisher": "Dover Publications, inc.",
            "year": 1967
        })),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(
        body["error"]["error"],
        json!([
            "instance requires property \"amazon_url\"",
            "instance requires property \"title\""
        ])
    );
}

#[tokio::test]
async fn test_update_missing_book_is_not_found() {
    let router = seeded_app().await;

    let (status, body) = send(&router, Method::PUT, "/books/0", Some(revised_fields())).await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"]["message"], "There is no book with an isbn 0");
}

#[tokio::test]
async fn test_delete_removes_book() {
    let router = seeded_app().await;

    let (status, body) = send(&router, Method::DELETE, "/books/0486661105", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "message": "Book deleted" }));

    let (status, _) = send(&router, Method::GET, "/books/0486661105", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = send(&router, Method::DELETE, "/books/0486661105", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_health_and_openapi_routes() {
    let router = seeded_app().await;

    let response = router
        .clone()
        .oneshot(Request::builder().uri("/healthz").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let (status, spec) = send(&router, Method::GET, "/docs/openapi.json", None).await;
    assert_eq!(status, StatusCode::OK);
    assert!(spec["paths"]["/books"]["post"].is_object());
    assert!(spec["paths"]["/books/{isbn}"]["delete"].is_object());
}
