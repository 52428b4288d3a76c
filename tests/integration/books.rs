use axum::http::StatusCode;
use serde_json::{json, Value};

use crate::common::{spawn_app, TestApp};

async fn seed(app: &TestApp, token: &str) -> Vec<Value> {
    let mut created = Vec::new();
    for book in [
        json!({ "title": "Dune", "author": "Herbert", "genre": "scifi", "price": 9.99, "popularity": 50 }),
        json!({ "title": "Emma", "author": "Austen", "genre": "classic", "price": 4.5, "popularity": 10 }),
        json!({ "title": "Anathem", "author": "Stephenson", "genre": "scifi", "price": 4.5, "popularity": 50 }),
        json!({ "title": "Persuasion", "author": "Austen", "genre": "classic", "price": 12.0, "popularity": 70 }),
    ] {
        created.push(app.create_book(token, book).await);
    }
    created
}

fn ids(body: &Value) -> Vec<i64> {
    body.as_array()
        .expect("array")
        .iter()
        .map(|b| b["id"].as_i64().expect("id"))
        .collect()
}

#[tokio::test]
async fn test_book_lifecycle() {
    let app = spawn_app().await;
    let admin = app.login("admin").await;
    let user = app.login("user").await;

    let created = app
        .create_book(&admin, json!({ "title": "Dune", "author": "Herbert", "price": 9.99 }))
        .await;
    let id = created["id"].as_i64().expect("generated id");
    assert!(created["created_at"].is_string());
    assert_eq!(created["popularity"], 0);
    assert_eq!(created["genre"], Value::Null);

    let (status, fetched) = app.request("GET", &format!("/books/{}", id), None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(fetched, created);

    let (status, _) = app.request("DELETE", &format!("/books/{}", id), Some(&user), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = app.request("DELETE", &format!("/books/{}", id), Some(&admin), None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    assert_eq!(body, Value::Null);

    let (status, body) = app.request("GET", &format!("/books/{}", id), None, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "NotFound");

    let (status, _) = app.request("DELETE", &format!("/books/{}", id), Some(&admin), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_list_sorting() {
    let app = spawn_app().await;
    let admin = app.login("admin").await;
    let books = seed(&app, &admin).await;
    let id = |i: usize| books[i]["id"].as_i64().unwrap();

    let (status, body) = app.request("GET", "/books?sort=price", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(ids(&body), vec![id(1), id(2), id(0), id(3)]);
    let prices: Vec<f64> = body.as_array().unwrap().iter().map(|b| b["price"].as_f64().unwrap()).collect();
    assert!(prices.windows(2).all(|w| w[0] <= w[1]));

    // popularity is the default ordering
    let (_, body) = app.request("GET", "/books", None, None).await;
    assert_eq!(ids(&body), vec![id(3), id(0), id(2), id(1)]);

    let (_, body) = app.request("GET", "/books?sort=title", None, None).await;
    assert_eq!(ids(&body), vec![id(2), id(0), id(1), id(3)]);

    let (status, body) = app.request("GET", "/books?sort=newest", None, None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "invalid sort");
}

#[tokio::test]
async fn test_list_limit() {
    let app = spawn_app().await;
    let admin = app.login("admin").await;
    seed(&app, &admin).await;

    for limit in [1, 2, 100] {
        let (status, body) = app.request("GET", &format!("/books?limit={}", limit), None, None).await;
        assert_eq!(status, StatusCode::OK);
        assert!(body.as_array().unwrap().len() <= limit);
    }

    for limit in [0, 101] {
        let (status, body) = app.request("GET", &format!("/books?limit={}", limit), None, None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "InvalidArgument");
    }
}

#[tokio::test]
async fn test_list_filters_and_cursor() {
    let app = spawn_app().await;
    let admin = app.login("admin").await;
    let books = seed(&app, &admin).await;
    let id = |i: usize| books[i]["id"].as_i64().unwrap();

    let (_, body) = app.request("GET", "/books?search=herb", None, None).await;
    assert_eq!(ids(&body), vec![id(0)]);

    let (_, body) = app.request("GET", "/books?search=an&sort=title", None, None).await;
    // Case-insensitive substring over title or author
    assert_eq!(ids(&body), vec![id(2)]);

    let (_, body) = app.request("GET", "/books?genre=classic&sort=price", None, None).await;
    assert_eq!(ids(&body), vec![id(1), id(3)]);

    let (_, body) = app.request("GET", "/books?author=Austen&genre=scifi", None, None).await;
    assert!(body.as_array().unwrap().is_empty());

    let (_, body) = app
        .request("GET", &format!("/books?sort=title&cursor={}", id(1)), None, None)
        .await;
    assert_eq!(ids(&body), vec![id(2), id(3)]);
}

#[tokio::test]
async fn test_patch_book() {
    let app = spawn_app().await;
    let admin = app.login("admin").await;
    let created = app
        .create_book(
            &admin,
            json!({ "title": "Dune", "author": "Herbert", "genre": "scifi", "price": 9.99, "isbn": "9780441013593" }),
        )
        .await;
    let uri = format!("/books/{}", created["id"]);

    // Empty patch: unchanged row
    let (status, body) = app.request("PATCH", &uri, Some(&admin), Some(json!({}))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, created);

    // Nulls are ignored, not written
    let (status, body) = app
        .request("PATCH", &uri, Some(&admin), Some(json!({ "genre": null, "price": 7.5 })))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["genre"], "scifi");
    assert_eq!(body["price"], 7.5);
    assert_eq!(body["isbn"], "9780441013593");
    assert_eq!(body["id"], created["id"]);
    assert_eq!(body["created_at"], created["created_at"]);

    let (_, fetched) = app.request("GET", &uri, None, None).await;
    assert_eq!(fetched, body);

    let (status, _) = app
        .request("PATCH", "/books/9999", Some(&admin), Some(json!({ "title": "Ghost" })))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = app.request("PATCH", "/books/9999", Some(&admin), Some(json!({}))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_present_fields_are_stored_verbatim() {
    let app = spawn_app().await;
    let admin = app.login("admin").await;

    let long_title = "x".repeat(201);
    let created = app
        .create_book(&admin, json!({ "title": long_title, "author": "Herbert", "price": 9.99 }))
        .await;
    assert_eq!(created["title"], long_title);

    // An empty string is a present, non-null value and gets applied
    let uri = format!("/books/{}", created["id"]);
    let (status, body) = app
        .request("PATCH", &uri, Some(&admin), Some(json!({ "title": "", "genre": "" })))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["title"], "");
    assert_eq!(body["genre"], "");
    assert_eq!(body["author"], "Herbert");

    let (status, _) = app
        .request("POST", "/books", Some(&admin), Some(json!({ "title": "Dune", "author": "Herbert" })))
        .await;
    assert!(status.is_client_error());
}
