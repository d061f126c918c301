//! Live API tests
//!
//! Run against a server started with a staff account configured:
//! `LIBRARY_AUTH__ADMIN_USERNAME=admin LIBRARY_AUTH__ADMIN_PASSWORD=admin-password`
//! then `cargo test -- --ignored --test-threads=1` (listings are compared
//! across requests, so tests must not add authors concurrently).

use chrono::{Duration, Local};
use reqwest::{redirect::Policy, Client, StatusCode};
use serde_json::{json, Value};
use uuid::Uuid;

const BASE_URL: &str = "http://localhost:8080/api/v1";

fn client() -> Client {
    Client::builder()
        .redirect(Policy::none())
        .build()
        .expect("Failed to build client")
}

fn admin_credentials() -> (String, String) {
    (
        std::env::var("LIBRARY_AUTH__ADMIN_USERNAME").unwrap_or_else(|_| "admin".to_string()),
        std::env::var("LIBRARY_AUTH__ADMIN_PASSWORD")
            .unwrap_or_else(|_| "admin-password".to_string()),
    )
}

async fn login(client: &Client, username: &str, password: &str) -> String {
    let response = client
        .post(format!("{}/auth/login", BASE_URL))
        .json(&json!({ "username": username, "password": password }))
        .send()
        .await
        .expect("Failed to send login request");
    assert_eq!(response.status(), StatusCode::OK);

    let body: Value = response.json().await.expect("Failed to parse login response");
    body["token"].as_str().expect("No token in response").to_string()
}

/// Register a fresh reader and return their token and user id
async fn new_reader(client: &Client, prefix: &str) -> (String, i64) {
    let username = format!("{}{}", prefix, &Uuid::new_v4().simple().to_string()[..8]);
    let response = client
        .post(format!("{}/auth/register", BASE_URL))
        .json(&json!({ "username": username, "password": "correct-horse" }))
        .send()
        .await
        .expect("Failed to send register request");
    assert_eq!(response.status(), StatusCode::CREATED);
    let user: Value = response.json().await.expect("Failed to parse register response");
    let user_id = user["id"].as_i64().expect("No user id");

    (login(client, &username, "correct-horse").await, user_id)
}

async fn create_genre(client: &Client, admin: &str, name: &str) -> Value {
    client
        .post(format!("{}/admin/genres", BASE_URL))
        .bearer_auth(admin)
        .json(&json!({ "name": format!("{} {}", name, Uuid::new_v4()) }))
        .send()
        .await
        .expect("Failed to create genre")
        .json()
        .await
        .unwrap()
}

async fn get_json(client: &Client, url: String, token: Option<&str>) -> Value {
    let mut request = client.get(url);
    if let Some(token) = token {
        request = request.bearer_auth(token);
    }
    request
        .send()
        .await
        .expect("Failed to send request")
        .json()
        .await
        .expect("Failed to parse response")
}

/// Create two genres, an author and a book as staff; returns the book id
async fn create_book(client: &Client, admin: &str) -> i64 {
    let romance = create_genre(client, admin, "Romance").await;
    let satire = create_genre(client, admin, "Satire").await;

    let author: Value = client
        .post(format!("{}/admin/authors", BASE_URL))
        .bearer_auth(admin)
        .json(&json!({
            "first_name": "Jane",
            "last_name": "Austen",
            "biography": "English novelist"
        }))
        .send()
        .await
        .expect("Failed to create author")
        .json()
        .await
        .unwrap();

    let book: Value = client
        .post(format!("{}/admin/books", BASE_URL))
        .bearer_auth(admin)
        .json(&json!({
            "title": "Pride and Prejudice",
            "summary": "Elizabeth Bennet meets Mr Darcy",
            "author_id": author["id"],
            "genre_ids": [romance["id"], satire["id"]]
        }))
        .send()
        .await
        .expect("Failed to create book")
        .json()
        .await
        .unwrap();

    book["id"].as_i64().expect("No book id")
}

#[tokio::test]
#[ignore] // Run with: cargo test -- --ignored
async fn test_health_check() {
    let response = client()
        .get(format!("{}/health", BASE_URL))
        .send()
        .await
        .expect("Failed to send request");

    assert!(response.status().is_success());
    let body: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body["status"], "healthy");
}

#[tokio::test]
#[ignore]
async fn test_login_invalid_credentials() {
    let response = client()
        .post(format!("{}/auth/login", BASE_URL))
        .json(&json!({ "username": "admin", "password": "wrong" }))
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
#[ignore]
async fn test_visit_counter_follows_session_cookie() {
    let client = client();

    let first = client
        .get(format!("{}/", BASE_URL))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(first.status(), StatusCode::OK);
    let cookie = first
        .headers()
        .get(reqwest::header::SET_COOKIE)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(';').next())
        .expect("No session cookie")
        .to_string();
    let body: Value = first.json().await.unwrap();
    assert_eq!(body["num_visits"], 1);

    let second: Value = client
        .get(format!("{}/", BASE_URL))
        .header(reqwest::header::COOKIE, cookie)
        .send()
        .await
        .expect("Failed to send request")
        .json()
        .await
        .unwrap();
    assert_eq!(second["num_visits"], 2);
}

#[tokio::test]
#[ignore]
async fn test_reservation_belongs_to_its_reader() {
    let client = client();
    let (admin_user, admin_password) = admin_credentials();
    let admin = login(&client, &admin_user, &admin_password).await;
    let book_id = create_book(&client, &admin).await;

    let book = get_json(&client, format!("{}/book/{}", BASE_URL, book_id), None).await;
    assert_eq!(book["genres"].as_array().unwrap().len(), 2);
    assert_eq!(book["display_genre"].as_str().unwrap().matches(", ").count(), 1);

    let (alice, alice_id) = new_reader(&client, "alice").await;
    let (bob, _) = new_reader(&client, "bob").await;

    let response = client
        .post(format!("{}/book/reserve?book_id={}", BASE_URL, book_id))
        .bearer_auth(&alice)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    let reserved: Value = response.json().await.unwrap();
    let instance_id = reserved["id"].as_str().unwrap().to_string();
    let due_back = (Local::now().date_naive() + Duration::days(14))
        .format("%Y-%m-%d")
        .to_string();
    assert_eq!(reserved["status"], "reserved");
    assert_eq!(reserved["reader_id"], alice_id);
    assert_eq!(reserved["due_back"], due_back.as_str());

    let mine = get_json(&client, format!("{}/books/my", BASE_URL), Some(&alice)).await;
    assert_eq!(mine["total"], 1);
    assert_eq!(mine["items"][0]["id"], instance_id.as_str());
    assert_eq!(mine["items"][0]["status"], "reserved");
    assert_eq!(mine["items"][0]["due_back"], due_back.as_str());

    // Bob can neither take nor return alice's copy
    let response = client
        .put(format!("{}/bookinstance/{}", BASE_URL, instance_id))
        .bearer_auth(&bob)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let response = client
        .delete(format!("{}/bookinstance/{}", BASE_URL, instance_id))
        .bearer_auth(&bob)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let instance = get_json(
        &client,
        format!("{}/bookinstance/{}", BASE_URL, instance_id),
        Some(&alice),
    )
    .await;
    assert_eq!(instance["status"], "reserved");
    assert_eq!(instance["reader_id"], alice_id);
    assert_eq!(instance["due_back"], due_back.as_str());
}

#[tokio::test]
#[ignore]
async fn test_reserve_take_and_return() {
    let client = client();
    let (admin_user, admin_password) = admin_credentials();
    let admin = login(&client, &admin_user, &admin_password).await;
    let book_id = create_book(&client, &admin).await;
    let (alice, _) = new_reader(&client, "alice").await;

    let reserved: Value = client
        .post(format!("{}/book/reserve?book_id={}", BASE_URL, book_id))
        .bearer_auth(&alice)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let instance_id = reserved["id"].as_str().unwrap().to_string();

    // Take, then extend
    let taken: Value = client
        .put(format!("{}/bookinstance/{}", BASE_URL, instance_id))
        .bearer_auth(&alice)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(taken["action"], "taking");
    assert_eq!(taken["instance"]["status"], "taken");

    let extended: Value = client
        .put(format!("{}/bookinstance/{}", BASE_URL, instance_id))
        .bearer_auth(&alice)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(extended["action"], "extending");
    assert_eq!(extended["instance"]["status"], "taken");

    // Return
    let response = client
        .delete(format!("{}/bookinstance/{}", BASE_URL, instance_id))
        .bearer_auth(&alice)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = client
        .get(format!("{}/bookinstance/{}", BASE_URL, instance_id))
        .bearer_auth(&alice)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
#[ignore]
async fn test_blank_author_query_lists_everyone() {
    let client = client();

    for page in ["1", "2", "last"] {
        let unfiltered = get_json(
            &client,
            format!("{}/authors?page={}", BASE_URL, page),
            None,
        )
        .await;
        let blank = get_json(
            &client,
            format!("{}/authors?query=&page={}", BASE_URL, page),
            None,
        )
        .await;
        let spaces = get_json(
            &client,
            format!("{}/authors?query=%20%20&page={}", BASE_URL, page),
            None,
        )
        .await;

        assert_eq!(blank, unfiltered);
        assert_eq!(spaces, unfiltered);
    }
}

#[tokio::test]
#[ignore]
async fn test_broken_copy_cannot_be_taken() {
    let client = client();
    let (admin_user, admin_password) = admin_credentials();
    let admin = login(&client, &admin_user, &admin_password).await;
    let book_id = create_book(&client, &admin).await;
    let (alice, _) = new_reader(&client, "alice").await;

    let reserved: Value = client
        .post(format!("{}/book/reserve?book_id={}", BASE_URL, book_id))
        .bearer_auth(&alice)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let instance_id = reserved["id"].as_str().unwrap().to_string();

    let response = client
        .patch(format!("{}/admin/bookinstances/{}", BASE_URL, instance_id))
        .bearer_auth(&admin)
        .json(&json!({ "status": "broken" }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = client
        .put(format!("{}/bookinstance/{}", BASE_URL, instance_id))
        .bearer_auth(&alice)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
#[ignore]
async fn test_review_and_search() {
    let client = client();
    let (admin_user, admin_password) = admin_credentials();
    let admin = login(&client, &admin_user, &admin_password).await;
    let book_id = create_book(&client, &admin).await;
    let (alice, _) = new_reader(&client, "alice").await;

    let response = client
        .post(format!("{}/book/{}", BASE_URL, book_id))
        .bearer_auth(&alice)
        .json(&json!({ "content": "A delight from start to finish" }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    assert_eq!(
        response.headers()[reqwest::header::LOCATION],
        format!("/api/v1/book/{}", book_id).as_str()
    );

    let book: Value = client
        .get(format!("{}/book/{}", BASE_URL, book_id))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(book["reviews"][0]["content"], "A delight from start to finish");

    let authors: Value = client
        .get(format!("{}/authors?query=aust", BASE_URL))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert!(authors["total"].as_i64().unwrap() >= 1);
    assert_eq!(authors["items"][0]["last_name"], "Austen");

    let books: Value = client
        .get(format!("{}/books?query=pride&page=last", BASE_URL))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(books["page"], books["num_pages"]);
}

#[tokio::test]
#[ignore]
async fn test_admin_null_clears_optional_fields() {
    let client = client();
    let (admin_user, admin_password) = admin_credentials();
    let admin = login(&client, &admin_user, &admin_password).await;
    let book_id = create_book(&client, &admin).await;
    let book = get_json(&client, format!("{}/book/{}", BASE_URL, book_id), None).await;
    let author_id = book["author_id"].as_i64().unwrap();

    let author: Value = client
        .put(format!("{}/admin/authors/{}", BASE_URL, author_id))
        .bearer_auth(&admin)
        .json(&json!({ "first_name": "Jane" }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(author["biography"], "English novelist");

    let author: Value = client
        .put(format!("{}/admin/authors/{}", BASE_URL, author_id))
        .bearer_auth(&admin)
        .json(&json!({ "biography": null }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert!(author["biography"].is_null());

    let updated: Value = client
        .put(format!("{}/admin/books/{}", BASE_URL, book_id))
        .bearer_auth(&admin)
        .json(&json!({ "cover": "covers/pride.jpg" }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(updated["cover"], "covers/pride.jpg");

    let updated: Value = client
        .put(format!("{}/admin/books/{}", BASE_URL, book_id))
        .bearer_auth(&admin)
        .json(&json!({ "cover": null }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert!(updated["cover"].is_null());
    assert_eq!(updated["title"], "Pride and Prejudice");
}
