//! HTTP contract tests against the full router

use axum::http::StatusCode;
use axum_test::multipart::{MultipartForm, Part};
use axum_test::TestServer;
use serde_json::{json, Value};
use tempfile::TempDir;

use cyberblog::config::Config;
use cyberblog::{build_router, AppState};

struct TestApp {
    server: TestServer,
    state: AppState,
    _uploads: TempDir,
}

fn app_with(configure: impl FnOnce(&mut Config)) -> TestApp {
    let uploads = TempDir::new().unwrap();
    let mut config = Config::default();
    config.seed_demo_data = false;
    config.upload.path = uploads.path().to_path_buf();
    configure(&mut config);

    let state = AppState::new(config);
    let server = TestServer::new(build_router(state.clone())).unwrap();
    TestApp {
        server,
        state,
        _uploads: uploads,
    }
}

fn app() -> TestApp {
    app_with(|_| {})
}

/// Register and return `(token, user id)`
async fn register(app: &TestApp, name: &str, email: &str) -> (String, i64) {
    let response = app
        .server
        .post("/api/auth/register")
        .json(&json!({"name": name, "email": email, "password": "password123"}))
        .await;
    assert_eq!(response.status_code(), StatusCode::CREATED);
    let body = response.json::<Value>();
    (
        body["token"].as_str().unwrap().to_string(),
        body["user"]["id"].as_i64().unwrap(),
    )
}

async fn create_article(app: &TestApp, token: &str, body: Value) -> Value {
    let response = app
        .server
        .post("/api/articles")
        .authorization_bearer(token)
        .json(&body)
        .await;
    assert_eq!(response.status_code(), StatusCode::CREATED);
    response.json::<Value>()
}

async fn create_category(app: &TestApp, token: &str, name: &str) -> i64 {
    let response = app
        .server
        .post("/api/categories")
        .authorization_bearer(token)
        .json(&json!({"name": name}))
        .await;
    assert_eq!(response.status_code(), StatusCode::CREATED);
    response.json::<Value>()["id"].as_i64().unwrap()
}

// ============================================================================
// Auth
// ============================================================================

#[tokio::test]
async fn test_first_user_is_admin_and_second_is_not() {
    let app = app();
    let (admin_token, _) = register(&app, "Admin", "admin@example.com").await;
    let (user_token, _) = register(&app, "Reader", "reader@example.com").await;

    let me = app
        .server
        .get("/api/auth/me")
        .authorization_bearer(&admin_token)
        .await
        .json::<Value>();
    assert_eq!(me["role"], "admin");
    assert!(me.get("passwordHash").is_none());

    let me = app
        .server
        .get("/api/auth/me")
        .authorization_bearer(&user_token)
        .await
        .json::<Value>();
    assert_eq!(me["role"], "user");
}

#[tokio::test]
async fn test_duplicate_registration_rejected_without_mutation() {
    let app = app();
    let (admin_token, _) = register(&app, "Admin", "admin@example.com").await;

    let response = app
        .server
        .post("/api/auth/register")
        .json(&json!({"name": "Again", "email": "ADMIN@example.com", "password": "password123"}))
        .await;
    assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);
    assert_eq!(response.json::<Value>()["error"]["code"], "DUPLICATE");

    let users = app
        .server
        .get("/api/users")
        .authorization_bearer(&admin_token)
        .await
        .json::<Value>();
    assert_eq!(users["pagination"]["total"], 1);
}

#[tokio::test]
async fn test_register_validation_details() {
    let app = app();
    let response = app
        .server
        .post("/api/auth/register")
        .json(&json!({"name": "A", "email": "nope", "password": "short"}))
        .await;
    assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);

    let body = response.json::<Value>();
    assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
    for field in ["name", "email", "password"] {
        assert!(body["error"]["details"][field].is_array(), "{}", field);
    }
}

#[tokio::test]
async fn test_malformed_json_is_a_json_error() {
    let app = app();
    let response = app
        .server
        .post("/api/auth/login")
        .content_type("application/json")
        .bytes("{not json".into())
        .await;
    assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);
    assert_eq!(response.json::<Value>()["error"]["code"], "BAD_REQUEST");
}

#[tokio::test]
async fn test_login_and_rate_limit() {
    let app = app();
    register(&app, "Ada", "ada@example.com").await;

    let ok = app
        .server
        .post("/api/auth/login")
        .json(&json!({"email": "ada@example.com", "password": "password123"}))
        .await;
    assert_eq!(ok.status_code(), StatusCode::OK);
    assert!(ok.json::<Value>()["token"].is_string());

    for _ in 0..5 {
        let bad = app
            .server
            .post("/api/auth/login")
            .json(&json!({"email": "ada@example.com", "password": "wrong-password"}))
            .await;
        assert_eq!(bad.status_code(), StatusCode::UNAUTHORIZED);
        assert_eq!(bad.json::<Value>()["error"]["code"], "INVALID_CREDENTIALS");
    }

    let locked = app
        .server
        .post("/api/auth/login")
        .json(&json!({"email": "ada@example.com", "password": "password123"}))
        .await;
    assert_eq!(locked.status_code(), StatusCode::TOO_MANY_REQUESTS);
}

#[tokio::test]
async fn test_token_errors() {
    let app = app();
    let (token, id) = register(&app, "Ada", "ada@example.com").await;

    let missing = app.server.get("/api/auth/me").await;
    assert_eq!(missing.status_code(), StatusCode::UNAUTHORIZED);
    assert_eq!(missing.json::<Value>()["error"]["code"], "UNAUTHORIZED");

    let mut parts: Vec<String> = token.split('.').map(str::to_string).collect();
    let signature = parts[2].clone();
    let flipped = if signature.starts_with('A') { 'B' } else { 'A' };
    parts[2] = format!("{}{}", flipped, &signature[1..]);
    let tampered = parts.join(".");
    let response = app
        .server
        .get("/api/auth/me")
        .authorization_bearer(&tampered)
        .await;
    assert_eq!(response.status_code(), StatusCode::UNAUTHORIZED);
    assert_eq!(response.json::<Value>()["error"]["code"], "INVALID_TOKEN");

    let user = app.state.user_service.get_by_id(id).await.unwrap();
    let expired = app
        .state
        .user_service
        .tokens()
        .issue_with_ttl(&user, chrono::Duration::seconds(-60))
        .unwrap();
    let response = app
        .server
        .get("/api/auth/me")
        .authorization_bearer(&expired)
        .await;
    assert_eq!(response.status_code(), StatusCode::UNAUTHORIZED);
    assert_eq!(response.json::<Value>()["error"]["code"], "TOKEN_EXPIRED");
}

#[tokio::test]
async fn test_change_password() {
    let app = app();
    let (token, _) = register(&app, "Ada", "ada@example.com").await;

    let wrong = app
        .server
        .put("/api/auth/password")
        .authorization_bearer(&token)
        .json(&json!({"currentPassword": "nope", "newPassword": "new-password-1"}))
        .await;
    assert_eq!(wrong.status_code(), StatusCode::UNAUTHORIZED);

    let ok = app
        .server
        .put("/api/auth/password")
        .authorization_bearer(&token)
        .json(&json!({"currentPassword": "password123", "newPassword": "new-password-1"}))
        .await;
    assert_eq!(ok.status_code(), StatusCode::NO_CONTENT);

    let login = app
        .server
        .post("/api/auth/login")
        .json(&json!({"email": "ada@example.com", "password": "new-password-1"}))
        .await;
    assert_eq!(login.status_code(), StatusCode::OK);
}

// ============================================================================
// Articles
// ============================================================================

#[tokio::test]
async fn test_create_article_requires_token() {
    let app = app();
    let response = app
        .server
        .post("/api/articles")
        .json(&json!({"title": "t", "content": "c"}))
        .await;
    assert_eq!(response.status_code(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_article_visibility_rules() {
    let app = app();
    let (owner, _) = register(&app, "Owner", "owner@example.com").await;
    let (other, _) = register(&app, "Other", "other@example.com").await;

    let private = create_article(
        &app,
        &owner,
        json!({"title": "Private", "content": "secret", "status": "published"}),
    )
    .await;
    let draft = create_article(&app, &owner, json!({"title": "Draft", "content": "wip"})).await;
    create_article(
        &app,
        &owner,
        json!({"title": "Public", "content": "hello", "visibility": "public", "status": "published"}),
    )
    .await;

    let private_url = format!("/api/articles/{}", private["id"]);
    let response = app
        .server
        .get(&private_url)
        .authorization_bearer(&other)
        .await;
    assert_eq!(response.status_code(), StatusCode::FORBIDDEN);
    assert_eq!(app.server.get(&private_url).await.status_code(), StatusCode::FORBIDDEN);

    let draft_url = format!("/api/articles/{}", draft["id"]);
    let response = app.server.get(&draft_url).authorization_bearer(&other).await;
    assert_eq!(response.status_code(), StatusCode::NOT_FOUND);

    let response = app.server.get(&draft_url).authorization_bearer(&owner).await;
    assert_eq!(response.status_code(), StatusCode::OK);

    let anonymous = app.server.get("/api/articles").await.json::<Value>();
    assert_eq!(anonymous["pagination"]["total"], 1);

    let as_owner = app
        .server
        .get("/api/articles")
        .authorization_bearer(&owner)
        .await
        .json::<Value>();
    assert_eq!(as_owner["pagination"]["total"], 3);

    // A bad token on a listing is treated as anonymous
    let response = app
        .server
        .get("/api/articles")
        .authorization_bearer("garbage")
        .await;
    assert_eq!(response.status_code(), StatusCode::OK);
    assert_eq!(response.json::<Value>()["pagination"]["total"], 1);

    let mine = app.server.get("/api/articles?mine=true").await;
    assert_eq!(mine.status_code(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_only_owner_or_admin_edits() {
    let app = app();
    let (admin, _) = register(&app, "Admin", "admin@example.com").await;
    let (owner, _) = register(&app, "Owner", "owner@example.com").await;
    let (other, _) = register(&app, "Other", "other@example.com").await;

    let article = create_article(&app, &owner, json!({"title": "Mine", "content": "c"})).await;
    let url = format!("/api/articles/{}", article["id"]);

    let response = app
        .server
        .put(&url)
        .authorization_bearer(&other)
        .json(&json!({"title": "Hijacked"}))
        .await;
    assert_eq!(response.status_code(), StatusCode::FORBIDDEN);

    let response = app
        .server
        .put(&url)
        .authorization_bearer(&admin)
        .json(&json!({"title": "Edited", "tags": ["XSS", "xss", "csrf"]}))
        .await;
    assert_eq!(response.status_code(), StatusCode::OK);
    let body = response.json::<Value>();
    assert_eq!(body["title"], "Edited");
    assert_eq!(body["tags"], json!(["xss", "csrf"]));

    let response = app.server.delete(&url).authorization_bearer(&other).await;
    assert_eq!(response.status_code(), StatusCode::FORBIDDEN);
    let response = app.server.delete(&url).authorization_bearer(&owner).await;
    assert_eq!(response.status_code(), StatusCode::NO_CONTENT);
    let response = app.server.get(&url).authorization_bearer(&owner).await;
    assert_eq!(response.status_code(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_bad_path_id_is_a_json_error() {
    let app = app();
    let response = app.server.get("/api/articles/abc").await;
    assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);
    assert_eq!(response.json::<Value>()["error"]["code"], "BAD_REQUEST");
}

#[tokio::test]
async fn test_article_pagination_and_sort() {
    let app = app();
    let (token, _) = register(&app, "Ada", "ada@example.com").await;
    for title in ["Bravo", "Alpha", "Charlie", "Delta", "Echo"] {
        create_article(
            &app,
            &token,
            json!({"title": title, "content": "c", "visibility": "public", "status": "published"}),
        )
        .await;
    }

    let page = app
        .server
        .get("/api/articles?sort=title&order=asc&limit=2&page=2")
        .await
        .json::<Value>();
    assert_eq!(page["pagination"], json!({"page": 2, "limit": 2, "total": 5, "pages": 3}));
    let titles: Vec<&str> = page["data"]
        .as_array()
        .unwrap()
        .iter()
        .map(|a| a["title"].as_str().unwrap())
        .collect();
    assert_eq!(titles, ["Charlie", "Delta"]);

    let past_end = app
        .server
        .get("/api/articles?limit=2&page=9")
        .await
        .json::<Value>();
    assert_eq!(past_end["data"], json!([]));
    assert_eq!(past_end["pagination"]["total"], 5);
}

// ============================================================================
// Categories
// ============================================================================

#[tokio::test]
async fn test_category_usage_and_delete_in_use() {
    let app = app();
    let (admin, _) = register(&app, "Admin", "admin@example.com").await;
    let web = create_category(&app, &admin, "Web").await;
    let net = create_category(&app, &admin, "Network").await;

    let article = create_article(
        &app,
        &admin,
        json!({"title": "t", "content": "c", "categoryId": web}),
    )
    .await;

    let response = app
        .server
        .delete(&format!("/api/categories/{}", web))
        .authorization_bearer(&admin)
        .await;
    assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);
    assert_eq!(response.json::<Value>()["error"]["code"], "CATEGORY_IN_USE");
    let still_there = app.server.get(&format!("/api/categories/{}", web)).await;
    assert_eq!(still_there.status_code(), StatusCode::OK);
    assert_eq!(still_there.json::<Value>()["usageCount"], 1);

    // Moving the article shifts the usage count
    app.server
        .put(&format!("/api/articles/{}", article["id"]))
        .authorization_bearer(&admin)
        .json(&json!({"categoryId": net}))
        .await;
    let web_after = app
        .server
        .get(&format!("/api/categories/{}", web))
        .await
        .json::<Value>();
    let net_after = app
        .server
        .get(&format!("/api/categories/{}", net))
        .await
        .json::<Value>();
    assert_eq!(web_after["usageCount"], 0);
    assert_eq!(net_after["usageCount"], 1);

    let response = app
        .server
        .delete(&format!("/api/categories/{}", web))
        .authorization_bearer(&admin)
        .await;
    assert_eq!(response.status_code(), StatusCode::NO_CONTENT);

    let response = app
        .server
        .post("/api/articles")
        .authorization_bearer(&admin)
        .json(&json!({"title": "t", "content": "c", "categoryId": web}))
        .await;
    assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_category_admin_only_and_duplicates() {
    let app = app();
    let (admin, _) = register(&app, "Admin", "admin@example.com").await;
    let (user, _) = register(&app, "User", "user@example.com").await;

    let response = app
        .server
        .post("/api/categories")
        .authorization_bearer(&user)
        .json(&json!({"name": "Web"}))
        .await;
    assert_eq!(response.status_code(), StatusCode::FORBIDDEN);

    create_category(&app, &admin, "Web").await;
    let response = app
        .server
        .post("/api/categories")
        .authorization_bearer(&admin)
        .json(&json!({"name": "web"}))
        .await;
    assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);
    assert_eq!(response.json::<Value>()["error"]["code"], "DUPLICATE");

    let response = app
        .server
        .post("/api/categories")
        .authorization_bearer(&admin)
        .json(&json!({"name": "Crypto", "color": "blue"}))
        .await;
    assert_eq!(response.json::<Value>()["error"]["code"], "VALIDATION_ERROR");

    let list = app.server.get("/api/categories").await.json::<Value>();
    assert_eq!(list.as_array().unwrap().len(), 1);
}

// ============================================================================
// Users
// ============================================================================

#[tokio::test]
async fn test_user_profile_rules() {
    let app = app();
    let (admin, admin_id) = register(&app, "Admin", "admin@example.com").await;
    let (user, user_id) = register(&app, "User", "user@example.com").await;

    let response = app
        .server
        .get(&format!("/api/users/{}", admin_id))
        .authorization_bearer(&user)
        .await;
    assert_eq!(response.status_code(), StatusCode::FORBIDDEN);

    let response = app
        .server
        .put(&format!("/api/users/{}", user_id))
        .authorization_bearer(&user)
        .json(&json!({"role": "admin"}))
        .await;
    assert_eq!(response.status_code(), StatusCode::FORBIDDEN);

    let response = app
        .server
        .put(&format!("/api/users/{}", user_id))
        .authorization_bearer(&user)
        .json(&json!({"bio": "Red teamer"}))
        .await;
    assert_eq!(response.status_code(), StatusCode::OK);
    assert_eq!(response.json::<Value>()["bio"], "Red teamer");

    let response = app.server.get("/api/users").authorization_bearer(&user).await;
    assert_eq!(response.status_code(), StatusCode::FORBIDDEN);

    let response = app
        .server
        .delete(&format!("/api/users/{}", admin_id))
        .authorization_bearer(&admin)
        .await;
    assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);

    let response = app
        .server
        .delete(&format!("/api/users/{}", user_id))
        .authorization_bearer(&admin)
        .await;
    assert_eq!(response.status_code(), StatusCode::NO_CONTENT);

    // The deleted account's token no longer works
    let response = app.server.get("/api/auth/me").authorization_bearer(&user).await;
    assert_eq!(response.status_code(), StatusCode::UNAUTHORIZED);
}

// ============================================================================
// Public
// ============================================================================

#[tokio::test]
async fn test_comments_hidden_until_approved() {
    let app = app();
    let (admin, _) = register(&app, "Admin", "admin@example.com").await;
    let article = create_article(
        &app,
        &admin,
        json!({"title": "Post", "content": "c", "visibility": "public", "status": "published"}),
    )
    .await;
    let comments_url = format!("/api/public/articles/{}/comments", article["id"]);

    let response = app
        .server
        .post(&comments_url)
        .json(&json!({"authorName": "Visitor", "authorEmail": "v@example.com", "content": "Nice"}))
        .await;
    assert_eq!(response.status_code(), StatusCode::CREATED);
    let comment = response.json::<Value>();
    assert_eq!(comment["status"], "pending");
    assert!(comment.get("authorEmail").is_none());

    let visible = app.server.get(&comments_url).await.json::<Value>();
    assert_eq!(visible, json!([]));

    let response = app
        .server
        .patch(&format!("/api/public/admin/comments/{}", comment["id"]))
        .authorization_bearer(&admin)
        .json(&json!({"status": "approved"}))
        .await;
    assert_eq!(response.status_code(), StatusCode::OK);

    let visible = app.server.get(&comments_url).await.json::<Value>();
    assert_eq!(visible.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_like_toggle_is_idempotent_per_visitor() {
    let app = app();
    let (admin, _) = register(&app, "Admin", "admin@example.com").await;
    let article = create_article(
        &app,
        &admin,
        json!({"title": "Post", "content": "c", "visibility": "public", "status": "published"}),
    )
    .await;
    let likes_url = format!("/api/public/articles/{}/likes", article["id"]);

    let liked = app
        .server
        .post(&likes_url)
        .json(&json!({"visitorId": "visitor-1"}))
        .await
        .json::<Value>();
    assert_eq!(liked, json!({"count": 1, "liked": true}));

    let check = app
        .server
        .get(&format!("{}?visitorId=visitor-1", likes_url))
        .await
        .json::<Value>();
    assert_eq!(check["liked"], true);

    let unliked = app
        .server
        .post(&likes_url)
        .json(&json!({"visitorId": "visitor-1"}))
        .await
        .json::<Value>();
    assert_eq!(unliked, json!({"count": 0, "liked": false}));
}

#[tokio::test]
async fn test_whitespace_only_text_rejected() {
    let app = app();
    let response = app
        .server
        .post("/api/auth/register")
        .json(&json!({"name": "   ", "email": "blank@example.com", "password": "password123"}))
        .await;
    assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);
    assert!(response.json::<Value>()["error"]["details"]["name"].is_array());

    let (admin, _) = register(&app, "Admin", "admin@example.com").await;
    let response = app
        .server
        .post("/api/articles")
        .authorization_bearer(&admin)
        .json(&json!({"title": "   ", "content": "c"}))
        .await;
    assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);
    assert_eq!(response.json::<Value>()["error"]["code"], "VALIDATION_ERROR");

    let article = create_article(
        &app,
        &admin,
        json!({"title": "Post", "content": "c", "visibility": "public", "status": "published"}),
    )
    .await;
    let likes_url = format!("/api/public/articles/{}/likes", article["id"]);
    let response = app
        .server
        .post(&likes_url)
        .json(&json!({"visitorId": "   "}))
        .await;
    assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);

    let likes = app.server.get(&likes_url).await.json::<Value>();
    assert_eq!(likes["count"], 0);
}

#[tokio::test]
async fn test_public_article_counts_views_and_hides_private() {
    let app = app();
    let (admin, _) = register(&app, "Admin", "admin@example.com").await;
    let public = create_article(
        &app,
        &admin,
        json!({"title": "Post", "content": "c", "visibility": "public", "status": "published"}),
    )
    .await;
    let private = create_article(&app, &admin, json!({"title": "Hidden", "content": "c"})).await;

    let url = format!("/api/public/articles/{}", public["id"]);
    app.server.get(&url).await;
    let second = app.server.get(&url).await.json::<Value>();
    assert_eq!(second["views"], 2);

    let response = app
        .server
        .get(&format!("/api/public/articles/{}", private["id"]))
        .await;
    assert_eq!(response.status_code(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_contact_and_inbox() {
    let app = app();
    let (admin, _) = register(&app, "Admin", "admin@example.com").await;

    let response = app
        .server
        .post("/api/public/contact")
        .json(&json!({"name": "Eve", "email": "eve@example.com", "message": "Found a bug"}))
        .await;
    assert_eq!(response.status_code(), StatusCode::CREATED);
    let message = response.json::<Value>();
    assert_eq!(message["status"], "unread");

    let response = app.server.get("/api/public/admin/messages").await;
    assert_eq!(response.status_code(), StatusCode::UNAUTHORIZED);

    let response = app
        .server
        .patch(&format!("/api/public/admin/messages/{}/read", message["id"]))
        .authorization_bearer(&admin)
        .await;
    assert_eq!(response.json::<Value>()["status"], "read");

    let stats = app
        .server
        .get("/api/public/admin/stats")
        .authorization_bearer(&admin)
        .await
        .json::<Value>();
    assert_eq!(stats["messages"], 1);
    assert_eq!(stats["unreadMessages"], 0);
    assert_eq!(stats["users"], 1);
}

#[tokio::test]
async fn test_admin_key_verification() {
    let app = app_with(|c| c.auth.admin_key = Some("letmein".to_string()));
    let ok = app
        .server
        .post("/api/public/admin/verify")
        .json(&json!({"key": "letmein"}))
        .await
        .json::<Value>();
    assert_eq!(ok["valid"], true);

    let bad = app
        .server
        .post("/api/public/admin/verify")
        .json(&json!({"key": "guess"}))
        .await
        .json::<Value>();
    assert_eq!(bad["valid"], false);

    let same_length = app
        .server
        .post("/api/public/admin/verify")
        .json(&json!({"key": "letmeiN"}))
        .await
        .json::<Value>();
    assert_eq!(same_length["valid"], false);

    let unset = app_with(|_| {});
    let response = unset
        .server
        .post("/api/public/admin/verify")
        .json(&json!({"key": ""}))
        .await
        .json::<Value>();
    assert_eq!(response["valid"], false);
}

// ============================================================================
// Uploads
// ============================================================================

#[tokio::test]
async fn test_upload_partial_failure_and_delete() {
    let app = app_with(|c| c.upload.max_file_size = 32);
    let (token, _) = register(&app, "Ada", "ada@example.com").await;

    let form = MultipartForm::new()
        .add_part(
            "files",
            Part::bytes(b"hello".to_vec())
                .file_name("note.txt")
                .mime_type("text/plain"),
        )
        .add_part(
            "files",
            Part::bytes(b"MZ".to_vec())
                .file_name("tool.exe")
                .mime_type("application/x-msdownload"),
        );
    let response = app
        .server
        .post("/api/uploads")
        .authorization_bearer(&token)
        .multipart(form)
        .await;
    assert_eq!(response.status_code(), StatusCode::CREATED);
    let body = response.json::<Value>();
    assert_eq!(body["files"].as_array().unwrap().len(), 1);
    assert_eq!(body["failed"].as_array().unwrap().len(), 1);

    let document = &body["files"][0];
    let stored = app
        .server
        .get(document["url"].as_str().unwrap())
        .await;
    assert_eq!(stored.status_code(), StatusCode::OK);
    assert_eq!(stored.as_bytes().as_ref(), b"hello");

    let response = app
        .server
        .delete(&format!("/api/uploads/{}", document["id"]))
        .authorization_bearer(&token)
        .await;
    assert_eq!(response.status_code(), StatusCode::NO_CONTENT);

    let list = app
        .server
        .get("/api/uploads")
        .authorization_bearer(&token)
        .await
        .json::<Value>();
    assert_eq!(list["pagination"]["total"], 0);
}

#[tokio::test]
async fn test_upload_too_large_and_missing() {
    let app = app_with(|c| c.upload.max_file_size = 8);
    let (token, _) = register(&app, "Ada", "ada@example.com").await;

    let form = MultipartForm::new().add_part(
        "file",
        Part::bytes(vec![b'a'; 64])
            .file_name("big.txt")
            .mime_type("text/plain"),
    );
    let response = app
        .server
        .post("/api/uploads")
        .authorization_bearer(&token)
        .multipart(form)
        .await;
    assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);
    assert_eq!(response.json::<Value>()["error"]["code"], "FILE_TOO_LARGE");

    let form = MultipartForm::new().add_text("note", "no file here");
    let response = app
        .server
        .post("/api/uploads")
        .authorization_bearer(&token)
        .multipart(form)
        .await;
    assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);

    let response = app.server.post("/api/uploads").await;
    assert_eq!(response.status_code(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_health_and_unknown_route() {
    let app = app();
    let health = app.server.get("/api/health").await;
    assert_eq!(health.status_code(), StatusCode::OK);
    assert_eq!(health.json::<Value>()["status"], "ok");

    let missing = app.server.get("/api/nope").await;
    assert_eq!(missing.status_code(), StatusCode::NOT_FOUND);
    assert_eq!(missing.json::<Value>()["error"]["code"], "NOT_FOUND");
}
