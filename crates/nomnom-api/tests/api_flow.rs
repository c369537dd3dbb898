use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode, header},
};
use http_body_util::BodyExt;
use serde_json::{Value, json};
use tempfile::TempDir;
use tower::ServiceExt;

use nomnom_api::photos::{PLACEHOLDER_IMAGE, PhotoSearch};
use nomnom_api::storage::{ImageStore, MAX_IMAGE_SIZE};
use nomnom_api::swipes::seed_catalog;
use nomnom_api::{AppState, AppStateInner, router};
use nomnom_db::Database;
use nomnom_types::api::CatalogEntry;

const SECRET: &str = "integration-test-secret";
const BOUNDARY: &str = "nomnom-test-boundary";
const PNG: &[u8] = b"\x89PNG\r\n\x1a\nfake-image-bytes";

struct TestApp {
    router: Router,
    state: AppState,
    _dir: TempDir,
}

struct Part<'a> {
    name: &'a str,
    content_type: Option<&'a str>,
    data: &'a [u8],
}

fn text(name: &'static str, value: &'static str) -> Part<'static> {
    Part {
        name,
        content_type: None,
        data: value.as_bytes(),
    }
}

fn file<'a>(name: &'a str, content_type: &'a str, data: &'a [u8]) -> Part<'a> {
    Part {
        name,
        content_type: Some(content_type),
        data,
    }
}

fn multipart_body(parts: &[Part<'_>]) -> Vec<u8> {
    let mut body = Vec::new();
    for part in parts {
        body.extend_from_slice(format!("--{BOUNDARY}\r\n").as_bytes());
        match part.content_type {
            Some(ct) => body.extend_from_slice(
                format!(
                    "Content-Disposition: form-data; name=\"{}\"; filename=\"upload\"\r\nContent-Type: {}\r\n\r\n",
                    part.name, ct
                )
                .as_bytes(),
            ),
            None => body.extend_from_slice(
                format!("Content-Disposition: form-data; name=\"{}\"\r\n\r\n", part.name)
                    .as_bytes(),
            ),
        }
        body.extend_from_slice(part.data);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());
    body
}

impl TestApp {
    async fn new() -> Self {
        let dir = TempDir::new().unwrap();
        let db = Arc::new(Database::open(&dir.path().join("test.db")).unwrap());
        let images = ImageStore::new(dir.path().join("uploads")).await.unwrap();
        let state: AppState = Arc::new(AppStateInner {
            db,
            jwt_secret: SECRET.to_string(),
            token_ttl: chrono::Duration::hours(1),
            images,
            photos: PhotoSearch::disabled(),
            public_url: None,
        });
        Self {
            router: router(state.clone()),
            state,
            _dir: dir,
        }
    }

    async fn send(&self, req: Request<Body>) -> (StatusCode, Value) {
        let response = self.router.clone().oneshot(req).await.unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, body)
    }

    async fn call(
        &self,
        method: &str,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut req = Request::builder()
            .method(method)
            .uri(uri)
            .header(header::HOST, "localhost:3000");
        if let Some(token) = token {
            req = req.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }
        let req = match body {
            Some(body) => req
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string())),
            None => req.body(Body::empty()),
        }
        .unwrap();
        self.send(req).await
    }

    async fn upload(&self, uri: &str, token: &str, parts: &[Part<'_>]) -> (StatusCode, Value) {
        let req = Request::builder()
            .method("POST")
            .uri(uri)
            .header(header::HOST, "localhost:3000")
            .header(header::AUTHORIZATION, format!("Bearer {token}"))
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={BOUNDARY}"),
            )
            .body(Body::from(multipart_body(parts)))
            .unwrap();
        self.send(req).await
    }

    async fn register(&self, username: &str, email: &str, password: &str) -> StatusCode {
        let (status, _) = self
            .call(
                "POST",
                "/register",
                None,
                Some(json!({ "username": username, "email": email, "password": password })),
            )
            .await;
        status
    }

    async fn login(&self, email: &str, password: &str) -> (StatusCode, Value) {
        self.call(
            "POST",
            "/login",
            None,
            Some(json!({ "email": email, "password": password })),
        )
        .await
    }

    async fn signed_in(&self, username: &str) -> String {
        let email = format!("{username}@x.com");
        assert_eq!(self.register(username, &email, "pw1").await, StatusCode::CREATED);
        let (status, body) = self.login(&email, "pw1").await;
        assert_eq!(status, StatusCode::OK);
        body["token"].as_str().unwrap().to_string()
    }

    /// Whether the upload behind an absolute image URL is still on disk.
    fn image_on_disk(&self, url: &str) -> bool {
        let (_, name) = url.rsplit_once("/uploads/").unwrap();
        self.state.images.dir().join(name).exists()
    }

    async fn post(&self, token: &str, caption: &'static str) -> String {
        let (status, body) = self
            .upload(
                "/posts",
                token,
                &[file("image", "image/png", PNG), text("caption", caption)],
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "{body}");
        body["id"].as_str().unwrap().to_string()
    }
}

#[tokio::test]
async fn registering_same_username_twice_conflicts() {
    let app = TestApp::new().await;
    assert_eq!(app.register("alice", "a@x.com", "pw1").await, StatusCode::CREATED);
    assert_eq!(app.register("alice", "b@x.com", "pw2").await, StatusCode::CONFLICT);
    assert_eq!(app.register("alicia", "A@x.com", "pw2").await, StatusCode::CONFLICT);
    assert_eq!(app.register("al", "c@x.com", "pw").await, StatusCode::BAD_REQUEST);
    assert_eq!(app.register("carol", "no-at-sign", "pw").await, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn username_length_counts_characters() {
    let app = TestApp::new().await;
    let eleven = "食".repeat(11);
    assert_eq!(app.register(&eleven, "chef@x.com", "pw1").await, StatusCode::CREATED);

    let thirty_three = "食".repeat(33);
    assert_eq!(
        app.register(&thirty_three, "chef2@x.com", "pw1").await,
        StatusCode::BAD_REQUEST
    );
}

#[tokio::test]
async fn unknown_email_costs_as_much_as_a_wrong_password() {
    let app = TestApp::new().await;
    app.register("alice", "a@x.com", "pw1").await;

    async fn timed(app: &TestApp, email: &str) -> Duration {
        let start = Instant::now();
        for _ in 0..3 {
            let (status, _) = app.login(email, "wrong").await;
            assert_eq!(status, StatusCode::UNAUTHORIZED);
        }
        start.elapsed()
    }

    let known = timed(&app, "a@x.com").await;
    let unknown = timed(&app, "ghost@x.com").await;
    // Both paths run one Argon2 verify; allow wide scheduling noise.
    assert!(
        unknown * 4 >= known,
        "unknown email {unknown:?} vs wrong password {known:?}"
    );
}

#[tokio::test]
async fn login_failures_do_not_reveal_which_part_was_wrong() {
    let app = TestApp::new().await;
    app.register("alice", "a@x.com", "pw1").await;

    let (wrong_pw, wrong_pw_body) = app.login("a@x.com", "nope").await;
    let (no_user, no_user_body) = app.login("ghost@x.com", "pw1").await;
    assert_eq!(wrong_pw, StatusCode::UNAUTHORIZED);
    assert_eq!(no_user, StatusCode::UNAUTHORIZED);
    assert_eq!(wrong_pw_body, no_user_body);

    let (status, body) = app.login("a@x.com", "pw1").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["user"]["username"], "alice");
    assert_eq!(body["user"]["email"], "a@x.com");
    assert!(body["user"].get("passwordHash").is_none());
    assert!(body["user"].get("password_hash").is_none());
}

#[tokio::test]
async fn protected_routes_reject_missing_or_bad_tokens() {
    let app = TestApp::new().await;

    let (status, body) = app.call("GET", "/profile", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert!(body["error"].is_string());

    let (status, _) = app.call("GET", "/profile", Some("not.a.jwt"), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let req = Request::builder()
        .uri("/myPosts")
        .header(header::AUTHORIZATION, "Basic YWxpY2U6cHcx")
        .body(Body::empty())
        .unwrap();
    let (status, _) = app.send(req).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn end_to_end_post_like_delete() {
    let app = TestApp::new().await;
    assert_eq!(app.register("alice", "a@x.com", "pw1").await, StatusCode::CREATED);
    let (_, login) = app.login("a@x.com", "pw1").await;
    let token = login["token"].as_str().unwrap().to_string();

    let post_id = app.post(&token, "Pasta").await;

    let (status, posts) = app.call("GET", "/posts", None, None).await;
    assert_eq!(status, StatusCode::OK);
    let posts = posts.as_array().unwrap();
    assert_eq!(posts.len(), 1);
    assert_eq!(posts[0]["caption"], "Pasta");
    assert_eq!(posts[0]["likeCount"], 0);
    assert_eq!(posts[0]["username"], "alice");
    assert!(
        posts[0]["image"]
            .as_str()
            .unwrap()
            .starts_with("http://localhost:3000/uploads/")
    );
    let image = posts[0]["image"].as_str().unwrap().to_string();
    assert!(app.image_on_disk(&image));

    let like = json!({ "postId": post_id });
    let (status, _) = app.call("POST", "/like", Some(&token), Some(like.clone())).await;
    assert_eq!(status, StatusCode::OK);
    let (_, posts) = app.call("GET", "/posts", None, None).await;
    assert_eq!(posts[0]["likeCount"], 1);

    // Liking again is a no-op.
    let (status, _) = app.call("POST", "/like", Some(&token), Some(like)).await;
    assert_eq!(status, StatusCode::OK);
    let (_, posts) = app.call("GET", "/posts", None, None).await;
    assert_eq!(posts[0]["likeCount"], 1);

    let (status, _) = app
        .call("DELETE", &format!("/posts/{post_id}"), Some(&token), None)
        .await;
    assert_eq!(status, StatusCode::OK);

    let (_, posts) = app.call("GET", "/posts", None, None).await;
    assert!(posts.as_array().unwrap().is_empty());
    assert!(!app.image_on_disk(&image));
}

#[tokio::test]
async fn only_the_owner_can_delete_a_post() {
    let app = TestApp::new().await;
    let alice = app.signed_in("alice").await;
    let bob = app.signed_in("bob").await;
    let post_id = app.post(&alice, "Pasta").await;

    let (status, _) = app
        .call("DELETE", &format!("/posts/{post_id}"), Some(&bob), None)
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    let (_, posts) = app.call("GET", "/posts", None, None).await;
    assert_eq!(posts.as_array().unwrap().len(), 1);

    let missing = uuid::Uuid::new_v4();
    let (status, _) = app
        .call("DELETE", &format!("/posts/{missing}"), Some(&bob), None)
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = app.call("DELETE", "/posts/42", Some(&bob), None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn my_posts_is_scoped_to_caller() {
    let app = TestApp::new().await;
    let alice = app.signed_in("alice").await;
    let bob = app.signed_in("bob").await;
    app.post(&alice, "Pasta").await;
    app.post(&bob, "Bread").await;

    let (status, mine) = app.call("GET", "/myPosts", Some(&bob), None).await;
    assert_eq!(status, StatusCode::OK);
    let mine = mine.as_array().unwrap();
    assert_eq!(mine.len(), 1);
    assert_eq!(mine[0]["caption"], "Bread");
}

#[tokio::test]
async fn post_upload_is_validated() {
    let app = TestApp::new().await;
    let alice = app.signed_in("alice").await;

    let (status, _) = app
        .upload("/posts", &alice, &[file("image", "image/png", PNG)])
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = app.upload("/posts", &alice, &[text("caption", "Pasta")]).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = app
        .upload(
            "/posts",
            &alice,
            &[file("image", "text/plain", b"hello"), text("caption", "Pasta")],
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("content type"));

    let oversized = vec![0u8; MAX_IMAGE_SIZE + 1];
    let (status, body) = app
        .upload(
            "/posts",
            &alice,
            &[file("image", "image/png", &oversized), text("caption", "Pasta")],
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("too large"));

    let (_, posts) = app.call("GET", "/posts", None, None).await;
    assert!(posts.as_array().unwrap().is_empty());
}

#[tokio::test]
async fn unlike_and_my_likes() {
    let app = TestApp::new().await;
    let alice = app.signed_in("alice").await;
    let bob = app.signed_in("bob").await;
    let post_id = app.post(&alice, "Pasta").await;
    let like = json!({ "postId": post_id });

    // Unliking a post that is not liked is not an error.
    let (status, _) = app.call("DELETE", "/unlike", Some(&bob), Some(like.clone())).await;
    assert_eq!(status, StatusCode::OK);

    app.call("POST", "/like", Some(&bob), Some(like.clone())).await;
    let (status, liked) = app.call("GET", "/myLikes", Some(&bob), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(liked, json!([post_id]));

    let (status, _) = app.call("DELETE", "/unlike", Some(&bob), Some(like)).await;
    assert_eq!(status, StatusCode::OK);
    let (_, liked) = app.call("GET", "/myLikes", Some(&bob), None).await;
    assert_eq!(liked, json!([]));

    let ghost = json!({ "postId": uuid::Uuid::new_v4() });
    let (status, _) = app.call("POST", "/like", Some(&bob), Some(ghost)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn comments_are_public_and_ordered() {
    let app = TestApp::new().await;
    let alice = app.signed_in("alice").await;
    let bob = app.signed_in("bob").await;
    let post_id = app.post(&alice, "Pasta").await;

    for (token, content) in [
        (bob.as_str(), "first"),
        (alice.as_str(), "second"),
        (bob.as_str(), "third"),
    ] {
        let (status, _) = app
            .call(
                "POST",
                "/comment",
                Some(token),
                Some(json!({ "postId": post_id, "content": content })),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED);
    }

    let (status, _) = app
        .call(
            "POST",
            "/comment",
            Some(&bob),
            Some(json!({ "postId": post_id, "content": "   " })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = app
        .call(
            "POST",
            "/comment",
            Some(&bob),
            Some(json!({ "postId": uuid::Uuid::new_v4(), "content": "hi" })),
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, comments) = app
        .call("GET", &format!("/comments/{post_id}"), None, None)
        .await;
    assert_eq!(status, StatusCode::OK);
    let comments = comments.as_array().unwrap();
    let texts: Vec<_> = comments.iter().map(|c| c["content"].as_str().unwrap()).collect();
    assert_eq!(texts, ["first", "second", "third"]);
    let times: Vec<_> = comments
        .iter()
        .map(|c| c["createdAt"].as_str().unwrap().to_string())
        .collect();
    assert!(times.windows(2).all(|w| w[0] <= w[1]));
    assert_eq!(comments[0]["username"], "bob");

    let (_, posts) = app.call("GET", "/posts", None, None).await;
    assert_eq!(posts[0]["commentCount"], 3);

    // Only the author can remove a comment.
    let first_id = comments[0]["id"].as_str().unwrap();
    let (status, _) = app
        .call("DELETE", &format!("/comments/{first_id}"), Some(&alice), None)
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let (status, _) = app
        .call("DELETE", &format!("/comments/{first_id}"), Some(&bob), None)
        .await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn saved_recipes_are_owner_scoped() {
    let app = TestApp::new().await;
    let alice = app.signed_in("alice").await;
    let bob = app.signed_in("bob").await;

    let (status, _) = app
        .call(
            "POST",
            "/saveRecipe",
            Some(&alice),
            Some(json!({ "title": "Stew", "content": "beef, carrots, simmer" })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, _) = app
        .call("POST", "/saveRecipe", Some(&alice), Some(json!({ "title": "Empty" })))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (_, saved) = app.call("GET", "/savedRecipes", Some(&alice), None).await;
    let saved = saved.as_array().unwrap();
    assert_eq!(saved.len(), 1);
    assert_eq!(saved[0]["title"], "Stew");
    let recipe_id = saved[0]["id"].as_str().unwrap().to_string();

    let (_, theirs) = app.call("GET", "/savedRecipes", Some(&bob), None).await;
    assert!(theirs.as_array().unwrap().is_empty());

    let (status, body) = app
        .call("DELETE", &format!("/savedRecipes/{recipe_id}"), Some(&bob), None)
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(body["error"].is_string());
    let (_, saved) = app.call("GET", "/savedRecipes", Some(&alice), None).await;
    assert_eq!(saved.as_array().unwrap().len(), 1);

    let (status, _) = app
        .call("DELETE", &format!("/savedRecipes/{recipe_id}"), Some(&alice), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    let (_, saved) = app.call("GET", "/savedRecipes", Some(&alice), None).await;
    assert!(saved.as_array().unwrap().is_empty());
}

#[tokio::test]
async fn profile_counts_and_password_change() {
    let app = TestApp::new().await;
    let alice = app.signed_in("alice").await;
    let bob = app.signed_in("bob").await;
    let post_id = app.post(&alice, "Pasta").await;
    app.call("POST", "/like", Some(&bob), Some(json!({ "postId": post_id })))
        .await;
    app.call(
        "POST",
        "/comment",
        Some(&bob),
        Some(json!({ "postId": post_id, "content": "yum" })),
    )
    .await;

    let (status, profile) = app.call("GET", "/profile", Some(&alice), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(profile["username"], "alice");
    assert_eq!(profile["postCount"], 1);
    assert_eq!(profile["totalLikes"], 1);
    assert_eq!(profile["totalComments"], 1);
    assert!(profile["profilePicture"].is_null());

    let (status, _) = app
        .call(
            "PUT",
            "/changePassword",
            Some(&alice),
            Some(json!({ "oldPassword": "wrong", "newPassword": "pw2" })),
        )
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = app
        .call(
            "PUT",
            "/changePassword",
            Some(&alice),
            Some(json!({ "oldPassword": "pw1", "newPassword": "pw2" })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = app.login("alice@x.com", "pw1").await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    let (status, _) = app.login("alice@x.com", "pw2").await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn profile_picture_is_stored_and_served() {
    let app = TestApp::new().await;
    let alice = app.signed_in("alice").await;

    let (status, body) = app
        .upload(
            "/updateProfilePicture",
            &alice,
            &[file("image", "image/png", PNG)],
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    let url = body["image"].as_str().unwrap().to_string();
    let path = url.strip_prefix("http://localhost:3000").unwrap();
    assert!(path.starts_with("/uploads/"));

    let (_, profile) = app.call("GET", "/profile", Some(&alice), None).await;
    assert_eq!(profile["profilePicture"], url.as_str());

    let response = app
        .router
        .clone()
        .oneshot(Request::builder().uri(path).body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let served = response.into_body().collect().await.unwrap().to_bytes();
    assert_eq!(&served[..], PNG);

    // Replacing the picture removes the old file.
    let (status, _) = app
        .upload(
            "/updateProfilePicture",
            &alice,
            &[file("image", "image/jpeg", b"jpeg-bytes")],
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    let old_name = path.trim_start_matches("/uploads/");
    assert!(!app.state.images.dir().join(old_name).exists());
}

#[tokio::test]
async fn deleting_account_removes_everything_owned() {
    let app = TestApp::new().await;
    let alice = app.signed_in("alice").await;
    let bob = app.signed_in("bob").await;
    let alices_post = app.post(&alice, "Pasta").await;
    let bobs_post = app.post(&bob, "Bread").await;
    app.call("POST", "/like", Some(&alice), Some(json!({ "postId": bobs_post })))
        .await;
    app.call("POST", "/like", Some(&bob), Some(json!({ "postId": alices_post })))
        .await;
    let (_, picture) = app
        .upload(
            "/updateProfilePicture",
            &alice,
            &[file("image", "image/png", PNG)],
        )
        .await;
    let picture = picture["image"].as_str().unwrap().to_string();

    let (_, posts) = app.call("GET", "/posts", None, None).await;
    let images: Vec<String> = posts
        .as_array()
        .unwrap()
        .iter()
        .map(|p| p["image"].as_str().unwrap().to_string())
        .collect();
    let (alices_image, bobs_image) = if posts[0]["caption"] == "Pasta" {
        (&images[0], &images[1])
    } else {
        (&images[1], &images[0])
    };
    assert!(app.image_on_disk(alices_image));
    assert!(app.image_on_disk(&picture));

    let (status, _) = app.call("DELETE", "/deleteAccount", Some(&alice), None).await;
    assert_eq!(status, StatusCode::OK);

    assert!(!app.image_on_disk(alices_image));
    assert!(!app.image_on_disk(&picture));
    assert!(app.image_on_disk(bobs_image));

    let (status, _) = app.login("alice@x.com", "pw1").await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (_, posts) = app.call("GET", "/posts", None, None).await;
    let posts = posts.as_array().unwrap();
    assert_eq!(posts.len(), 1);
    assert_eq!(posts[0]["caption"], "Bread");
    assert_eq!(posts[0]["likeCount"], 0);

    let (_, liked) = app.call("GET", "/myLikes", Some(&bob), None).await;
    assert_eq!(liked, json!([]));

    // The old token still verifies, but the account is gone.
    let (status, _) = app.call("GET", "/profile", Some(&alice), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn writes_with_a_deleted_account_token_are_unauthorized() {
    let app = TestApp::new().await;
    let alice = app.signed_in("alice").await;
    let bob = app.signed_in("bob").await;
    let bobs_post = app.post(&bob, "Bread").await;
    let db = app.state.db.clone();
    seed_catalog(
        &db,
        &[CatalogEntry {
            name: "Ramen".into(),
            details: "noodles".into(),
            image: None,
        }],
    )
    .unwrap();
    let (_, recipes) = app.call("GET", "/recipes", None, None).await;
    let ramen = recipes[0]["id"].as_str().unwrap().to_string();

    app.call("DELETE", "/deleteAccount", Some(&alice), None).await;

    let writes = [
        ("/like", json!({ "postId": bobs_post })),
        ("/comment", json!({ "postId": bobs_post, "content": "hi" })),
        ("/swipe", json!({ "recipeId": ramen, "liked": true })),
        ("/saveRecipe", json!({ "title": "Stew", "content": "beef" })),
    ];
    for (uri, body) in writes {
        let (status, body) = app.call("POST", uri, Some(&alice), Some(body)).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED, "{uri}");
        assert_eq!(body["error"], "Account no longer exists");
    }
    let (status, _) = app
        .upload(
            "/posts",
            &alice,
            &[file("image", "image/png", PNG), text("caption", "x")],
        )
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    // A live caller still gets 404 for a missing target.
    let ghost = json!({ "postId": uuid::Uuid::new_v4() });
    let (status, _) = app.call("POST", "/like", Some(&bob), Some(ghost)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn swipes_feed_liked_dishes() {
    let app = TestApp::new().await;
    let alice = app.signed_in("alice").await;

    let entries = vec![
        CatalogEntry {
            name: "Ramen".into(),
            details: "noodles and broth".into(),
            image: None,
        },
        CatalogEntry {
            name: "Salad".into(),
            details: "greens".into(),
            image: Some("https://cdn.example.com/salad.jpg".into()),
        },
    ];
    let db = app.state.db.clone();
    assert_eq!(seed_catalog(&db, &entries).unwrap(), 2);
    assert_eq!(seed_catalog(&db, &entries).unwrap(), 0);

    let (status, recipes) = app.call("GET", "/recipes", None, None).await;
    assert_eq!(status, StatusCode::OK);
    let recipes = recipes.as_array().unwrap().clone();
    assert_eq!(recipes.len(), 2);
    assert_eq!(recipes[1]["image"], "https://cdn.example.com/salad.jpg");
    let ramen = recipes[0]["id"].as_str().unwrap().to_string();
    let salad = recipes[1]["id"].as_str().unwrap().to_string();

    let (status, one) = app.call("GET", &format!("/recipes/{ramen}"), None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(one["name"], "Ramen");

    for (recipe, liked) in [(&ramen, true), (&ramen, true), (&salad, false)] {
        let (status, _) = app
            .call(
                "POST",
                "/swipe",
                Some(&alice),
                Some(json!({ "recipeId": recipe, "liked": liked })),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED);
    }

    let (status, _) = app
        .call(
            "POST",
            "/swipe",
            Some(&alice),
            Some(json!({ "recipeId": uuid::Uuid::new_v4(), "liked": true })),
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (_, count) = app.call("GET", "/swipeCount", Some(&alice), None).await;
    assert_eq!(count["count"], 3);
    assert_eq!(count["date"], nomnom_db::today());

    let (_, liked) = app.call("GET", "/likedDishes", Some(&alice), None).await;
    let liked = liked.as_array().unwrap();
    assert_eq!(liked.len(), 1);
    assert_eq!(liked[0]["name"], "Ramen");
}

#[tokio::test]
async fn recipe_image_degrades_to_placeholder() {
    let app = TestApp::new().await;
    let alice = app.signed_in("alice").await;

    let (status, body) = app
        .call("GET", "/recipeImage?query=Pasta%20Carbonara", Some(&alice), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["image"], PLACEHOLDER_IMAGE);

    let (status, _) = app
        .call("GET", "/recipeImage?query=", Some(&alice), None)
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn malformed_input_and_unknown_routes_get_json_errors() {
    let app = TestApp::new().await;

    let req = Request::builder()
        .method("POST")
        .uri("/register")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{not json"))
        .unwrap();
    let (status, body) = app.send(req).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].is_string());

    let (status, body) = app.call("GET", "/nope", None, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "Route not found");
}
