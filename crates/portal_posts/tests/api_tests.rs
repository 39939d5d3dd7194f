use axum::body::Body;
use axum::http::{header, Method, Request, StatusCode};
use axum::Router;
use chrono::{Duration, Utc};
use portal_common::models::{NewPost, PostCategory, Role};
use portal_common::{Authenticator, StaticTokenVerifier};
use portal_db::{InMemoryPostRepository, PostRepository};
use portal_posts::{routes, PostsState};
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt;

const ADMIN: &str = "admin-token";
const USER: &str = "user-token";

fn app() -> (Router, Arc<InMemoryPostRepository>) {
    let posts = Arc::new(InMemoryPostRepository::new());
    let state = PostsState {
        posts: posts.clone(),
        auth: Authenticator::new(Arc::new(
            StaticTokenVerifier::new()
                .with_user(ADMIN, "jefa", Role::Admin)
                .with_user(USER, "tecnico", Role::User),
        )),
    };
    (routes(state), posts)
}

async fn send(
    router: &Router,
    method: Method,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }
    let request = match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };
    let response = router.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, serde_json::from_slice(&bytes).unwrap_or(Value::Null))
}

fn post_body(title: &str, duration: i64) -> Value {
    json!({
        "title": title,
        "content": "Boiler recall for model X2",
        "category": "urgente",
        "duration": duration
    })
}

#[tokio::test]
async fn published_posts_are_listed_until_they_expire() {
    let (router, posts) = app();
    let expired_at = Utc::now() - Duration::days(1);
    posts
        .create(NewPost {
            title: "Old news".into(),
            content: "gone".into(),
            category: PostCategory::General,
            author: "jefa@example.com".into(),
            author_email: "jefa@example.com".into(),
            image_url: None,
            duration: 1,
            created_at: expired_at - Duration::days(1),
            expires_at: expired_at,
        })
        .await
        .unwrap();

    for (title, days) in [("Short", 1), ("Long", 30)] {
        let (status, body) = send(&router, Method::POST, "/posts", Some(ADMIN), Some(post_body(title, days))).await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["message"], "Post created successfully");
    }

    let (status, listed) = send(&router, Method::GET, "/posts", Some(USER), None).await;
    assert_eq!(status, StatusCode::OK);
    let titles: Vec<&str> = listed
        .as_array()
        .unwrap()
        .iter()
        .map(|post| post["title"].as_str().unwrap())
        .collect();
    assert_eq!(titles, vec!["Long", "Short"]);
    assert_eq!(listed[0]["author"], "jefa@example.com");
    assert_eq!(listed[0]["category"], "urgente");

    let (status, _) = send(&router, Method::GET, "/posts", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn invalid_posts_are_rejected() {
    let (router, _) = app();
    let mut unknown_category = post_body("Hi", 2);
    unknown_category["category"] = json!("rumores");
    for body in [post_body("Hi", 0), post_body("", 2), unknown_category] {
        let (status, _) = send(&router, Method::POST, "/posts", Some(ADMIN), Some(body)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }
}

#[tokio::test]
async fn only_admins_publish_and_delete() {
    let (router, _) = app();
    let (status, _) = send(&router, Method::POST, "/posts", Some(USER), Some(post_body("Hi", 2))).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (_, created) = send(&router, Method::POST, "/posts", Some(ADMIN), Some(post_body("Hi", 2))).await;
    let uri = format!("/posts/{}", created["id"].as_str().unwrap());

    let (status, _) = send(&router, Method::DELETE, &uri, Some(USER), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    let (status, _) = send(&router, Method::DELETE, &uri, Some(ADMIN), None).await;
    assert_eq!(status, StatusCode::OK);
    let (status, _) = send(&router, Method::DELETE, &uri, Some(ADMIN), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
