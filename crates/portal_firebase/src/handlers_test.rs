#[cfg(test)]
mod tests {
    use crate::handlers::FirebaseState;
    use crate::mock::InMemoryIdentityAdmin;
    use crate::routes::routes;
    use axum::body::Body;
    use axum::http::{header, Method, Request, StatusCode};
    use axum::Router;
    use portal_common::models::Role;
    use portal_common::{Authenticator, StaticTokenVerifier};
    use serde_json::{json, Value};
    use std::sync::Arc;
    use tower::ServiceExt;

    fn app() -> (Router, Arc<InMemoryIdentityAdmin>) {
        let admin = Arc::new(
            InMemoryIdentityAdmin::new()
                .with_user("u-admin", "admin@example.com", Role::Admin)
                .with_user("u-tech", "tech@example.com", Role::User),
        );
        let verifier = StaticTokenVerifier::new()
            .with_user("admin-token", "u-admin", Role::Admin)
            .with_user("user-token", "u-tech", Role::User);
        let state = FirebaseState {
            admin: admin.clone(),
            auth: Authenticator::new(Arc::new(verifier)),
        };
        (routes(state), admin)
    }

    async fn call(
        router: &Router,
        method: Method,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri("/admin/users");
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
        let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, value)
    }

    #[tokio::test]
    async fn test_listing_requires_an_admin() {
        let (router, _) = app();
        let (status, _) = call(&router, Method::GET, None, None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        let (status, body) = call(&router, Method::GET, Some("user-token"), None).await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(body["error"]["code"], 403);

        let (status, body) = call(&router, Method::GET, Some("admin-token"), None).await;
        assert_eq!(status, StatusCode::OK);
        let users = body["users"].as_array().unwrap();
        assert_eq!(users.len(), 2);
        assert_eq!(users[1]["uid"], "u-tech");
        assert_eq!(users[1]["role"], "user");
    }

    #[tokio::test]
    async fn test_role_update_sets_claim_and_revokes_tokens() {
        let (router, admin) = app();
        let (status, body) = call(
            &router,
            Method::PATCH,
            Some("admin-token"),
            Some(json!({"uid": "u-tech", "role": "admin"})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            body,
            json!({"success": true, "message": "User role updated successfully"})
        );
        assert_eq!(admin.user("u-tech").unwrap().role, Role::Admin);
        assert_eq!(admin.revoked(), vec!["u-tech".to_string()]);
    }

    #[tokio::test]
    async fn test_revocation_failure_does_not_fail_the_update() {
        let (router, admin) = app();
        admin.fail_revocation(true);
        let (status, _) = call(
            &router,
            Method::PATCH,
            Some("admin-token"),
            Some(json!({"uid": "u-tech", "role": "admin"})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(admin.user("u-tech").unwrap().role, Role::Admin);
        assert!(admin.revoked().is_empty());
    }

    #[tokio::test]
    async fn test_role_update_rejections() {
        let (router, admin) = app();
        let (status, _) = call(
            &router,
            Method::PATCH,
            Some("user-token"),
            Some(json!({"uid": "u-tech", "role": "admin"})),
        )
        .await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(admin.user("u-tech").unwrap().role, Role::User);

        for body in [
            json!({"uid": "u-tech", "role": "superuser"}),
            json!({"uid": "", "role": "admin"}),
            json!({"role": "admin"}),
        ] {
            let (status, _) = call(&router, Method::PATCH, Some("admin-token"), Some(body)).await;
            assert_eq!(status, StatusCode::BAD_REQUEST);
        }

        let (status, _) = call(
            &router,
            Method::PATCH,
            Some("admin-token"),
            Some(json!({"uid": "u-ghost", "role": "user"})),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert!(admin.revoked().is_empty());
    }
}
