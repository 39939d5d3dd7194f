use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use portal_common::models::Role;
use portal_common::PortalError;
use portal_firebase::FirebaseTokenVerifier;
use serde_json::{json, Value};
use std::time::{SystemTime, UNIX_EPOCH};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const PROJECT: &str = "portal-sat-test";
const KID: &str = "test-key-1";

fn now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .as_secs()
}

fn jwks() -> Value {
    serde_json::from_str(include_str!("data/jwks.json")).unwrap()
}

fn claims() -> Value {
    json!({
        "iss": format!("https://securetoken.google.com/{}", PROJECT),
        "aud": PROJECT,
        "sub": "u-marta",
        "email": "marta@example.com",
        "role": "admin",
        "iat": now() - 60,
        "exp": now() + 3600,
    })
}

fn sign(claims: &Value, kid: &str) -> String {
    let mut header = Header::new(Algorithm::RS256);
    header.kid = Some(kid.to_string());
    let key = EncodingKey::from_rsa_pem(include_bytes!("data/test_rsa.pem")).unwrap();
    encode(&header, claims, &key).unwrap()
}

async fn key_server(expected_fetches: u64) -> MockServer {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/jwks"))
        .respond_with(ResponseTemplate::new(200).set_body_json(jwks()))
        .expect(expected_fetches)
        .mount(&server)
        .await;
    server
}

fn verifier(server: &MockServer) -> FirebaseTokenVerifier {
    FirebaseTokenVerifier::new(PROJECT).with_jwks_url(format!("{}/jwks", server.uri()))
}

#[tokio::test]
async fn valid_token_yields_subject_and_role() {
    let server = key_server(1).await;
    let verifier = verifier(&server);

    let user = verifier.verify_id_token(&sign(&claims(), KID)).await.unwrap();
    assert_eq!(user.subject, "u-marta");
    assert_eq!(user.email.as_deref(), Some("marta@example.com"));
    assert_eq!(user.role, Role::Admin);

    // Second verification is served from the key cache
    let mut plain = claims();
    plain.as_object_mut().unwrap().remove("role");
    let user = verifier.verify_id_token(&sign(&plain, KID)).await.unwrap();
    assert_eq!(user.role, Role::User);
}

#[tokio::test]
async fn wrong_audience_issuer_or_expiry_is_unauthorized() {
    let server = key_server(1).await;
    let verifier = verifier(&server);

    let mut other_audience = claims();
    other_audience["aud"] = json!("someone-else");
    let mut other_issuer = claims();
    other_issuer["iss"] = json!("https://securetoken.google.com/someone-else");
    let mut expired = claims();
    expired["iat"] = json!(now() - 7200);
    expired["exp"] = json!(now() - 3600);

    for claims in [other_audience, other_issuer, expired] {
        let err = verifier
            .verify_id_token(&sign(&claims, KID))
            .await
            .unwrap_err();
        assert!(matches!(err, PortalError::Unauthorized(_)), "{:?}", err);
    }
}

#[tokio::test]
async fn unknown_key_id_refetches_then_rejects() {
    let server = key_server(2).await;
    let verifier = verifier(&server);

    verifier.verify_id_token(&sign(&claims(), KID)).await.unwrap();
    let err = verifier
        .verify_id_token(&sign(&claims(), "rotated-key"))
        .await
        .unwrap_err();
    assert!(matches!(err, PortalError::Unauthorized(_)));
}

#[tokio::test]
async fn key_endpoint_failure_is_an_upstream_failure() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/jwks"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let err = verifier(&server)
        .verify_id_token(&sign(&claims(), KID))
        .await
        .unwrap_err();
    assert!(matches!(err, PortalError::UpstreamFailure { .. }));
}
