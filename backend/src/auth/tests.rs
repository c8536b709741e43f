use super::*;
use jsonwebtoken::{EncodingKey, Header, encode};

const SECRET: &str = "supersecretjwtsecretforunittesting123";

fn token(secret: &str, sub: &str, exp: usize) -> String {
    let claims = SessionClaims {
        sub: sub.to_string(),
        email: Some("test@example.com".to_string()),
        exp,
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .unwrap()
}

#[test]
fn test_verify_session_jwt_success() {
    let sub = "123e4567-e89b-12d3-a456-426614174000";
    let claims = JwtVerifier::new(SECRET)
        .verify(&token(SECRET, sub, 9999999999))
        .expect("Valid token should pass");

    assert_eq!(claims.sub, sub);
    assert_eq!(claims.email.as_deref(), Some("test@example.com"));
}

#[test]
fn test_verify_session_jwt_expired() {
    let result = JwtVerifier::new(SECRET).verify(&token(
        SECRET,
        "123e4567-e89b-12d3-a456-426614174000",
        1,
    ));
    assert!(result.is_err());
}

#[test]
fn test_verify_session_jwt_invalid_signature() {
    let result = JwtVerifier::new(SECRET).verify(&token(
        "wrongsecret",
        "123e4567-e89b-12d3-a456-426614174000",
        9999999999,
    ));
    assert!(result.is_err());
}

#[tokio::test]
async fn test_extractor_rejects_non_uuid_subject() {
    let request = axum::http::Request::builder()
        .header(
            axum::http::header::AUTHORIZATION,
            format!("Bearer {}", token(SECRET, "not-a-uuid", 9999999999)),
        )
        .extension(Arc::new(JwtVerifier::new(SECRET)))
        .body(())
        .unwrap();
    let (mut parts, _) = request.into_parts();

    let result = AuthUser::from_request_parts(&mut parts, &()).await;
    assert!(result.is_err());
}

#[tokio::test]
async fn test_extractor_reads_user_id() {
    let request = axum::http::Request::builder()
        .header(
            axum::http::header::AUTHORIZATION,
            format!(
                "Bearer {}",
                token(SECRET, "123e4567-e89b-12d3-a456-426614174000", 9999999999)
            ),
        )
        .extension(Arc::new(JwtVerifier::new(SECRET)))
        .body(())
        .unwrap();
    let (mut parts, _) = request.into_parts();

    let user = AuthUser::from_request_parts(&mut parts, &()).await.unwrap();
    assert_eq!(
        user.user_id,
        Uuid::parse_str("123e4567-e89b-12d3-a456-426614174000").unwrap()
    );
}
