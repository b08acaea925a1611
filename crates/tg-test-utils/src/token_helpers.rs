//! Helpers for inspecting issued access tokens.

use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use token_gateway::models::AccessTokenClaims;

/// API key the test harness configures.
pub const TEST_API_KEY: &str = "APItestharness";

/// API secret the test harness configures.
pub const TEST_API_SECRET: &str = "tg-test-harness-secret-0123456789abcdef";

/// Verify `token` against the harness secret and return its claims.
///
/// Panics if the signature, algorithm or expiry is wrong.
pub fn decode_token(token: &str) -> AccessTokenClaims {
    decode_token_with_secret(token, TEST_API_SECRET)
        .unwrap_or_else(|e| panic!("token failed verification: {e}"))
}

/// Verify `token` against an arbitrary secret.
pub fn decode_token_with_secret(
    token: &str,
    secret: &str,
) -> Result<AccessTokenClaims, jsonwebtoken::errors::Error> {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.validate_nbf = true;

    decode::<AccessTokenClaims>(token, &DecodingKey::from_secret(secret.as_bytes()), &validation)
        .map(|data| data.claims)
}

/// Seconds between `nbf` and `exp`.
pub fn token_lifetime_secs(claims: &AccessTokenClaims) -> i64 {
    claims.exp - claims.nbf
}

/// Assert that `nbf` is within `tolerance_secs` of now.
pub fn assert_issued_recently(claims: &AccessTokenClaims, tolerance_secs: i64) {
    let now = chrono::Utc::now().timestamp();
    assert!(
        (now - claims.nbf).abs() <= tolerance_secs,
        "nbf {} is not within {}s of now {}",
        claims.nbf,
        tolerance_secs,
        now
    );
}
