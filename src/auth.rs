use crate::error::Result;
use crate::models::{AuthClaims, Identity, ResetClaims};
use bcrypt::{hash, verify, DEFAULT_COST};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use std::time::{SystemTime, UNIX_EPOCH};

const DEFAULT_SECRET: &[u8] = b"tradeflow_dev_secret"; // override with TRADEFLOW_JWT_SECRET
const SESSION_TTL_SECS: usize = 3600; // 1 hour
const RESET_TTL_SECS: usize = 900;

fn secret() -> Vec<u8> {
    std::env::var("TRADEFLOW_JWT_SECRET")
        .map(String::into_bytes)
        .unwrap_or_else(|_| DEFAULT_SECRET.to_vec())
}

fn now_secs() -> usize {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs() as usize
}

pub fn hash_password(password: &str) -> Result<String> {
    Ok(hash(password, DEFAULT_COST)?)
}

pub fn verify_password(password: &str, hashed: &str) -> Result<bool> {
    Ok(verify(password, hashed)?)
}

pub fn create_session_token(identity: &Identity) -> Result<String> {
    let claims = AuthClaims {
        sub: identity.id.clone(),
        email: identity.email.clone(),
        exp: now_secs() + SESSION_TTL_SECS,
    };
    Ok(encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(&secret()),
    )?)
}

pub fn validate_session_token(token: &str) -> Result<AuthClaims> {
    let data = decode::<AuthClaims>(
        token,
        &DecodingKey::from_secret(&secret()),
        &Validation::new(Algorithm::HS256),
    )?;
    Ok(data.claims)
}

/// Short-lived token proving a reset request for a user id. Sending it by
/// email is a delivery concern outside this service.
pub fn create_reset_token(user_id: &str) -> Result<String> {
    let claims = ResetClaims {
        sub: user_id.to_owned(),
        exp: now_secs() + RESET_TTL_SECS,
    };
    Ok(encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(&secret()),
    )?)
}

pub fn validate_reset_token(token: &str) -> Result<ResetClaims> {
    let data = decode::<ResetClaims>(
        token,
        &DecodingKey::from_secret(&secret()),
        &Validation::new(Algorithm::HS256),
    )?;
    Ok(data.claims)
}
