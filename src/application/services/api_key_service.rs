use rand::distributions::Alphanumeric;
use rand::{thread_rng, Rng};

use crate::domain::entities::ApiCredentials;

pub const API_KEY_LEN: usize = 32;
pub const API_SECRET_LEN: usize = 64;
const BCRYPT_COST: u32 = 12;

fn random_alphanumeric(len: usize) -> String {
    thread_rng()
        .sample_iter(&Alphanumeric)
        .take(len)
        .map(char::from)
        .collect()
}

pub fn generate_api_key() -> String {
    random_alphanumeric(API_KEY_LEN)
}

pub fn generate_api_secret() -> String {
    random_alphanumeric(API_SECRET_LEN)
}

pub fn hash_api_secret(secret: &str) -> Result<String, bcrypt::BcryptError> {
    bcrypt::hash(secret, BCRYPT_COST)
}

pub fn verify_api_secret(secret: &str, hash: &str) -> Result<bool, bcrypt::BcryptError> {
    bcrypt::verify(secret, hash)
}

/// Cheap shape check run before any database lookup or bcrypt work.
pub fn has_valid_format(api_key: &str, api_secret: &str) -> bool {
    api_key.len() == API_KEY_LEN
        && api_key.chars().all(|c| c.is_ascii_alphanumeric())
        && api_secret.len() == API_SECRET_LEN
        && api_secret.chars().all(|c| c.is_ascii_alphanumeric())
}

/// Fresh key pair plus the hash to store. The plain secret is only ever
/// handed back to the caller once.
pub fn issue_credentials() -> Result<(ApiCredentials, String), bcrypt::BcryptError> {
    let api_key = generate_api_key();
    let api_secret = generate_api_secret();
    let hash = hash_api_secret(&api_secret)?;
    Ok((
        ApiCredentials {
            api_key,
            api_secret,
        },
        hash,
    ))
}
