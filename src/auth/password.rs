//! Salted SHA-256 password hashes stored as `hex(salt)$hex(digest)`.

use rand::Rng;
use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;

const SALT_LEN: usize = 16;

pub fn hash_password(password: &str) -> String {
    let salt: [u8; SALT_LEN] = rand::rng().random();
    format!("{}${}", hex::encode(salt), hex::encode(digest(&salt, password)))
}

/// False for malformed stored hashes as well as wrong passwords.
pub fn verify_password(password: &str, stored: &str) -> bool {
    let Some((salt, expected)) = stored.split_once('$') else {
        return false;
    };
    let (Ok(salt), Ok(expected)) = (hex::decode(salt), hex::decode(expected)) else {
        return false;
    };
    digest(&salt, password).ct_eq(&expected).into()
}

fn digest(salt: &[u8], password: &str) -> Vec<u8> {
    let mut hasher = Sha256::new();
    hasher.update(salt);
    hasher.update(password.as_bytes());
    hasher.finalize().to_vec()
}
