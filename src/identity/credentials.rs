use std::collections::HashMap;

use anyhow::{anyhow, Result};
use argon2::{Argon2, PasswordHasher, PasswordVerifier};
use password_hash::{PasswordHash, SaltString};

/// Username -> Argon2 PHC hash table used by the session login endpoint.
#[derive(Debug, Clone, Default)]
pub struct Credentials {
    users: HashMap<String, String>,
}

impl Credentials {
    pub fn new(users: HashMap<String, String>) -> Self { Self { users } }

    pub fn is_empty(&self) -> bool { self.users.is_empty() }

    /// Unknown users and malformed hashes both fail closed.
    pub fn verify(&self, username: &str, password: &str) -> bool {
        match self.users.get(username) {
            Some(phc) => verify_password(phc, password),
            None => false,
        }
    }
}

pub fn hash_password(password: &str) -> Result<String> {
    let mut salt_bytes = [0u8; 16];
    getrandom::getrandom(&mut salt_bytes).map_err(|e| anyhow!(e.to_string()))?;
    let salt = SaltString::encode_b64(&salt_bytes).map_err(|e| anyhow!(e.to_string()))?;
    let argon2 = Argon2::default();
    let phc = argon2.hash_password(password.as_bytes(), &salt).map_err(|e| anyhow!(e.to_string()))?.to_string();
    Ok(phc)
}

pub fn verify_password(hash: &str, password: &str) -> bool {
    if let Ok(parsed) = PasswordHash::new(hash) {
        Argon2::default().verify_password(password.as_bytes(), &parsed).is_ok()
    } else { false }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verify_known_user() {
        let phc = hash_password("s3cret").unwrap();
        let creds = Credentials::new(HashMap::from([("alice".to_string(), phc)]));
        assert!(creds.verify("alice", "s3cret"));
        assert!(!creds.verify("alice", "wrong"));
        assert!(!creds.verify("mallory", "s3cret"));
    }

    #[test]
    fn malformed_hash_fails_closed() {
        let creds = Credentials::new(HashMap::from([("alice".to_string(), "not-a-phc".to_string())]));
        assert!(!creds.verify("alice", "not-a-phc"));
    }
}
