//! bcrypt hashing for bearer token secrets.
//!
//! Both directions run on the blocking pool: a bcrypt round at the default
//! cost takes long enough to stall the async workers otherwise.
use thiserror::Error;

pub use bcrypt::DEFAULT_COST;

#[derive(Debug, Error)]
pub enum HashError {
    /// The stored hash cannot be parsed (corrupt record), or hashing itself failed.
    #[error("bcrypt: {0}")]
    Bcrypt(#[from] bcrypt::BcryptError),

    #[error("hash worker failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}

/// Check `secret` against a bcrypt `stored_hash`.
///
/// - `Ok(true)`  => match
/// - `Ok(false)` => well-formed hash, different secret
/// - `Err(_)`    => the stored hash is malformed
pub async fn verify(secret: &str, stored_hash: &str) -> Result<bool, HashError> {
    let secret = secret.to_owned();
    let stored_hash = stored_hash.to_owned();

    let matched =
        tokio::task::spawn_blocking(move || bcrypt::verify(secret, &stored_hash)).await??;

    Ok(matched)
}

/// Hash a freshly issued secret with a per-record salt.
pub async fn hash(secret: &str, cost: u32) -> Result<String, HashError> {
    let secret = secret.to_owned();

    let hashed = tokio::task::spawn_blocking(move || bcrypt::hash(secret, cost)).await??;

    Ok(hashed)
}

#[cfg(test)]
mod tests {
    use super::*;

    const TEST_COST: u32 = 4;

    #[tokio::test]
    async fn matching_secret_verifies() {
        let stored = hash("secret123", TEST_COST).await.unwrap();
        assert!(verify("secret123", &stored).await.unwrap());
    }

    #[tokio::test]
    async fn different_secret_is_false_not_error() {
        let stored = hash("secret123", TEST_COST).await.unwrap();
        assert!(!verify("secret124", &stored).await.unwrap());
        assert!(!verify("", &stored).await.unwrap());
    }

    #[tokio::test]
    async fn salts_differ_per_record() {
        let a = hash("secret123", TEST_COST).await.unwrap();
        let b = hash("secret123", TEST_COST).await.unwrap();
        assert_ne!(a, b);
        assert!(verify("secret123", &a).await.unwrap());
        assert!(verify("secret123", &b).await.unwrap());
    }

    #[tokio::test]
    async fn malformed_stored_hash_is_an_error() {
        let err = verify("secret123", "brown").await.unwrap_err();
        assert!(matches!(err, HashError::Bcrypt(_)));
    }
}
