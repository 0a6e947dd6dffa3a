use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;

/// Prefix that makes leaked tokens easy to recognise in secret scanners.
pub const TOKEN_PREFIX: &str = "ydhmyydh_";

/// New opaque bearer token: prefix + 32 bytes of entropy, URL-safe base64 without padding.
pub fn generate_token() -> Result<String, getrandom::Error> {
    let mut bytes = [0u8; 32];
    getrandom::fill(&mut bytes)?;

    Ok(format!("{TOKEN_PREFIX}{}", URL_SAFE_NO_PAD.encode(bytes)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::auth::bearer::extract_token;
    use axum::http::HeaderValue;

    #[test]
    fn tokens_are_unique_and_header_safe() {
        let a = generate_token().unwrap();
        let b = generate_token().unwrap();
        assert_ne!(a, b);
        assert!(a.starts_with(TOKEN_PREFIX));
        assert_eq!(a.len(), TOKEN_PREFIX.len() + 43);

        let header = HeaderValue::from_str(&format!("Bearer {a}")).unwrap();
        assert_eq!(extract_token(Some(&header)).unwrap(), a);
    }
}
