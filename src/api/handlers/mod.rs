pub mod bearer_tokens;
pub mod health;
pub mod preferences;
pub mod receipt;
pub mod register;
