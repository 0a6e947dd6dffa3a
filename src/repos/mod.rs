pub mod bearer_token_repo;
pub mod db;
pub mod document_register_repo;
pub mod error;
pub mod preference_repo;
pub mod read_receipt_repo;

pub use db::DbPool;
