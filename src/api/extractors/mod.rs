/*
 * Responsibility
 * - handler 引数で使う extractor 群
 *   - AuthCtx: bearer middleware が載せた認証済みコンテキスト
 *   - scope:   route ごとの scope 検査 (CanPutReceipt など)
 *   - ApiJson / ApiQuery / ApiPath: rejection を AppError に揃えたラッパ
 */
mod auth_ctx;
mod json;
mod path;
mod query;
pub mod scope;

pub use auth_ctx::AuthCtx;
pub use json::ApiJson;
pub use path::ApiPath;
pub use query::ApiQuery;
