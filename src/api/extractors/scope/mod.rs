/**
 * Responsibility
 *  - core と types を束ねる
 *  - handler からは types の alias (CanPutReceipt など) だけを使う
 */
mod core;
mod types;

pub use types::*;
