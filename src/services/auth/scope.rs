//! Scope catalogue and the per-route membership check.

use crate::api::extractors::AuthCtx;

pub const DOCUMENTS_REGISTER_SEARCH: &str = "documents/register.search";
pub const DOCUMENTS_RECEIPT_PUT: &str = "documents/receipt.put";
pub const DOCUMENTS_RECEIPT_DELETE: &str = "documents/receipt.delete";
pub const PREFERENCES_OPTIONS_SEARCH: &str = "preferences/options.search";
pub const PREFERENCES_USER_SEARCH: &str = "preferences/user.search";
pub const PREFERENCES_USER_PUT: &str = "preferences/user.put";

/// Every scope a route can require. Admin-issued tokens may only carry these.
pub const ALL: &[&str] = &[
    DOCUMENTS_REGISTER_SEARCH,
    DOCUMENTS_RECEIPT_PUT,
    DOCUMENTS_RECEIPT_DELETE,
    PREFERENCES_OPTIONS_SEARCH,
    PREFERENCES_USER_SEARCH,
    PREFERENCES_USER_PUT,
];

pub fn is_known(scope: &str) -> bool {
    ALL.contains(&scope)
}

/// Exact set membership; no wildcards, no prefixes.
pub fn authorize(ctx: &AuthCtx, required: &str) -> bool {
    ctx.has_scope(required)
}
