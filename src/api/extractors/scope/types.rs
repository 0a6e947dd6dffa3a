/**
 * Responsibility
 *
 * 主な責務
 *  - route ごとの「必要 scope 付き」extractor 型を宣言する
 *  - route が増えたら、ここにタグと alias を 1 組追加する
 *
 * 置かないもの
 *  - scope 検査ロジック (core.rs)
 *  - scope 文字列そのもの (services::auth::scope)
 */
use super::core::{Authorized, ScopeTag};
use crate::services::auth::scope;

// documents/register
pub enum RegisterSearchTag {}
impl ScopeTag for RegisterSearchTag {
    const SCOPE: &'static str = scope::DOCUMENTS_REGISTER_SEARCH;
}
pub type CanSearchRegister = Authorized<RegisterSearchTag>;

// documents/receipt
pub enum ReceiptPutTag {}
impl ScopeTag for ReceiptPutTag {
    const SCOPE: &'static str = scope::DOCUMENTS_RECEIPT_PUT;
}
pub type CanPutReceipt = Authorized<ReceiptPutTag>;

pub enum ReceiptDeleteTag {}
impl ScopeTag for ReceiptDeleteTag {
    const SCOPE: &'static str = scope::DOCUMENTS_RECEIPT_DELETE;
}
pub type CanDeleteReceipt = Authorized<ReceiptDeleteTag>;

// preferences/options
pub enum OptionsSearchTag {}
impl ScopeTag for OptionsSearchTag {
    const SCOPE: &'static str = scope::PREFERENCES_OPTIONS_SEARCH;
}
pub type CanSearchOptions = Authorized<OptionsSearchTag>;

// preferences/user
pub enum UserPreferencesSearchTag {}
impl ScopeTag for UserPreferencesSearchTag {
    const SCOPE: &'static str = scope::PREFERENCES_USER_SEARCH;
}
pub type CanSearchUserPreferences = Authorized<UserPreferencesSearchTag>;

pub enum UserPreferencesPutTag {}
impl ScopeTag for UserPreferencesPutTag {
    const SCOPE: &'static str = scope::PREFERENCES_USER_PUT;
}
pub type CanPutUserPreferences = Authorized<UserPreferencesPutTag>;
