/*
 * Responsibility
 * - Handler から見える「認証済みコンテキスト」の型
 * - bearer middleware が検証して request extensions に格納し、handler はこの型だけを受け取る
 *
 * Notes
 * - token の検証ロジック (bcrypt 照合) は services/middleware 側の責務
 * - 生成後は読み取り専用 (scope を後から足す API は持たない)
 */
use std::collections::HashSet;

/// 認証済みのリクエストに付与されるコンテキスト
///
/// - `client` は一致した credential record の name (ログ相関用)
/// - `scopes` は保存時の順序に関係なく集合として扱う
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthCtx {
    client: String,
    scopes: HashSet<String>,
}

impl AuthCtx {
    pub fn new(client: impl Into<String>, scopes: impl IntoIterator<Item = String>) -> Self {
        Self {
            client: client.into(),
            scopes: scopes.into_iter().collect(),
        }
    }

    pub fn client(&self) -> &str {
        &self.client
    }

    pub fn has_scope(&self, scope: &str) -> bool {
        self.scopes.contains(scope)
    }

    pub fn scopes(&self) -> impl Iterator<Item = &str> {
        self.scopes.iter().map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scopes_are_a_set() {
        let a = AuthCtx::new(
            "ClientA",
            vec!["x".to_string(), "y".to_string(), "x".to_string()],
        );
        let b = AuthCtx::new("ClientA", vec!["y".to_string(), "x".to_string()]);
        assert_eq!(a, b);
        assert_eq!(a.scopes().count(), 2);
    }
}
