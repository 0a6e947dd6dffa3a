/*
 * Responsibility
 * - liveness 用。DB には触れない
 */
pub async fn healthcheck() -> &'static str {
    "ok"
}
