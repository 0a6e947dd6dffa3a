/*
 * Responsibility
 * - 認証 middleware
 *   - bearer: 業務 route 用 (token → AuthCtx を extensions に載せる)
 *   - basic:  admin route 用 (固定の username/password)
 */
pub mod basic;
pub mod bearer;
