/*!
 * Request gate
 *
 * Responsibility:
 * - protect: bearer credential -> verified token -> live, active account -> AuthCtx
 * - authorize: AuthCtx role must be in the route's RoleSet
 *
 * Layer order on a gated route: protect (outermost) -> authorize -> validate -> handler.
 * With axum the innermost layer is applied first: validate, then authorize, then protect.
 */
pub mod authorize;
mod error;
pub mod protect;

pub use error::AuthError;
