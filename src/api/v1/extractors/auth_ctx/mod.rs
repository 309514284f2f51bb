/*!
 * Authentication context extractor
 *
 * Responsibility:
 * - Hand the account resolved by the gate (AuthCtx) to handlers
 * - axum-specific code lives in core, the type itself in types
 *
 * Public API:
 * - AuthCtx
 * - AuthCtxExtractor
 */

mod core;
mod types;

pub use self::core::AuthCtxExtractor;
pub use types::AuthCtx;
