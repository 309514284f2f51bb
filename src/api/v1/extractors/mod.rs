/*
 * Responsibility
 * - Extractors shared by the v1 handlers
 * - AuthCtx hand-off from the gate, JSON bodies rejected in the API envelope
 */
pub mod auth_ctx;
mod json;

pub use auth_ctx::{AuthCtx, AuthCtxExtractor};
pub use json::ApiJson;
