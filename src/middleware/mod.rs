/*
 * Responsibility
 * - Public interface of the middleware layer
 * - Route-level stages (validate, auth) and router-wide layers (cors, http)
 */
pub mod auth;
pub mod cors;
pub mod http;
pub mod validate;
