/*
 * Responsibility
 * - Module tree of the inventory API (the binary only calls app::run)
 */
pub mod api;
pub mod app;
pub mod config;
pub mod error;
pub mod middleware;
pub mod repos;
pub mod services;
pub mod state;

#[cfg(test)]
pub(crate) mod test_support;
