pub mod client;
#[cfg(test)]
pub(crate) mod memory;
pub mod valkey;

pub use client::{CacheClient, CacheError};
pub use valkey::ValkeyClient;
