pub mod factory;
pub mod password;
pub mod token_service;

pub use factory::build_token_service;
pub use token_service::{TokenError, TokenService, VerifiedToken};
