pub mod auth;

pub use auth::{resolve_caller, AuthUser, Caller};
