// handlers/auth/mod.rs - Public authentication handlers
//
// Token acquisition endpoints. None of these require an access token; the
// refresh and logout endpoints authenticate with the refresh token in the body.

pub mod register;
pub mod session;

pub use register::register;
pub use session::{login, logout, refresh};
