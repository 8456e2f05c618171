//! Authentication and account handlers.

pub mod admin;
pub mod login;
pub mod me;
pub mod password;
pub mod register;
pub mod types;

pub use login::login;
pub use me::{get_me, update_profile};
pub use password::{forgot_password, reset_password, verify_otp};
pub use register::register;
