//! Accounts and sessions: user rows, bcrypt + JWT, and the REST
//! handlers for registration, login, profile and the admin surface.

pub mod handlers;
pub mod sessions;
pub mod users;
