//! Route assembly.

pub mod api_routes;
pub mod router;
