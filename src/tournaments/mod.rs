//! Tournaments: creation, discovery and membership.

pub mod db;
pub mod handlers;
