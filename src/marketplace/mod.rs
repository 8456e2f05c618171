//! Marketplace: categories, product listings and seller ratings.

pub mod db;
pub mod handlers;
