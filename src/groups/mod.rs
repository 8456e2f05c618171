//! Court chat groups and their membership rows.

pub mod db;
pub mod handlers;
