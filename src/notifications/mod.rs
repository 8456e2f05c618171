//! Persistent notifications and outbound mail.

pub mod db;
pub mod mailer;
