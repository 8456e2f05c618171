//! Court discovery via the Google Places API, and the lazy creation of
//! a court's chat group on first association.

pub mod handlers;
pub mod places;
