//! Directory queries and writes on top of the SeaORM entities.

pub mod centers;
pub mod error;
pub mod images;
pub mod leads;
pub mod locations;
pub mod sitemap;

#[cfg(test)]
mod testing;

pub use error::{ListingError, Result};
