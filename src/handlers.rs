pub mod admin;
pub mod auth;
pub mod blog;
pub mod centers;
pub mod health;
pub mod images;
pub mod leads;
pub mod locations;
pub mod pages;
pub mod seo;
