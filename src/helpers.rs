pub mod errors;
pub mod markup;
