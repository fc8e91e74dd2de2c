pub mod product;
pub mod signal;
