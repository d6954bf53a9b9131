pub mod core;
pub mod portal;
pub mod reports;
