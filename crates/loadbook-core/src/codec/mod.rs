pub mod clean;
pub mod identifier;
