pub mod components;
pub mod config;
pub mod numbers;
pub mod records;
