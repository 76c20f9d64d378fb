pub mod bulk;
pub mod filter;
pub mod flatten;
