//! Reading results back from the store

pub mod fetch;

pub use fetch::fetch_all;
