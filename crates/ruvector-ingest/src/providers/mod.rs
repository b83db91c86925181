//! Remote document store abstraction
//!
//! The ingestion commands only talk to [`RemoteStore`], so the HTTP client
//! can be swapped for the in-memory store in tests and dry runs.

pub mod http;
pub mod memory;
pub mod store;

pub use http::HttpStore;
pub use memory::InMemoryStore;
pub use store::RemoteStore;
