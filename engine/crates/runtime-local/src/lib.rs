//! Local implementations of the runtime seams: a cache backend and an executor over
//! in-memory tables.

mod cache;
mod database;

pub use cache::InMemoryCache;
pub use database::MemoryDatabase;
