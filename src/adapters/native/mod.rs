//! Native store adapters
//!
//! Implementations of the NativeStore port.
//!
//! - **PostgresNativeStore** - One table per collection, paged cursor
//! - **InMemoryNativeStore** - Documents held in memory (testing/development)

mod in_memory;
mod postgres;

pub use in_memory::InMemoryNativeStore;
pub use postgres::PostgresNativeStore;
