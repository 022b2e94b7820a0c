//! Record store adapters.
mod memory;
mod mongo;

pub use memory::MemoryStore;
pub use mongo::MongoStore;
