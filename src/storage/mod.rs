pub mod kv;
pub mod project_store;
pub mod records;

#[cfg(test)]
pub mod testing;

pub use kv::FileStore;
pub use project_store::ProjectStore;
pub use records::Storage;

#[cfg(test)]
pub use testing::MemoryStore;
