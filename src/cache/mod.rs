pub mod file;
pub mod memory;
pub mod snapshot;
pub mod store;
pub mod types;

#[cfg(test)]
mod tests;

pub use file::FileCache;
pub use memory::MemoryCache;
pub use snapshot::*;
pub use store::PersistentCache;
pub use types::*;
