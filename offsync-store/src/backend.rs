pub mod fjall;
pub mod memory;

pub use fjall::FjallBucketStore;
pub use memory::MemoryBucketStore;
