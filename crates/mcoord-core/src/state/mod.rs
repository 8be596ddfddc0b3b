//! State store implementations

pub mod memory;

pub use memory::MemoryStateStore;
