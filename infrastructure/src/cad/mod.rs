//! CAD gateway implementations

pub mod memory;

pub use memory::MemoryCad;
