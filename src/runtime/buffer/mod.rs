//! Stream Buffers
//!
//! Every connected output port owns one [`Buffer`]: circular storage with a
//! single [`BufferWriter`] and one independent [`BufferReader`] per connected
//! input. Each reader sees every produced item.

/// Buffer sizing
pub mod allocator;
mod circular;

pub use circular::Buffer;
pub use circular::BufferReader;
pub use circular::BufferWriter;
