//! Stream capabilities and flow control
//!
//! This module provides:
//! - `ReadStream` / `WriteStream` capability traits for producers and
//!   consumers of `Buffer` chunks
//! - `BufferReadStream` / `BufferWriteStream` in-memory implementations
//! - `Pump` for coupling one producer to one consumer with backpressure

mod memory;
mod pump;
mod stream;

pub use memory::{BufferReadStream, BufferWriteStream, DEFAULT_WRITE_QUEUE_MAX_SIZE};
pub use pump::Pump;
pub use stream::{DataHandler, DrainHandler, EndHandler, ErrorHandler, ReadStream, WriteStream};
