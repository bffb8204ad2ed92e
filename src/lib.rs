//! bytepump
//!
//! Dynamic byte buffers and backpressure-aware stream pumping. `Buffer`
//! is an auto-growing byte container addressable both by append and by
//! absolute position; `ReadStream`/`WriteStream` are the minimal
//! capabilities of chunk producers and consumers; `Pump` couples one
//! producer to one consumer and applies backpressure; `Promise` carries
//! the single terminal outcome of an asynchronous operation.
//!
//! The crate is single-threaded by contract: each buffer or promise is
//! exclusively owned by one logical task, and stream delivery is
//! cooperative callback dispatch. Crossing a scheduling boundary means a
//! full copy or a full transfer.

pub mod buffer;
pub mod encoding;
pub mod error;
pub mod future;
pub mod io;

pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// Re-export commonly used types for convenience
pub use buffer::Buffer;
pub use encoding::Encoding;
pub use error::CoreError;
pub use future::{AsyncResult, Promise, SharedError};
pub use io::{BufferReadStream, BufferWriteStream, Pump, ReadStream, WriteStream};
