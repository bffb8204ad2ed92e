use crate::buffer::Buffer;
use easy_error::Error;

/// Per-chunk handler invoked with each produced buffer.
pub type DataHandler = Box<dyn FnMut(Buffer)>;
/// End-of-stream handler, invoked exactly once.
pub type EndHandler = Box<dyn FnOnce()>;
/// Asynchronous failure handler.
pub type ErrorHandler = Box<dyn FnMut(Error)>;
/// Notification that a write queue drained below its low-water mark.
pub type DrainHandler = Box<dyn FnMut()>;

/// Capability of a producer of [`Buffer`] chunks.
///
/// Implementations are cheap-clone handles over shared state, so the pump
/// and the closures it registers can address the same stream. Handler
/// registration replaces any previous handler; passing `None` deregisters.
/// Handlers run with no interior borrow held, so they may call back into
/// the stream (pause, re-register, ...) re-entrantly.
pub trait ReadStream {
    /// Register the per-chunk handler. Chunks produced while no handler
    /// is registered are retained by the stream and delivered once one
    /// is, in the original order.
    fn on_data(&self, handler: Option<DataHandler>);

    /// Register the end-of-stream handler. It fires exactly once, after
    /// the last retained chunk has been delivered.
    fn on_end(&self, handler: Option<EndHandler>);

    /// Register the failure handler.
    fn on_error(&self, handler: Option<ErrorHandler>);

    /// Stop delivering chunks. Chunks produced while paused are retained
    /// in order.
    fn pause(&self);

    /// Resume delivery, flushing retained chunks first.
    fn resume(&self);
}

/// Capability of a consumer of [`Buffer`] chunks.
pub trait WriteStream {
    /// Accept a chunk for writing. The stream takes ownership; delivery
    /// order is the call order.
    fn write(&self, chunk: Buffer);

    /// Set the high-water mark, in bytes of queued data. The low-water
    /// mark is half of it.
    fn set_write_queue_max_size(&self, size: usize);

    /// Whether queued data has reached the high-water mark. A producer
    /// should pause when this reports true and wait for the drain
    /// notification.
    fn write_queue_full(&self) -> bool;

    /// Register the drain handler, fired each time queued data falls
    /// from the high-water mark back to the low-water mark.
    fn on_drain(&self, handler: Option<DrainHandler>);

    /// Register the failure handler.
    fn on_error(&self, handler: Option<ErrorHandler>);
}
