use crate::buffer::Buffer;
use crate::io::stream::{DataHandler, DrainHandler, EndHandler, ErrorHandler, ReadStream, WriteStream};
use easy_error::Error;
use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;
use tracing::trace;

/// Default high-water mark for [`BufferWriteStream`], in bytes.
pub const DEFAULT_WRITE_QUEUE_MAX_SIZE: usize = 8192;

/// A handler slot that survives re-entrant registration.
///
/// Dispatch takes the handler out before invoking it (so no interior
/// borrow is held while it runs) and restores it afterwards, unless the
/// handler re-registered meanwhile. The epoch counter tells the two
/// apart.
struct Slot<H> {
    handler: Option<H>,
    epoch: u64,
}

impl<H> Slot<H> {
    fn new() -> Self {
        Self {
            handler: None,
            epoch: 0,
        }
    }

    fn set(&mut self, handler: Option<H>) {
        self.handler = handler;
        self.epoch += 1;
    }

    fn take(&mut self) -> Option<(H, u64)> {
        self.handler.take().map(|h| (h, self.epoch))
    }

    fn restore(&mut self, handler: H, epoch: u64) {
        if self.epoch == epoch && self.handler.is_none() {
            self.handler = Some(handler);
        }
    }
}

struct ReadInner {
    data: Slot<DataHandler>,
    end: Option<EndHandler>,
    error: Slot<ErrorHandler>,
    queue: VecDeque<Buffer>,
    paused: bool,
    ended: bool,
    end_delivered: bool,
    dispatching: bool,
}

/// In-memory producer of [`Buffer`] chunks.
///
/// The driving side feeds it with [`push`](Self::push), [`end`](Self::end)
/// and [`fail`](Self::fail); the consuming side observes it through the
/// [`ReadStream`] capability. Chunks pushed while the stream is paused or
/// has no data handler are queued and flushed in order.
///
/// Cloning returns another handle to the same stream.
#[derive(Clone)]
pub struct BufferReadStream {
    inner: Rc<RefCell<ReadInner>>,
}

impl BufferReadStream {
    pub fn new() -> Self {
        Self {
            inner: Rc::new(RefCell::new(ReadInner {
                data: Slot::new(),
                end: None,
                error: Slot::new(),
                queue: VecDeque::new(),
                paused: false,
                ended: false,
                end_delivered: false,
                dispatching: false,
            })),
        }
    }

    /// Feed one chunk into the stream.
    pub fn push(&self, chunk: Buffer) {
        {
            let mut inner = self.inner.borrow_mut();
            debug_assert!(!inner.ended, "push after end");
            inner.queue.push_back(chunk);
        }
        self.dispatch();
    }

    /// Signal end-of-stream. The end handler fires once every queued
    /// chunk has been delivered.
    pub fn end(&self) {
        self.inner.borrow_mut().ended = true;
        self.dispatch();
    }

    /// Report an asynchronous failure to the registered error handler.
    pub fn fail(&self, error: Error) {
        let taken = self.inner.borrow_mut().error.take();
        if let Some((mut h, epoch)) = taken {
            h(error);
            self.inner.borrow_mut().error.restore(h, epoch);
        }
    }

    /// Whether the stream is currently paused.
    pub fn is_paused(&self) -> bool {
        self.inner.borrow().paused
    }

    /// Chunks queued and not yet delivered.
    pub fn queued(&self) -> usize {
        self.inner.borrow().queue.len()
    }

    // Delivery loop. Runs queued chunks through the data handler until
    // the queue empties, the stream pauses, or the handler deregisters;
    // then delivers end-of-stream if due. Re-entrant calls fold into the
    // outer loop.
    fn dispatch(&self) {
        {
            let mut inner = self.inner.borrow_mut();
            if inner.dispatching {
                return;
            }
            inner.dispatching = true;
        }
        loop {
            let taken = {
                let mut inner = self.inner.borrow_mut();
                if inner.paused || inner.queue.is_empty() {
                    None
                } else if let Some((h, epoch)) = inner.data.take() {
                    let chunk = inner.queue.pop_front().unwrap();
                    Some((h, epoch, chunk))
                } else {
                    None
                }
            };
            let Some((mut handler, epoch, chunk)) = taken else {
                break;
            };
            handler(chunk);
            self.inner.borrow_mut().data.restore(handler, epoch);
        }
        let end = {
            let mut inner = self.inner.borrow_mut();
            inner.dispatching = false;
            if inner.ended && !inner.end_delivered && !inner.paused && inner.queue.is_empty() {
                let h = inner.end.take();
                if h.is_some() {
                    inner.end_delivered = true;
                }
                h
            } else {
                None
            }
        };
        if let Some(h) = end {
            h();
        }
    }
}

impl Default for BufferReadStream {
    fn default() -> Self {
        Self::new()
    }
}

impl ReadStream for BufferReadStream {
    fn on_data(&self, handler: Option<DataHandler>) {
        self.inner.borrow_mut().data.set(handler);
        self.dispatch();
    }

    fn on_end(&self, handler: Option<EndHandler>) {
        self.inner.borrow_mut().end = handler;
        self.dispatch();
    }

    fn on_error(&self, handler: Option<ErrorHandler>) {
        self.inner.borrow_mut().error.set(handler);
    }

    fn pause(&self) {
        trace!("read stream paused");
        self.inner.borrow_mut().paused = true;
    }

    fn resume(&self) {
        {
            let mut inner = self.inner.borrow_mut();
            if !inner.paused {
                return;
            }
            inner.paused = false;
        }
        trace!("read stream resumed");
        self.dispatch();
    }
}

struct WriteInner {
    chunks: Vec<Buffer>,
    pending: usize,
    max_queue_size: usize,
    full: bool,
    drain: Slot<DrainHandler>,
    error: Slot<ErrorHandler>,
}

/// In-memory consumer of [`Buffer`] chunks.
///
/// Written chunks are recorded in delivery order and counted against the
/// write queue until the driving side acknowledges consumption with
/// [`consume`](Self::consume). The queue reports full at the high-water
/// mark and fires the drain handler when it falls back to the low-water
/// mark (half the high-water mark).
///
/// Cloning returns another handle to the same stream.
#[derive(Clone)]
pub struct BufferWriteStream {
    inner: Rc<RefCell<WriteInner>>,
}

impl BufferWriteStream {
    pub fn new() -> Self {
        Self {
            inner: Rc::new(RefCell::new(WriteInner {
                chunks: Vec::new(),
                pending: 0,
                max_queue_size: DEFAULT_WRITE_QUEUE_MAX_SIZE,
                full: false,
                drain: Slot::new(),
                error: Slot::new(),
            })),
        }
    }

    /// Acknowledge that `n` bytes of queued data were consumed
    /// downstream. Fires the drain handler on the full-to-drained
    /// transition.
    pub fn consume(&self, n: usize) {
        let drained = {
            let mut inner = self.inner.borrow_mut();
            inner.pending = inner.pending.saturating_sub(n);
            if inner.full && inner.pending <= inner.max_queue_size / 2 {
                inner.full = false;
                true
            } else {
                false
            }
        };
        if drained {
            trace!("write queue drained");
            let taken = self.inner.borrow_mut().drain.take();
            if let Some((mut h, epoch)) = taken {
                h();
                self.inner.borrow_mut().drain.restore(h, epoch);
            }
        }
    }

    /// Report an asynchronous failure to the registered error handler.
    pub fn fail(&self, error: Error) {
        let taken = self.inner.borrow_mut().error.take();
        if let Some((mut h, epoch)) = taken {
            h(error);
            self.inner.borrow_mut().error.restore(h, epoch);
        }
    }

    /// Bytes written and not yet consumed.
    pub fn queue_size(&self) -> usize {
        self.inner.borrow().pending
    }

    /// Number of chunks written so far.
    pub fn chunks_written(&self) -> usize {
        self.inner.borrow().chunks.len()
    }

    /// Concatenation of every chunk written so far, in delivery order.
    pub fn contents(&self) -> Buffer {
        let inner = self.inner.borrow();
        let mut out = Buffer::with_capacity(inner.chunks.iter().map(Buffer::len).sum());
        for chunk in &inner.chunks {
            out.append_buffer(chunk);
        }
        out
    }

    /// Lengths of the chunks written so far, preserving boundaries.
    pub fn chunk_lengths(&self) -> Vec<usize> {
        self.inner.borrow().chunks.iter().map(Buffer::len).collect()
    }
}

impl Default for BufferWriteStream {
    fn default() -> Self {
        Self::new()
    }
}

impl WriteStream for BufferWriteStream {
    fn write(&self, chunk: Buffer) {
        let mut inner = self.inner.borrow_mut();
        inner.pending += chunk.len();
        inner.chunks.push(chunk);
        if inner.pending >= inner.max_queue_size {
            inner.full = true;
        }
    }

    fn set_write_queue_max_size(&self, size: usize) {
        let mut inner = self.inner.borrow_mut();
        inner.max_queue_size = size;
        inner.full = inner.pending >= size;
    }

    fn write_queue_full(&self) -> bool {
        self.inner.borrow().full
    }

    fn on_drain(&self, handler: Option<DrainHandler>) {
        self.inner.borrow_mut().drain.set(handler);
    }

    fn on_error(&self, handler: Option<ErrorHandler>) {
        self.inner.borrow_mut().error.set(handler);
    }
}
