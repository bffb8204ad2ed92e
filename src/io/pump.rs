use crate::future::Promise;
use crate::io::stream::{ReadStream, WriteStream};
use std::cell::Cell;
use std::rc::Rc;
use tracing::{debug, trace};

/// Flow-control relay between one [`ReadStream`] and one [`WriteStream`].
///
/// While running, every chunk the source produces is forwarded to the
/// sink unchanged, in order, preserving chunk boundaries. When the sink
/// reports its write queue full the pump pauses the source, and resumes
/// it on the sink's drain notification. The pump owns none of the data it
/// forwards.
///
/// The pump stops by itself when the source signals end-of-stream or
/// either side reports an error; [`completion`](Pump::completion) is
/// resolved with the byte total on end-of-stream and failed with the
/// reported error otherwise. Ending or closing the sink is left to the
/// pump's owner. A stalled sink that never drains keeps the source paused
/// indefinitely; that is the backpressure contract, not a timeout case.
///
/// ```
/// use bytepump::{Buffer, BufferReadStream, BufferWriteStream, Pump};
///
/// let source = BufferReadStream::new();
/// let sink = BufferWriteStream::new();
/// let pump = Pump::new(source.clone(), sink.clone());
/// pump.start();
///
/// source.push(Buffer::from_slice(b"hello "));
/// source.push(Buffer::from_slice(b"world"));
/// source.end();
///
/// assert_eq!(sink.contents().get_bytes(), b"hello world");
/// assert_eq!(pump.completion().result().unwrap(), 11);
/// ```
pub struct Pump<R, W> {
    source: R,
    sink: W,
    shared: Rc<Shared>,
    completion: Promise<u64>,
}

struct Shared {
    running: Cell<bool>,
    finished: Cell<bool>,
    pumped: Cell<u64>,
}

impl<R, W> Pump<R, W>
where
    R: ReadStream + Clone + 'static,
    W: WriteStream + Clone + 'static,
{
    /// Bind a pump to a producer/consumer pair. The pump is idle until
    /// [`start`](Pump::start).
    pub fn new(source: R, sink: W) -> Self {
        Self {
            source,
            sink,
            shared: Rc::new(Shared {
                running: Cell::new(false),
                finished: Cell::new(false),
                pumped: Cell::new(0),
            }),
            completion: Promise::new(),
        }
    }

    /// Apply a high-water mark to the sink's write queue before starting.
    pub fn with_write_queue_max_size(self, size: usize) -> Self {
        self.sink.set_write_queue_max_size(size);
        self
    }

    /// Start relaying. No-op while already running, and no-op once the
    /// pump has finished (its completion is already resolved).
    pub fn start(&self) {
        if self.shared.finished.get() || self.shared.running.replace(true) {
            return;
        }
        debug!("pump started");

        let data_source = self.source.clone();
        let data_sink = self.sink.clone();
        let shared = self.shared.clone();
        self.source.on_data(Some(Box::new(move |chunk| {
            let len = chunk.len() as u64;
            trace!(len, "forwarding chunk");
            data_sink.write(chunk);
            shared.pumped.set(shared.pumped.get() + len);
            if data_sink.write_queue_full() {
                trace!("sink full, pausing source");
                data_source.pause();
            }
        })));

        let drain_source = self.source.clone();
        self.sink.on_drain(Some(Box::new(move || {
            trace!("sink drained, resuming source");
            drain_source.resume();
        })));

        let end_source = self.source.clone();
        let end_sink = self.sink.clone();
        let shared = self.shared.clone();
        let completion = self.completion.clone();
        self.source.on_end(Some(Box::new(move || {
            detach(&end_source, &end_sink);
            shared.running.set(false);
            if !shared.finished.replace(true) {
                let total = shared.pumped.get();
                debug!(total, "source ended, pump finished");
                completion.succeed(total);
            }
        })));

        let err_source = self.source.clone();
        let err_sink = self.sink.clone();
        let shared = self.shared.clone();
        let completion = self.completion.clone();
        self.source.on_error(Some(Box::new(move |err| {
            detach(&err_source, &err_sink);
            shared.running.set(false);
            if !shared.finished.replace(true) {
                debug!(%err, "source failed, pump finished");
                completion.fail(err);
            }
        })));

        let err_source = self.source.clone();
        let err_sink = self.sink.clone();
        let shared = self.shared.clone();
        let completion = self.completion.clone();
        self.sink.on_error(Some(Box::new(move |err| {
            detach(&err_source, &err_sink);
            shared.running.set(false);
            if !shared.finished.replace(true) {
                debug!(%err, "sink failed, pump finished");
                completion.fail(err);
            }
        })));
    }

    /// Stop relaying and deregister from both streams. Chunks the
    /// producer emits afterwards stay with the producer. The pump can be
    /// started again unless it already finished.
    pub fn stop(&self) {
        if !self.shared.running.replace(false) {
            return;
        }
        detach(&self.source, &self.sink);
        debug!("pump stopped");
    }

    /// Whether the pump is currently relaying.
    pub fn is_running(&self) -> bool {
        self.shared.running.get()
    }

    /// Total bytes forwarded to the sink so far.
    pub fn bytes_pumped(&self) -> u64 {
        self.shared.pumped.get()
    }

    /// The pump's terminal outcome: the byte total on end-of-stream, or
    /// the first error either stream reported.
    pub fn completion(&self) -> Promise<u64> {
        self.completion.clone()
    }
}

fn detach<R: ReadStream, W: WriteStream>(source: &R, sink: &W) {
    source.on_data(None);
    source.on_end(None);
    ReadStream::on_error(source, None);
    sink.on_drain(None);
    WriteStream::on_error(sink, None);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::buffer::Buffer;
    use crate::io::memory::{BufferReadStream, BufferWriteStream};
    use easy_error::err_msg;

    fn chunk(n: usize, fill: u8) -> Buffer {
        Buffer::from_slice(&vec![fill; n])
    }

    #[test]
    fn forwards_in_order_with_boundaries() {
        let source = BufferReadStream::new();
        let sink = BufferWriteStream::new();
        let pump = Pump::new(source.clone(), sink.clone());
        pump.start();

        source.push(Buffer::from_slice(b"one"));
        source.push(Buffer::from_slice(b"two"));
        source.push(Buffer::from_slice(b"three"));
        assert_eq!(sink.contents().get_bytes(), b"onetwothree");
        assert_eq!(sink.chunk_lengths(), vec![3, 3, 5]);
        assert_eq!(pump.bytes_pumped(), 11);
    }

    #[test]
    fn backpressure_pause_and_resume() {
        let source = BufferReadStream::new();
        let sink = BufferWriteStream::new();
        let pump = Pump::new(source.clone(), sink.clone()).with_write_queue_max_size(30);
        pump.start();

        // High-water mark of 30 bytes is reached after chunk 3.
        for i in 0..10 {
            source.push(chunk(10, i));
        }
        assert!(source.is_paused());
        assert_eq!(sink.chunks_written(), 3);
        assert_eq!(source.queued(), 7);

        // Draining to the low-water mark resumes the source; the sink
        // fills again after three more chunks, and so on.
        sink.consume(15);
        assert_eq!(sink.chunks_written(), 5);
        assert!(source.is_paused());

        while sink.queue_size() > 0 {
            sink.consume(sink.queue_size());
        }
        source.end();

        assert_eq!(sink.chunks_written(), 10);
        assert_eq!(sink.chunk_lengths(), vec![10; 10]);
        let contents = sink.contents();
        for i in 0..10u8 {
            assert_eq!(contents.get_u8(i as usize * 10).unwrap(), i);
        }
        assert_eq!(pump.completion().result().unwrap(), 100);
    }

    #[test]
    fn end_of_stream_resolves_completion() {
        let source = BufferReadStream::new();
        let sink = BufferWriteStream::new();
        let pump = Pump::new(source.clone(), sink.clone());
        pump.start();

        source.push(Buffer::from_slice(b"payload"));
        source.end();
        assert!(!pump.is_running());
        assert_eq!(pump.completion().result().unwrap(), 7);
        // The sink is untouched by the pump's shutdown.
        assert_eq!(sink.contents().get_bytes(), b"payload");
    }

    #[test]
    fn source_error_fails_completion() {
        let source = BufferReadStream::new();
        let sink = BufferWriteStream::new();
        let pump = Pump::new(source.clone(), sink.clone());
        pump.start();

        source.push(Buffer::from_slice(b"partial"));
        source.fail(err_msg("connection reset"));
        assert!(!pump.is_running());
        let completion = pump.completion();
        assert!(completion.failed());
        assert_eq!(completion.error().unwrap().to_string(), "connection reset");
    }

    #[test]
    fn sink_error_fails_completion() {
        let source = BufferReadStream::new();
        let sink = BufferWriteStream::new();
        let pump = Pump::new(source.clone(), sink.clone());
        pump.start();

        sink.fail(err_msg("disk full"));
        assert!(!pump.is_running());
        assert_eq!(
            pump.completion().error().unwrap().to_string(),
            "disk full"
        );
    }

    #[test]
    fn start_is_idempotent() {
        let source = BufferReadStream::new();
        let sink = BufferWriteStream::new();
        let pump = Pump::new(source.clone(), sink.clone());
        pump.start();
        pump.start();

        source.push(Buffer::from_slice(b"once"));
        assert_eq!(sink.chunks_written(), 1);
        assert_eq!(pump.bytes_pumped(), 4);
    }

    #[test]
    fn stop_detaches_and_start_reattaches() {
        let source = BufferReadStream::new();
        let sink = BufferWriteStream::new();
        let pump = Pump::new(source.clone(), sink.clone());
        pump.start();

        source.push(Buffer::from_slice(b"ab"));
        pump.stop();
        assert!(!pump.is_running());
        source.push(Buffer::from_slice(b"cd"));
        // The stopped pump leaves the chunk with the producer.
        assert_eq!(sink.chunks_written(), 1);
        assert_eq!(source.queued(), 1);

        pump.start();
        assert_eq!(sink.contents().get_bytes(), b"abcd");
        assert_eq!(pump.bytes_pumped(), 4);
    }

    #[test]
    fn start_after_finish_is_a_no_op() {
        let source = BufferReadStream::new();
        let sink = BufferWriteStream::new();
        let pump = Pump::new(source.clone(), sink.clone());
        pump.start();
        source.end();
        assert!(pump.completion().succeeded());

        pump.start();
        assert!(!pump.is_running());
    }
}
