//! Deadline-bounded accumulation of reply bytes
//!
//! AT devices do not mark the end of a reply. The accumulator therefore
//! keeps reading until the transaction deadline fires, treating the
//! transport's own per-read timeouts as "nothing yet" rather than as
//! failures. Only a non-recoverable read error ends the loop early.

use crate::buffer::AccumulationBuffer;
use at_core::AtError;
use at_transport::StreamAccessor;
use std::io;
use tokio_util::sync::CancellationToken;

/// How the accumulation loop ended
#[derive(Debug)]
pub struct Accumulated {
    /// Total bytes collected
    pub received: usize,
    /// Number of `read` calls issued
    pub reads: usize,
    /// Non-recoverable error that ended the loop, if any
    pub error: Option<AtError>,
}

/// Read from `transport` into `buffer` until `cancel` fires
///
/// Each iteration checks cancellation first, then issues one read into the
/// unfilled part of the buffer. Cancellation also interrupts a read that is
/// already in flight.
///
/// - `Ok(n)`: the offset advances by `n` and the loop continues.
/// - timeout-class error: any bytes it carries are kept and the loop
///   continues.
/// - any other error: recorded, loop exits.
/// - `Ok(0)` from a transport that reports itself closed: end of stream,
///   recorded as an `UnexpectedEof` connection error, loop exits.
///
/// Once the buffer is full, further reads go to a one-byte probe. Any byte
/// arriving there ends the loop with [`AtError::BufferOverflow`]; the bytes
/// already in the buffer are kept.
pub async fn accumulate<S>(
    transport: &mut S,
    buffer: &mut AccumulationBuffer,
    cancel: &CancellationToken,
) -> Accumulated
where
    S: StreamAccessor + ?Sized,
{
    let mut probe = [0u8; 1];
    let mut reads = 0;
    let mut error = None;

    loop {
        if cancel.is_cancelled() {
            break;
        }

        let full = buffer.is_full();
        let target = if full { &mut probe[..] } else { buffer.unfilled_mut() };

        reads += 1;
        let result = tokio::select! {
            biased;
            _ = cancel.cancelled() => break,
            result = transport.read(target) => result,
        };

        let delivered = match result {
            Ok(n) => n,
            Err(e) if e.is_timeout() => {
                log::trace!("Read timed out after {} bytes, continuing", e.transferred());
                e.transferred()
            }
            Err(e) => {
                log::warn!("Read failed after {} bytes: {}", buffer.len(), e);
                error = Some(e);
                break;
            }
        };

        if full && delivered > 0 {
            log::warn!("Reply exceeds buffer capacity of {} bytes", buffer.capacity());
            error = Some(AtError::BufferOverflow {
                capacity: buffer.capacity(),
            });
            break;
        }

        if delivered == 0 {
            if transport.is_closed() {
                log::warn!("Transport closed after {} bytes", buffer.len());
                error = Some(AtError::Connection(io::Error::new(
                    io::ErrorKind::UnexpectedEof,
                    "transport closed during accumulation",
                )));
                break;
            }
            // Nothing arrived; give the deadline timer a chance to run
            tokio::task::yield_now().await;
            continue;
        }

        log::trace!("Read {} bytes", delivered);
        buffer.advance(delivered);
    }

    Accumulated {
        received: buffer.len(),
        reads,
        error,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::deadline::Deadline;
    use at_transport::{MockTransport, ReadStep};
    use std::time::{Duration, Instant};

    const WINDOW: Duration = Duration::from_millis(60);

    async fn run(transport: &mut MockTransport, capacity: usize) -> (AccumulationBuffer, Accumulated) {
        let mut buffer = AccumulationBuffer::new(capacity);
        let deadline = Deadline::start(WINDOW);
        let outcome = accumulate(transport, &mut buffer, &deadline.token()).await;
        (buffer, outcome)
    }

    #[tokio::test]
    async fn test_fragments_accumulate_until_deadline() {
        let mut transport = MockTransport::new();
        transport.push_read(ReadStep::data("+NA"));
        transport.push_read(ReadStep::Stall(Duration::from_millis(5)));
        transport.push_read(ReadStep::data("ME:F"));
        transport.push_read(ReadStep::data("OO\r\n"));

        let started = Instant::now();
        let (buffer, outcome) = run(&mut transport, 256).await;

        assert!(started.elapsed() >= WINDOW);
        assert!(outcome.error.is_none());
        assert_eq!(outcome.received, 11);
        assert_eq!(buffer.filled(), b"+NAME:FOO\r\n");
    }

    #[tokio::test]
    async fn test_timeout_class_errors_do_not_terminate() {
        let mut transport = MockTransport::new();
        transport.push_read(ReadStep::timeout_with("O"));
        transport.push_read(ReadStep::Stall(Duration::from_millis(1)));
        transport.push_read(ReadStep::timeout_with(""));
        transport.push_read(ReadStep::data("K\r\n"));

        let (buffer, outcome) = run(&mut transport, 256).await;

        assert!(outcome.error.is_none());
        assert_eq!(buffer.filled(), b"OK\r\n");
        // Idle reads keep happening after the script runs dry
        assert!(outcome.reads > 4);
    }

    #[tokio::test]
    async fn test_fatal_error_ends_loop_early() {
        let mut transport = MockTransport::new();
        transport.push_read(ReadStep::data("+NAME:"));
        transport.push_read(ReadStep::Fail(io::ErrorKind::ConnectionReset));
        transport.push_read(ReadStep::data("FOO\r\n"));

        let started = Instant::now();
        let (buffer, outcome) = run(&mut transport, 256).await;

        assert!(started.elapsed() < WINDOW);
        assert!(matches!(outcome.error, Some(AtError::Connection(_))));
        assert_eq!(buffer.filled(), b"+NAME:");
        assert_eq!(outcome.reads, 2);
    }

    #[tokio::test]
    async fn test_end_of_stream_is_fatal() {
        let mut transport = MockTransport::new();
        transport.push_read(ReadStep::data("+NAME:F"));
        transport.push_read(ReadStep::Eof);

        let started = Instant::now();
        let (buffer, outcome) = run(&mut transport, 256).await;

        assert!(started.elapsed() < WINDOW);
        assert!(matches!(
            &outcome.error,
            Some(AtError::Connection(e)) if e.kind() == io::ErrorKind::UnexpectedEof
        ));
        assert_eq!(buffer.filled(), b"+NAME:F");
        assert_eq!(outcome.reads, 2);
    }

    #[tokio::test]
    async fn test_deadline_interrupts_in_flight_read() {
        let mut transport = MockTransport::new();
        transport.push_read(ReadStep::data("OK"));
        transport.push_read(ReadStep::Stall(Duration::from_secs(5)));
        transport.push_read(ReadStep::data("\r\n"));

        let started = Instant::now();
        let (buffer, outcome) = run(&mut transport, 256).await;

        assert!(started.elapsed() < Duration::from_secs(1));
        assert!(outcome.error.is_none());
        assert_eq!(buffer.filled(), b"OK");
    }

    #[tokio::test]
    async fn test_blocking_transport_bounded_by_deadline() {
        let mut transport = MockTransport::new();
        transport.set_timeout(None).await.unwrap();

        let started = Instant::now();
        let (buffer, outcome) = run(&mut transport, 256).await;

        assert!(started.elapsed() < Duration::from_secs(1));
        assert!(buffer.is_empty());
        assert!(outcome.error.is_none());
    }

    #[tokio::test]
    async fn test_exact_fit_is_not_overflow() {
        let mut transport = MockTransport::new();
        transport.push_read(ReadStep::data("OK\r\n"));

        let (buffer, outcome) = run(&mut transport, 4).await;

        assert!(outcome.error.is_none());
        assert!(buffer.is_full());
        assert_eq!(buffer.filled(), b"OK\r\n");
    }

    #[tokio::test]
    async fn test_overflow_is_fatal() {
        let mut transport = MockTransport::new();
        transport.push_read(ReadStep::data("+LIST:1\r\n+LIST:2\r\n"));

        let started = Instant::now();
        let (buffer, outcome) = run(&mut transport, 8).await;

        assert!(started.elapsed() < WINDOW);
        assert!(matches!(
            outcome.error,
            Some(AtError::BufferOverflow { capacity: 8 })
        ));
        assert_eq!(buffer.filled(), b"+LIST:1\r");
    }

    #[tokio::test]
    async fn test_already_cancelled() {
        let mut transport = MockTransport::new();
        transport.push_read(ReadStep::data("OK\r\n"));

        let mut buffer = AccumulationBuffer::new(16);
        let cancel = CancellationToken::new();
        cancel.cancel();
        let outcome = accumulate(&mut transport, &mut buffer, &cancel).await;

        assert_eq!(outcome.reads, 0);
        assert!(buffer.is_empty());
        assert_eq!(transport.pending_steps(), 1);
    }
}
