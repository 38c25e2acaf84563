//! AT transaction engine
//!
//! One call to [`TransactionEngine::execute`] is exactly one write followed
//! by one bounded read window:
//!
//! ```text
//! Idle -> Writing -> Accumulating -> Classifying -> Done
//!            |             |
//!            +-> Done(err) +-> Done(err), after classifying partial bytes
//! ```
//!
//! The accumulator runs on its own tokio task so the deadline can stop it
//! from outside while a read is pending. The transport and the buffer are
//! moved into that task and come back through its join handle, so each has
//! a single owner at all times and the buffer is only inspected after the
//! join.

use crate::accumulator::{accumulate, Accumulated};
use crate::buffer::{AccumulationBuffer, DEFAULT_BUFFER_CAPACITY};
use crate::deadline::Deadline;
use at_core::{classify, AtError, AtResponse, AtResult, TransactionError};
use at_transport::StreamAccessor;
use std::time::Duration;

/// Engine settings
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EngineSettings {
    /// Capacity of the per-transaction accumulation buffer
    pub buffer_capacity: usize,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            buffer_capacity: DEFAULT_BUFFER_CAPACITY,
        }
    }
}

/// Runs AT command/response transactions over an exclusively owned
/// transport
///
/// If the accumulator task panics, or the `execute` future is dropped while
/// accumulating, the transport is lost and every later call fails with
/// [`AtError::NotConnected`]. A dropped `execute` also cancels its deadline,
/// so the accumulator stops and releases the transport right away.
#[derive(Debug)]
pub struct TransactionEngine<T> {
    transport: Option<T>,
    settings: EngineSettings,
}

impl<T> TransactionEngine<T>
where
    T: StreamAccessor + 'static,
{
    pub fn new(transport: T) -> Self {
        Self::with_settings(transport, EngineSettings::default())
    }

    pub fn with_settings(transport: T, settings: EngineSettings) -> Self {
        Self {
            transport: Some(transport),
            settings,
        }
    }

    pub fn settings(&self) -> &EngineSettings {
        &self.settings
    }

    pub fn set_settings(&mut self, settings: EngineSettings) {
        self.settings = settings;
    }

    pub fn transport(&self) -> AtResult<&T> {
        self.transport.as_ref().ok_or(AtError::NotConnected)
    }

    pub fn transport_mut(&mut self) -> AtResult<&mut T> {
        self.transport.as_mut().ok_or(AtError::NotConnected)
    }

    /// Give the transport back, if the engine still holds it
    pub fn into_transport(self) -> Option<T> {
        self.transport
    }

    /// Send `command` and collect the reply for `timeout`
    ///
    /// `command` is written verbatim, terminator included. The call always
    /// takes the full `timeout` unless the write or a read fails fatally.
    ///
    /// # Errors
    /// - Write failure: the error with a response holding no data.
    /// - Fatal read failure or buffer overflow: the error with a response
    ///   classified from the bytes received before the failure.
    ///
    /// A reply that is empty or not recognized is not an error; the
    /// response simply has no data.
    pub async fn execute(
        &mut self,
        command: &str,
        timeout: Duration,
    ) -> Result<AtResponse, TransactionError> {
        let fail = |e: AtError| TransactionError::new(AtResponse::empty(command), e);

        let transport = self.transport_mut().map_err(fail)?;
        log::debug!("Writing {:?}", command);
        if let Err(e) = transport.write_all(command.as_bytes()).await {
            log::warn!("Failed to write {:?}: {}", command, e);
            return Err(fail(e));
        }

        let (buffer, outcome) = self.accumulate(timeout).await.map_err(fail)?;
        log::debug!(
            "Accumulated {} bytes in {} reads for {:?}",
            outcome.received,
            outcome.reads,
            command
        );

        let classification = classify(command, buffer.filled());
        log::debug!(
            "Classified reply to {:?} as {:?}: {:?}",
            command,
            classification.kind,
            classification.lines
        );

        let response = AtResponse::new(command, classification.lines);
        match outcome.error {
            Some(e) => Err(TransactionError::new(response, e)),
            None => Ok(response),
        }
    }

    /// Discard unsolicited bytes until the line goes quiet
    ///
    /// Reads one byte at a time and stops at the first read that delivers
    /// nothing, whether it returns 0 or times out.
    ///
    /// # Returns
    /// Number of bytes discarded
    ///
    /// # Errors
    /// Non-recoverable read errors are returned.
    pub async fn drain(&mut self) -> AtResult<usize> {
        let transport = self.transport_mut()?;
        let mut byte = [0u8; 1];
        let mut discarded = 0;

        loop {
            let delivered = match transport.read(&mut byte).await {
                Ok(n) => n,
                Err(e) if e.is_timeout() => e.transferred(),
                Err(e) => return Err(e),
            };
            if delivered == 0 {
                break;
            }
            discarded += delivered;
        }

        if discarded > 0 {
            log::debug!("Drained {} unsolicited bytes", discarded);
        }
        Ok(discarded)
    }

    async fn accumulate(&mut self, timeout: Duration) -> AtResult<(AccumulationBuffer, Accumulated)> {
        let mut transport = self.transport.take().ok_or(AtError::NotConnected)?;
        let mut buffer = AccumulationBuffer::new(self.settings.buffer_capacity);

        let deadline = Deadline::start(timeout);
        let cancel = deadline.token();
        let task = tokio::spawn(async move {
            let outcome = accumulate(&mut transport, &mut buffer, &cancel).await;
            (transport, buffer, outcome)
        });

        let (transport, buffer, outcome) = task
            .await
            .map_err(|e| AtError::Task(e.to_string()))?;
        self.transport = Some(transport);
        Ok((buffer, outcome))
    }
}
