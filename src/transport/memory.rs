//! In-memory ports: every write is recorded instead of reaching a device.
//!
//! Clones share state, so a caller can hand one clone to a
//! [`SerialConnection`](super::SerialConnection) and inspect the traffic
//! through another.

use std::io::{self, Write};
use std::sync::{Arc, Mutex, MutexGuard};

use super::serial::{PortOpener, PortSettings};
use crate::error::ConnectionError;

#[derive(Debug, Default)]
struct State {
    opens: usize,
    open: bool,
    /// Flushes that carried data, including failed ones.
    attempts: usize,
    writes: Vec<Vec<u8>>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
enum Behavior {
    #[default]
    Normal,
    Unavailable,
    FailingWrites,
    /// The nth write (1-based) fails.
    FailOnWrite(usize),
}

/// Opener whose ports record writes in memory.
#[derive(Debug, Clone, Default)]
pub struct MemoryPorts {
    state: Arc<Mutex<State>>,
    behavior: Behavior,
}

impl MemoryPorts {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every open fails with `PortUnavailable`.
    pub fn unavailable() -> Self {
        Self {
            behavior: Behavior::Unavailable,
            ..Self::default()
        }
    }

    /// Opens succeed, every write fails.
    pub fn failing_writes() -> Self {
        Self {
            behavior: Behavior::FailingWrites,
            ..Self::default()
        }
    }

    /// Opens succeed and writes are recorded until the `n`th one
    /// (1-based), which fails. Later writes go through again.
    pub fn failing_write(n: usize) -> Self {
        Self {
            behavior: Behavior::FailOnWrite(n),
            ..Self::default()
        }
    }

    fn state(&self) -> MutexGuard<'_, State> {
        // A poisoned lock only means a test thread panicked mid-write
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// How many times a port was opened.
    pub fn open_count(&self) -> usize {
        self.state().opens
    }

    /// Whether a port handle is currently alive.
    pub fn is_open(&self) -> bool {
        self.state().open
    }

    /// Each flushed write, in order.
    pub fn writes(&self) -> Vec<Vec<u8>> {
        self.state().writes.clone()
    }

    /// All bytes written, concatenated.
    pub fn bytes(&self) -> Vec<u8> {
        self.state().writes.concat()
    }
}

impl PortOpener for MemoryPorts {
    type Port = MemoryPort;

    fn open(&self, settings: &PortSettings) -> Result<MemoryPort, ConnectionError> {
        if self.behavior == Behavior::Unavailable {
            return Err(ConnectionError::PortUnavailable {
                port: settings.port.clone(),
                reason: "no such device".to_string(),
            });
        }
        let mut state = self.state();
        state.opens += 1;
        state.open = true;
        Ok(MemoryPort {
            ports: self.clone(),
            pending: Vec::new(),
        })
    }
}

/// A port opened by [`MemoryPorts`]. Bytes are recorded as one write per flush.
#[derive(Debug)]
pub struct MemoryPort {
    ports: MemoryPorts,
    pending: Vec<u8>,
}

impl Write for MemoryPort {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        if self.ports.behavior == Behavior::FailingWrites {
            return Err(io::Error::new(io::ErrorKind::BrokenPipe, "link dropped"));
        }
        self.pending.extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        if self.pending.is_empty() {
            return Ok(());
        }
        let data = std::mem::take(&mut self.pending);
        let mut state = self.ports.state();
        state.attempts += 1;
        if self.ports.behavior == Behavior::FailOnWrite(state.attempts) {
            return Err(io::Error::new(io::ErrorKind::BrokenPipe, "link dropped"));
        }
        state.writes.push(data);
        Ok(())
    }
}

impl Drop for MemoryPort {
    fn drop(&mut self) {
        self.ports.state().open = false;
    }
}
