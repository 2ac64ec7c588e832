//! # Print Worker
//!
//! A background task that owns one [`LabelSession`] and prints requests one
//! at a time. Front ends submit [`PrintRequest`]s over a channel and watch
//! [`PrintEvent`]s on another; nothing else is shared.
//!
//! ```text
//!   submit() ──► [requests] ──► worker task ──► spawn_blocking(session.run)
//!                                    │
//!   events  ◄── [events] ◄───────────┘  Started / Finished
//! ```
//!
//! One worker per port serializes all jobs for that printer. Image
//! processing and the blocking serial writes run on tokio's blocking pool
//! so the runtime stays responsive.

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{Instrument, Span};

use crate::error::LabelError;
use crate::session::{LabelSession, PrintOutcome, PrintRequest};
use crate::transport::PortOpener;

/// Queued requests before `submit` waits.
const QUEUE_DEPTH: usize = 16;

/// Progress reported by the worker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PrintEvent {
    Started { id: u64 },
    Finished { id: u64, outcome: PrintOutcome },
}

/// Handle to a running print worker.
pub struct PrintWorker {
    requests: mpsc::Sender<(u64, PrintRequest)>,
    next_id: u64,
    handle: JoinHandle<()>,
}

impl PrintWorker {
    /// Start a worker that owns `session`. Returns the handle and the event
    /// stream.
    pub fn spawn<O>(session: LabelSession<O>) -> (Self, mpsc::Receiver<PrintEvent>)
    where
        O: PortOpener + Send + 'static,
    {
        Self::spawn_with_span(session, tracing::info_span!("print_worker"))
    }

    pub fn spawn_with_span<O>(
        session: LabelSession<O>,
        span: Span,
    ) -> (Self, mpsc::Receiver<PrintEvent>)
    where
        O: PortOpener + Send + 'static,
    {
        let (request_tx, request_rx) = mpsc::channel(QUEUE_DEPTH);
        let (event_tx, event_rx) = mpsc::channel(QUEUE_DEPTH);
        let handle = tokio::spawn(run(session, request_rx, event_tx).instrument(span));
        (
            Self {
                requests: request_tx,
                next_id: 1,
                handle,
            },
            event_rx,
        )
    }

    /// Queue a request. Returns its id, echoed in the events.
    pub async fn submit(&mut self, request: PrintRequest) -> Result<u64, LabelError> {
        let id = self.next_id;
        self.requests
            .send((id, request))
            .await
            .map_err(|_| LabelError::Task("print worker has stopped".to_string()))?;
        self.next_id += 1;
        Ok(id)
    }

    /// Stop accepting requests and wait for queued ones to finish.
    pub async fn shutdown(self) -> Result<(), LabelError> {
        drop(self.requests);
        self.handle
            .await
            .map_err(|e| LabelError::Task(format!("Task error: {}", e)))
    }
}

async fn run<O>(
    mut session: LabelSession<O>,
    mut requests: mpsc::Receiver<(u64, PrintRequest)>,
    events: mpsc::Sender<PrintEvent>,
) where
    O: PortOpener + Send + 'static,
{
    while let Some((id, request)) = requests.recv().await {
        tracing::debug!(id, "print job started");
        // A closed event channel only means nobody is listening
        let _ = events.send(PrintEvent::Started { id }).await;

        let result = tokio::task::spawn_blocking(move || {
            let outcome = session.run(request);
            (session, outcome)
        })
        .await;

        match result {
            Ok((returned, outcome)) => {
                session = returned;
                tracing::debug!(id, success = outcome.success, "print job finished");
                let _ = events.send(PrintEvent::Finished { id, outcome }).await;
            }
            Err(e) => {
                // The session was lost with the task; nothing more can print
                tracing::error!(id, error = %e, "print job panicked");
                let outcome = PrintOutcome::failure(format!("Task error: {}", e));
                let _ = events.send(PrintEvent::Finished { id, outcome }).await;
                break;
            }
        }
    }
    tracing::debug!("print worker stopped");
}
