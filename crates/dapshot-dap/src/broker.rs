//! DAP Broker - Manages communication with a debug adapter
//!
//! The broker handles:
//! - Sequence number generation
//! - Request/response correlation by `request_seq`
//! - Forwarding events, in arrival order, to the session
//! - Declining reverse requests from the adapter
//!
//! A single actor task owns the write half, the pending-request table and the
//! sequence counter. A reader task decodes frames and hands them to the actor,
//! so every map mutation happens on one task without locks.

use crate::codec::{read_message, write_message};
use crate::constants::framing::INCOMING_CHANNEL_CAPACITY;
use crate::{Error, Event, ProtocolMessage, Request, Response, Result};
use std::collections::HashMap;
use std::sync::{Arc, OnceLock};
use std::time::Duration;
use tokio::io::{AsyncRead, AsyncWrite, BufReader};
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, info, trace, warn};

/// Channel for sending responses back to request callers
type ResponseSender = oneshot::Sender<Result<Response>>;

/// Events forwarded from the adapter, in arrival order
pub type EventReceiver = mpsc::UnboundedReceiver<Event>;

/// Work submitted to the broker actor
enum Command {
    Request {
        command: String,
        arguments: Option<serde_json::Value>,
        reply: ResponseSender,
    },
}

/// A request that has been written but not yet awaited
#[derive(Debug)]
pub struct PendingResponse {
    command: String,
    rx: oneshot::Receiver<Result<Response>>,
    close_reason: Arc<OnceLock<Error>>,
}

impl PendingResponse {
    /// Command name this response belongs to
    pub fn command(&self) -> &str {
        &self.command
    }

    /// Wait for the response. Dropping without waiting abandons it.
    pub async fn wait(self, timeout: Duration) -> Result<Response> {
        await_response(self.command, self.rx, timeout, &self.close_reason).await
    }
}

/// DAP Broker manages communication with a debug adapter
pub struct DapBroker {
    /// Commands into the actor task
    commands: mpsc::UnboundedSender<Command>,

    /// Set once, when the broker shuts down
    close_reason: Arc<OnceLock<Error>>,

    /// Reader and actor task handles (aborted on drop)
    reader_task: Option<JoinHandle<()>>,
    actor_task: Option<JoinHandle<()>>,
}

impl DapBroker {
    /// Create a broker over the adapter's streams.
    ///
    /// Returns the broker and the receiver for adapter events. The receiver
    /// yields `None` once the broker has closed.
    pub fn new<R, W>(reader: R, writer: W) -> (Self, EventReceiver)
    where
        R: AsyncRead + Send + Unpin + 'static,
        W: AsyncWrite + Send + Unpin + 'static,
    {
        let (commands_tx, commands_rx) = mpsc::unbounded_channel();
        let (incoming_tx, incoming_rx) = mpsc::channel(INCOMING_CHANNEL_CAPACITY);
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        let close_reason = Arc::new(OnceLock::new());

        let reader_task = Self::spawn_reader_task(reader, incoming_tx);
        let actor = BrokerActor {
            writer: Box::new(writer),
            pending: HashMap::new(),
            next_seq: 1,
            events: Some(events_tx),
            close_reason: close_reason.clone(),
        };
        let actor_task = tokio::spawn(actor.run(commands_rx, incoming_rx));

        let broker = Self {
            commands: commands_tx,
            close_reason,
            reader_task: Some(reader_task),
            actor_task: Some(actor_task),
        };
        (broker, events_rx)
    }

    /// Send a request and wait up to `timeout` for its response.
    ///
    /// On timeout the pending entry is abandoned; a late response is
    /// discarded by the actor.
    #[tracing::instrument(skip(self, arguments), fields(timeout_ms = timeout.as_millis() as u64))]
    pub async fn send_request(
        &self,
        command: &str,
        arguments: Option<serde_json::Value>,
        timeout: Duration,
    ) -> Result<Response> {
        self.start_request(command, arguments)?.wait(timeout).await
    }

    /// Write a request now and return a handle to await its response later.
    ///
    /// Some adapters only answer `launch` after `configurationDone`.
    pub fn start_request(
        &self,
        command: &str,
        arguments: Option<serde_json::Value>,
    ) -> Result<PendingResponse> {
        if let Some(reason) = self.close_reason.get() {
            return Err(reason.clone());
        }

        let (tx, rx) = oneshot::channel();
        self.commands
            .send(Command::Request {
                command: command.to_string(),
                arguments,
                reply: tx,
            })
            .map_err(|_| self.closed_error())?;

        Ok(PendingResponse {
            command: command.to_string(),
            rx,
            close_reason: self.close_reason.clone(),
        })
    }

    /// True once the connection has closed (EOF, read error, write error)
    pub fn is_closed(&self) -> bool {
        self.close_reason.get().is_some()
    }

    /// Why the broker closed, if it has
    pub fn close_reason(&self) -> Option<&Error> {
        self.close_reason.get()
    }

    fn closed_error(&self) -> Error {
        self.close_reason
            .get()
            .cloned()
            .unwrap_or_else(|| Error::Communication("Broker closed".to_string()))
    }

    /// Spawn background task to decode messages from the adapter
    fn spawn_reader_task<R>(
        reader: R,
        incoming: mpsc::Sender<Result<ProtocolMessage>>,
    ) -> JoinHandle<()>
    where
        R: AsyncRead + Send + Unpin + 'static,
    {
        tokio::spawn(async move {
            debug!("Reader task started");
            let mut buf_reader = BufReader::new(reader);

            loop {
                match read_message(&mut buf_reader).await {
                    Ok(Some(message)) => {
                        if incoming.send(Ok(message)).await.is_err() {
                            break;
                        }
                    }
                    Ok(None) => {
                        info!("Adapter connection closed (EOF received)");
                        let _ = incoming
                            .send(Err(Error::Communication(
                                "Adapter closed the connection".to_string(),
                            )))
                            .await;
                        break;
                    }
                    Err(e) => {
                        info!("Adapter connection error: {}", e);
                        let _ = incoming.send(Err(e)).await;
                        break;
                    }
                }
            }
            debug!("Reader task finished");
        })
    }
}

impl Drop for DapBroker {
    fn drop(&mut self) {
        if let Some(handle) = self.reader_task.take() {
            handle.abort();
        }
        if let Some(handle) = self.actor_task.take() {
            handle.abort();
        }
    }
}

async fn await_response(
    command: String,
    rx: oneshot::Receiver<Result<Response>>,
    timeout: Duration,
    close_reason: &OnceLock<Error>,
) -> Result<Response> {
    match tokio::time::timeout(timeout, rx).await {
        Ok(Ok(response)) => response,
        Ok(Err(_)) => Err(close_reason
            .get()
            .cloned()
            .unwrap_or_else(|| Error::Communication("Response channel closed".to_string()))),
        Err(_) => {
            let timeout_ms = timeout.as_millis() as u64;
            warn!(command = %command, timeout_ms, "DAP request timed out");
            Err(Error::RequestTimeout {
                command,
                timeout_ms,
            })
        }
    }
}

/// State owned by the actor task
struct BrokerActor {
    writer: Box<dyn AsyncWrite + Send + Unpin>,
    pending: HashMap<i64, ResponseSender>,
    next_seq: i64,
    events: Option<mpsc::UnboundedSender<Event>>,
    close_reason: Arc<OnceLock<Error>>,
}

impl BrokerActor {
    async fn run(
        mut self,
        mut commands: mpsc::UnboundedReceiver<Command>,
        mut incoming: mpsc::Receiver<Result<ProtocolMessage>>,
    ) {
        let reason = loop {
            tokio::select! {
                command = commands.recv() => match command {
                    Some(Command::Request { command, arguments, reply }) => {
                        if let Err(e) = self.send_request(command, arguments, reply).await {
                            break e;
                        }
                    }
                    None => break Error::Communication("Broker dropped".to_string()),
                },
                message = incoming.recv() => match message {
                    Some(Ok(message)) => {
                        if let Err(e) = self.handle_message(message).await {
                            break e;
                        }
                    }
                    Some(Err(e)) => break e,
                    None => break Error::Communication("Adapter reader stopped".to_string()),
                },
            }
        };
        self.close(reason);
    }

    fn next_sequence(&mut self) -> i64 {
        let seq = self.next_seq;
        self.next_seq += 1;
        seq
    }

    async fn send_request(
        &mut self,
        command: String,
        arguments: Option<serde_json::Value>,
        reply: ResponseSender,
    ) -> Result<()> {
        // Drop entries whose callers gave up (timeout or cancellation)
        self.pending.retain(|_, tx| !tx.is_closed());

        let seq = self.next_sequence();
        debug!(seq, command = %command, "Sending DAP request");

        let request = Request {
            seq,
            command,
            arguments,
        };
        self.pending.insert(seq, reply);

        if let Err(e) = write_message(&mut self.writer, &ProtocolMessage::Request(request)).await {
            if let Some(tx) = self.pending.remove(&seq) {
                let _ = tx.send(Err(e.clone()));
            }
            return Err(e);
        }
        Ok(())
    }

    async fn handle_message(&mut self, message: ProtocolMessage) -> Result<()> {
        match message {
            ProtocolMessage::Response(response) => {
                trace!(
                    request_seq = response.request_seq,
                    command = %response.command,
                    "Received response"
                );
                match self.pending.remove(&response.request_seq) {
                    Some(tx) => {
                        if tx.send(Ok(response)).is_err() {
                            debug!("Discarding response - caller no longer waiting");
                        }
                    }
                    None => warn!(
                        request_seq = response.request_seq,
                        command = %response.command,
                        "Discarding response for unknown request (late or duplicate)"
                    ),
                }
            }
            ProtocolMessage::Event(event) => {
                trace!(event = %event.event, "Received event");
                if let Some(events) = &self.events {
                    if events.send(event).is_err() {
                        // Session dropped its receiver; keep serving responses
                        self.events = None;
                    }
                }
            }
            ProtocolMessage::Request(request) => {
                debug!(command = %request.command, "Declining reverse request from adapter");
                let seq = self.next_sequence();
                let response =
                    Response::error(seq, request.seq, request.command, "not supported");
                write_message(&mut self.writer, &ProtocolMessage::Response(response)).await?;
            }
        }
        Ok(())
    }

    fn close(mut self, reason: Error) {
        let _ = self.close_reason.set(reason.clone());
        let failed = self.pending.len();
        for (_, tx) in self.pending.drain() {
            let _ = tx.send(Err(reason.clone()));
        }
        // Closing the event channel tells the session no more events will come
        self.events = None;
        info!(failed_requests = failed, reason = %reason, "DAP broker closed");
    }
}
