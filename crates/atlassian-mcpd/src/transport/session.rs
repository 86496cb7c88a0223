//! Session loop: frames in, concurrent dispatch, one writer out.

use std::collections::HashMap;
use std::io;
use std::sync::{Arc, Mutex, PoisonError};

use serde_json::Value;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncRead, AsyncReadExt, AsyncWrite, BufReader};
use tokio::sync::mpsc;
use tokio::task::{JoinHandle, JoinSet};

use atlassian_mcp_types::ToolResult;

use crate::dispatch::{CancelHandle, Dispatcher, InvocationError, cancellation_pair};

use super::TRANSPORT_TARGET;
use super::errors::DispatchError;
use super::request::{ClientMessage, InvokeRequest, recover_id};
use super::response::{ChannelSink, ServerMessage, write_messages};

/// Maximum size of one request line in bytes, excluding the terminator.
pub const MAX_LINE_BYTES: usize = 1024 * 1024;

/// Messages queued for standard output before senders wait for the writer.
pub const OUTBOUND_CAPACITY: usize = 1024;

/// Command label used when a line never named a command.
const UNREADABLE_REQUEST: &str = "request";

/// Why a session ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEnd {
    /// Standard input reached end of file and in-flight work drained.
    InputClosed,
    /// A termination signal arrived; in-flight work was cancelled.
    Shutdown(i32),
    /// Standard output was closed by the peer or failed.
    OutputClosed,
}

impl SessionEnd {
    /// Process exit status for this ending.
    #[must_use]
    pub fn exit_code(self) -> u8 {
        match self {
            Self::InputClosed => 0,
            Self::Shutdown(signal) => u8::try_from(128 + signal).unwrap_or(1),
            Self::OutputClosed => 141,
        }
    }
}

enum Frame {
    Line(Vec<u8>),
    Oversized(usize),
}

/// Serves JSONL requests from `input` until it closes, a signal arrives on
/// `shutdown`, or `output` fails.
pub async fn serve<R, W>(
    dispatcher: Arc<Dispatcher>,
    input: R,
    output: W,
    mut shutdown: mpsc::Receiver<i32>,
) -> SessionEnd
where
    R: AsyncRead + Unpin + Send + 'static,
    W: AsyncWrite + Unpin + Send + 'static,
{
    let (outbound, queued) = mpsc::channel(OUTBOUND_CAPACITY);
    let mut writer = tokio::spawn(write_messages(output, queued));
    let (reader, mut frames) = spawn_reader(input);
    let mut session = Session {
        dispatcher,
        outbound,
        inflight: JoinSet::new(),
        cancels: Arc::new(Mutex::new(HashMap::new())),
    };
    tracing::info!(target: TRANSPORT_TARGET, "session started");

    let mut input_open = true;
    let mut ending = None;
    loop {
        if !input_open && session.inflight.is_empty() {
            break;
        }
        tokio::select! {
            biased;
            Some(signal) = shutdown.recv(), if ending.is_none() => {
                tracing::info!(target: TRANSPORT_TARGET, signal, "shutdown requested");
                session.cancel_all();
                ending = Some(SessionEnd::Shutdown(signal));
                input_open = false;
            }
            written = &mut writer => {
                log_writer_end(written);
                session.inflight.abort_all();
                reader.abort();
                return SessionEnd::OutputClosed;
            }
            frame = frames.recv(), if input_open => match frame {
                Some(frame) => session.handle(frame).await,
                None => {
                    tracing::debug!(target: TRANSPORT_TARGET, "input closed; draining");
                    input_open = false;
                }
            },
            Some(joined) = session.inflight.join_next() => {
                if let Err(error) = joined {
                    tracing::error!(target: TRANSPORT_TARGET, %error, "invocation task failed");
                }
            }
        }
    }

    reader.abort();
    drop(session);
    let end = ending.unwrap_or(SessionEnd::InputClosed);
    match writer.await {
        Ok(Ok(())) => end,
        written => {
            log_writer_end(written);
            SessionEnd::OutputClosed
        }
    }
}

struct Session {
    dispatcher: Arc<Dispatcher>,
    outbound: mpsc::Sender<ServerMessage>,
    inflight: JoinSet<()>,
    cancels: Arc<Mutex<HashMap<String, CancelHandle>>>,
}

impl Session {
    async fn handle(&mut self, frame: Frame) {
        let line = match frame {
            Frame::Line(line) => line,
            Frame::Oversized(size) => {
                let error = DispatchError::request_too_large(size, MAX_LINE_BYTES);
                tracing::warn!(target: TRANSPORT_TARGET, %error, "request rejected");
                self.reject(
                    Value::Null,
                    UNREADABLE_REQUEST,
                    InvocationError::malformed(error.to_string()),
                )
                .await;
                return;
            }
        };
        match ClientMessage::parse(&line) {
            Ok(ClientMessage::Invoke(request)) => self.invoke(request).await,
            Ok(ClientMessage::Cancel { id }) => self.cancel(&id),
            Err(error) => {
                tracing::warn!(target: TRANSPORT_TARGET, %error, "malformed request");
                self.reject(
                    recover_id(&line),
                    UNREADABLE_REQUEST,
                    InvocationError::malformed(error.to_string()),
                )
                .await;
            }
        }
    }

    async fn invoke(&mut self, request: InvokeRequest) {
        let (id, request) = match request.into_dispatch(self.dispatcher.registry()) {
            Ok(parts) => parts,
            Err(rejected) => {
                self.reject(rejected.id, &rejected.command, rejected.error).await;
                return;
            }
        };
        let key = id.to_string();
        let (handle, cancellation) = cancellation_pair();
        let duplicate = {
            let mut cancels = self.cancels.lock().unwrap_or_else(PoisonError::into_inner);
            let duplicate = cancels.contains_key(&key);
            if !duplicate {
                cancels.insert(key.clone(), handle);
            }
            duplicate
        };
        if duplicate {
            self.reject(
                id,
                &request.command,
                InvocationError::malformed(format!("id {key} is already in flight")),
            )
            .await;
            return;
        }

        let dispatcher = Arc::clone(&self.dispatcher);
        let outbound = self.outbound.clone();
        let cancels = Arc::clone(&self.cancels);
        self.inflight.spawn(async move {
            let sink = Arc::new(ChannelSink::new(id.clone(), outbound.clone()));
            let result = dispatcher.dispatch(request, sink, cancellation).await;
            cancels
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .remove(&key);
            send(&outbound, id, result).await;
        });
    }

    fn cancel(&self, id: &Value) {
        let key = id.to_string();
        let cancels = self.cancels.lock().unwrap_or_else(PoisonError::into_inner);
        match cancels.get(&key) {
            Some(handle) => {
                tracing::debug!(target: TRANSPORT_TARGET, id = %key, "cancelling invocation");
                handle.cancel();
            }
            None => {
                tracing::debug!(target: TRANSPORT_TARGET, id = %key, "cancel for unknown id ignored");
            }
        }
    }

    fn cancel_all(&self) {
        let cancels = self.cancels.lock().unwrap_or_else(PoisonError::into_inner);
        for handle in cancels.values() {
            handle.cancel();
        }
    }

    async fn reject(&self, id: Value, command: &str, error: InvocationError) {
        let sink = Arc::new(ChannelSink::new(id.clone(), self.outbound.clone()));
        let result = self.dispatcher.reject(command, error, sink, None);
        send(&self.outbound, id, result).await;
    }
}

async fn send(outbound: &mpsc::Sender<ServerMessage>, id: Value, result: ToolResult<Value>) {
    let message = ServerMessage::Result { id, result };
    if outbound.send(message).await.is_err() {
        tracing::debug!(target: TRANSPORT_TARGET, "writer gone; result dropped");
    }
}

fn log_writer_end(written: Result<Result<(), DispatchError>, tokio::task::JoinError>) {
    match written {
        Ok(Ok(())) => {}
        Ok(Err(error)) if error.is_broken_pipe() => {
            tracing::info!(target: TRANSPORT_TARGET, "output closed by peer");
        }
        Ok(Err(error)) => {
            tracing::error!(target: TRANSPORT_TARGET, %error, "writing output failed");
        }
        Err(error) => {
            tracing::error!(target: TRANSPORT_TARGET, %error, "writer task failed");
        }
    }
}

fn spawn_reader<R>(input: R) -> (JoinHandle<()>, mpsc::Receiver<Frame>)
where
    R: AsyncRead + Unpin + Send + 'static,
{
    let (frames, received) = mpsc::channel(16);
    let task = tokio::spawn(async move {
        let mut reader = BufReader::new(input);
        loop {
            match read_frame(&mut reader).await {
                Ok(Some(frame)) => {
                    if frames.send(frame).await.is_err() {
                        break;
                    }
                }
                Ok(None) => break,
                Err(error) => {
                    tracing::error!(target: TRANSPORT_TARGET, %error, "reading input failed");
                    break;
                }
            }
        }
    });
    (task, received)
}

/// Reads one line of at most [`MAX_LINE_BYTES`]. Longer lines are skipped
/// up to their terminator and reported with their size.
async fn read_frame<R>(reader: &mut R) -> io::Result<Option<Frame>>
where
    R: AsyncBufRead + Unpin,
{
    let mut line = Vec::new();
    let limit = u64::try_from(MAX_LINE_BYTES + 1).unwrap_or(u64::MAX);
    let read = (&mut *reader).take(limit).read_until(b'\n', &mut line).await?;
    if read == 0 {
        return Ok(None);
    }
    if line.ends_with(b"\n") || line.len() <= MAX_LINE_BYTES {
        return Ok(Some(Frame::Line(line)));
    }

    let mut size = line.len();
    loop {
        let buffer = reader.fill_buf().await?;
        if buffer.is_empty() {
            break;
        }
        match buffer.iter().position(|byte| *byte == b'\n') {
            Some(end) => {
                size += end;
                reader.consume(end + 1);
                break;
            }
            None => {
                let consumed = buffer.len();
                size += consumed;
                reader.consume(consumed);
            }
        }
    }
    Ok(Some(Frame::Oversized(size)))
}
