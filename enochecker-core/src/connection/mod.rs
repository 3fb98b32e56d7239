//! Pipelined TCP connection used by checkers to talk to team services
//!
//! A background fill loop reads the socket into a bounded [`Pipe`] while the
//! owning checker sends and receives. Every blocking call observes the task's
//! cancellation token. All failures surface as [`EnoError::Offline`] carrying
//! the connection's scoreboard message; the underlying cause is logged where
//! it happens.
//!
//! ```text
//!   socket ──read──▶ fill loop ──commit──▶ Pipe ──take──▶ receive_exact / receive_until
//!   socket ◀──write_all────────────────────────────────── send
//! ```

mod buffer;
mod scanner;

pub use buffer::{Pipe, PipeStatus};
pub use scanner::DelimiterScanner;

use bytes::{Bytes, BytesMut};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::TcpStream;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn, Instrument};

use crate::config::ConnectionConfig;
use crate::error::{EnoError, EnoResult};

pub const DEFAULT_CONNECT_ERROR: &str = "Could not establish TCP connection";
pub const DEFAULT_CONNECTION_ERROR: &str = "Connection error";

/// Tunables for a single connection
#[derive(Debug, Clone)]
pub struct ConnectOptions {
    pub connect_timeout: Duration,
    pub buffer_capacity: usize,
    pub read_chunk_size: usize,
    /// Per-operation limit on top of the task deadline
    pub io_timeout: Option<Duration>,
    pub connect_error_message: String,
}

impl Default for ConnectOptions {
    fn default() -> Self {
        Self::from(&ConnectionConfig::default())
    }
}

impl From<&ConnectionConfig> for ConnectOptions {
    fn from(config: &ConnectionConfig) -> Self {
        Self {
            connect_timeout: config.connect_timeout,
            buffer_capacity: config.buffer_capacity,
            read_chunk_size: config.read_chunk_size,
            io_timeout: config.io_timeout,
            connect_error_message: DEFAULT_CONNECT_ERROR.to_string(),
        }
    }
}

impl ConnectOptions {
    pub fn with_connect_error_message(mut self, message: impl Into<String>) -> Self {
        self.connect_error_message = message.into();
        self
    }

    pub fn with_buffer_capacity(mut self, capacity: usize) -> Self {
        self.buffer_capacity = capacity;
        self
    }

    pub fn with_read_chunk_size(mut self, size: usize) -> Self {
        self.read_chunk_size = size;
        self
    }

    pub fn with_io_timeout(mut self, timeout: Duration) -> Self {
        self.io_timeout = Some(timeout);
        self
    }
}

#[derive(Debug)]
enum IoFailure {
    Cancelled,
    TimedOut,
    Broken(String),
}

/// Run `fut` until it finishes, the token fires or the io timeout elapses
async fn guarded<T, F>(
    cancel: &CancellationToken,
    io_timeout: Option<Duration>,
    fut: F,
) -> Result<T, IoFailure>
where
    F: Future<Output = Result<T, String>>,
{
    let bounded = async {
        match io_timeout {
            Some(limit) => match tokio::time::timeout(limit, fut).await {
                Ok(result) => result.map_err(IoFailure::Broken),
                Err(_) => Err(IoFailure::TimedOut),
            },
            None => fut.await.map_err(IoFailure::Broken),
        }
    };

    tokio::select! {
        biased;
        _ = cancel.cancelled() => Err(IoFailure::Cancelled),
        result = bounded => result,
    }
}

/// One outbound TCP session with a buffered, cancellable reader
///
/// Receive methods take `&mut self`: the pipe has exactly one consumer.
/// The connection is never reused across tasks. [`close`](Self::close) is
/// idempotent and dropping an open connection releases it as well.
///
/// A failed send or receive is terminal. A partial read or write leaves the
/// stream position unknown, so every later call fails with Offline.
#[derive(Debug)]
pub struct PipelinedConnection {
    peer: String,
    writer: Option<OwnedWriteHalf>,
    pipe: Arc<Pipe>,
    cancel: CancellationToken,
    fill_task: Option<JoinHandle<()>>,
    io_timeout: Option<Duration>,
    offline_message: String,
    closed: bool,
    failed: bool,
}

impl PipelinedConnection {
    /// Connect to `address:port` and start the fill loop
    ///
    /// The connection gets a child of `cancel`, so cancelling the task stops
    /// the fill loop and fails every pending call.
    pub async fn connect(
        address: &str,
        port: u16,
        cancel: &CancellationToken,
        options: &ConnectOptions,
    ) -> EnoResult<Self> {
        let peer = format!("{}:{}", address, port);
        let attempt =
            tokio::time::timeout(options.connect_timeout, TcpStream::connect((address, port)));

        let stream = tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                debug!(peer = %peer, "Connect cancelled");
                return Err(EnoError::offline(&options.connect_error_message));
            }
            result = attempt => match result {
                Ok(Ok(stream)) => stream,
                Ok(Err(e)) => {
                    warn!(peer = %peer, error = %e, "TCP connect failed");
                    return Err(EnoError::offline(&options.connect_error_message));
                }
                Err(_) => {
                    warn!(
                        peer = %peer,
                        timeout = ?options.connect_timeout,
                        "TCP connect timed out"
                    );
                    return Err(EnoError::offline(&options.connect_error_message));
                }
            },
        };

        if let Err(e) = stream.set_nodelay(true) {
            debug!(peer = %peer, error = %e, "Failed to set TCP_NODELAY");
        }

        let (reader, writer) = stream.into_split();
        let pipe = Arc::new(Pipe::new(options.buffer_capacity.max(1)));
        let token = cancel.child_token();
        let fill_task = tokio::spawn(
            fill_loop(reader, pipe.clone(), options.read_chunk_size.max(1), token.clone())
                .instrument(tracing::debug_span!("fill_loop", peer = %peer)),
        );

        debug!(peer = %peer, "Connection open");
        Ok(Self {
            peer,
            writer: Some(writer),
            pipe,
            cancel: token,
            fill_task: Some(fill_task),
            io_timeout: options.io_timeout,
            offline_message: DEFAULT_CONNECTION_ERROR.to_string(),
            closed: false,
            failed: false,
        })
    }

    pub fn peer(&self) -> &str {
        &self.peer
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    /// Whether an earlier send or receive failed
    pub fn is_failed(&self) -> bool {
        self.failed
    }

    /// Scoreboard message attached to every Offline error from now on
    pub fn set_offline_message(&mut self, message: impl Into<String>) {
        self.offline_message = message.into();
    }

    /// Write all of `data`
    pub async fn send(&mut self, data: &[u8]) -> EnoResult<()> {
        self.ensure_open("send")?;
        let writer = self
            .writer
            .as_mut()
            .ok_or_else(|| EnoError::offline(self.offline_message.clone()))?;

        let result = guarded(&self.cancel, self.io_timeout, async {
            writer.write_all(data).await.map_err(|e| e.to_string())?;
            writer.flush().await.map_err(|e| e.to_string())
        })
        .await;

        result.map_err(|failure| self.fail("send", failure))
    }

    /// Receive exactly `n` bytes
    ///
    /// Fails if the stream ends before `n` bytes arrived. Never consumes more
    /// than `n` bytes, whatever is buffered.
    pub async fn receive_exact(&mut self, n: usize) -> EnoResult<Bytes> {
        self.ensure_open("receive_exact")?;
        let pipe = &self.pipe;

        let result = guarded(&self.cancel, self.io_timeout, async {
            let mut out = BytesMut::with_capacity(n);
            while out.len() < n {
                let status = pipe.status();
                if status.buffered > 0 {
                    out.extend_from_slice(&pipe.take(n - out.len()));
                } else if status.completed {
                    return Err(format!("stream ended after {} of {} bytes", out.len(), n));
                } else {
                    pipe.wait_readable().await;
                }
            }
            Ok(out.freeze())
        })
        .await;

        result.map_err(|failure| self.fail("receive_exact", failure))
    }

    /// Receive everything up to and including `delimiter`
    ///
    /// Bytes after the delimiter stay buffered for the next call. Fails if
    /// the stream ends first, or if the buffer fills up without containing
    /// the delimiter.
    pub async fn receive_until(&mut self, delimiter: &[u8]) -> EnoResult<Bytes> {
        if delimiter.is_empty() {
            return Err(EnoError::internal("receive_until called with an empty delimiter"));
        }
        self.ensure_open("receive_until")?;
        let pipe = &self.pipe;

        let result = guarded(&self.cancel, self.io_timeout, async {
            let mut scanner = DelimiterScanner::new(delimiter);
            loop {
                let (found, buffered, completed) =
                    pipe.inspect(|buf, completed| (scanner.scan(buf), buf.len(), completed));
                match found {
                    Some(end) => return Ok(pipe.take(end)),
                    None if completed => {
                        return Err(format!(
                            "stream ended before delimiter ({} bytes buffered)",
                            buffered
                        ))
                    }
                    None if buffered >= pipe.capacity() => {
                        return Err(format!("buffer full ({} bytes) without delimiter", buffered))
                    }
                    None => pipe.wait_readable().await,
                }
            }
        })
        .await;

        result.map_err(|failure| self.fail("receive_until", failure))
    }

    /// Release the socket and stop the fill loop
    pub async fn close(&mut self) {
        if self.closed {
            return;
        }
        self.closed = true;
        self.cancel.cancel();

        if let Some(mut writer) = self.writer.take() {
            if let Err(e) = writer.shutdown().await {
                debug!(peer = %self.peer, error = %e, "Shutdown on close failed");
            }
        }
        if let Some(task) = self.fill_task.take() {
            if let Err(e) = task.await {
                debug!(peer = %self.peer, error = %e, "Fill loop ended abnormally");
            }
        }
        self.pipe.complete();
        debug!(peer = %self.peer, "Connection closed");
    }

    fn ensure_open(&self, op: &str) -> EnoResult<()> {
        if self.closed || self.failed {
            debug!(
                peer = %self.peer,
                op,
                failed = self.failed,
                "Operation on unusable connection"
            );
            return Err(EnoError::offline(self.offline_message.clone()));
        }
        Ok(())
    }

    fn fail(&mut self, op: &str, failure: IoFailure) -> EnoError {
        self.failed = true;
        // Stop reading into a buffer nobody will consume
        self.cancel.cancel();
        match failure {
            IoFailure::Cancelled => debug!(peer = %self.peer, op, "Operation cancelled"),
            IoFailure::TimedOut => {
                warn!(peer = %self.peer, op, timeout = ?self.io_timeout, "Operation timed out")
            }
            IoFailure::Broken(cause) => {
                warn!(peer = %self.peer, op, cause = %cause, "Connection failure")
            }
        }
        EnoError::offline(self.offline_message.clone())
    }
}

impl Drop for PipelinedConnection {
    fn drop(&mut self) {
        if !self.closed {
            self.cancel.cancel();
            if let Some(task) = self.fill_task.take() {
                task.abort();
            }
        }
    }
}

/// Producer half: socket reads into the pipe until EOF, error or cancellation
async fn fill_loop(
    mut reader: OwnedReadHalf,
    pipe: Arc<Pipe>,
    chunk_size: usize,
    cancel: CancellationToken,
) {
    let mut scratch = vec![0u8; chunk_size];

    'fill: loop {
        let space = loop {
            let space = pipe.available_space();
            if space > 0 {
                break space;
            }
            tokio::select! {
                _ = cancel.cancelled() => break 'fill,
                _ = pipe.wait_writable() => {}
            }
        };

        let want = space.min(scratch.len());
        let read = tokio::select! {
            _ = cancel.cancelled() => break 'fill,
            read = reader.read(&mut scratch[..want]) => read,
        };

        match read {
            Ok(0) => {
                debug!("Remote closed the stream");
                break;
            }
            Ok(n) => pipe.commit(&scratch[..n]),
            Err(e) => {
                warn!(error = %e, "Socket read failed");
                break;
            }
        }
    }

    pipe.complete();
}
