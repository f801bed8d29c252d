//! Chat transport: socket lifecycle, line framing and keepalive.
//!
//! One spawned task per connection owns both halves of the stream. It reads
//! lines, answers `PING` itself, classifies everything else and fans the
//! resulting [`ChatMessage`]s out to subscribers in receipt order.

use std::time::Duration;

use tokio::io::{
    AsyncBufRead, AsyncBufReadExt, AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt, BufReader,
};
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::config::{ConnectionConfig, TwitchConfig};
use crate::error::ConnectionError;
use crate::twitch::classifier::classify;
use crate::twitch::message::ChatMessage;
use crate::twitch::tags;

/// Numeric reply closing the NAMES list, sent once a `JOIN` has completed.
const RPL_ENDOFNAMES: &str = "366";

/// A read-only chat connection to one channel.
pub struct TwitchClient {
    twitch: TwitchConfig,
    options: ConnectionConfig,
    subscribers: Vec<mpsc::UnboundedSender<ChatMessage>>,
    session: Option<Session>,
}

struct Session {
    cancel: CancellationToken,
    task: JoinHandle<Result<(), ConnectionError>>,
}

impl TwitchClient {
    pub fn new(twitch: TwitchConfig, options: ConnectionConfig) -> Self {
        Self {
            twitch,
            options,
            subscribers: Vec::new(),
            session: None,
        }
    }

    /// Register a subscriber. It receives every message of every connection
    /// started after this call.
    ///
    /// The sender list is handed to the read loop when a connection starts,
    /// so subscribing while connected takes effect from the next
    /// [`connect`](Self::connect) on.
    pub fn subscribe(&mut self) -> mpsc::UnboundedReceiver<ChatMessage> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.subscribers.push(tx);
        rx
    }

    /// Open a TCP connection to the configured server, send the handshake
    /// and start reading.
    pub async fn connect(&mut self) -> Result<(), ConnectionError> {
        let addr = format!("{}:{}", self.twitch.host, self.twitch.port);
        let stream = TcpStream::connect(&addr)
            .await
            .map_err(|source| ConnectionError::Connect {
                addr: addr.clone(),
                source,
            })?;
        info!(%addr, "Connected to chat server");
        self.connect_with_stream(stream).await
    }

    /// Run the handshake and read loop over an already-open stream.
    ///
    /// Any previous session is disconnected first.
    pub async fn connect_with_stream<S>(&mut self, stream: S) -> Result<(), ConnectionError>
    where
        S: AsyncRead + AsyncWrite + Send + 'static,
    {
        self.disconnect();
        self.session = None;
        self.subscribers.retain(|tx| !tx.is_closed());

        let (reader, mut writer) = tokio::io::split(stream);
        let channel = self.twitch.normalized_channel();
        let nick = self.twitch.nickname_or_generate();
        send_handshake(&mut writer, &self.twitch.capabilities, &nick, &channel).await?;
        info!(%nick, %channel, "Joining chat anonymously");

        let cancel = CancellationToken::new();
        let read_loop = ReadLoop {
            reader: BufReader::new(reader),
            writer,
            subscribers: self.subscribers.clone(),
            idle_timeout: self.options.idle_timeout(),
            max_line_length: self.options.max_line_length.max(1),
        };
        let task_cancel = cancel.clone();
        let task = tokio::spawn(async move {
            let result = read_loop.run(&task_cancel).await;
            // The halves are dropped with the loop; mark the session closed.
            task_cancel.cancel();
            match &result {
                Ok(()) => info!("Disconnected from chat"),
                Err(e) => warn!(error = %e, "Chat connection lost"),
            }
            result
        });

        self.session = Some(Session { cancel, task });
        Ok(())
    }

    /// Stop reading and release the socket. Safe to call any number of
    /// times, connected or not.
    pub fn disconnect(&mut self) {
        if let Some(session) = &self.session {
            if !session.cancel.is_cancelled() {
                debug!("Disconnect requested");
                session.cancel.cancel();
            }
        }
    }

    pub fn is_connected(&self) -> bool {
        self.session
            .as_ref()
            .is_some_and(|s| !s.cancel.is_cancelled() && !s.task.is_finished())
    }

    /// Wait for the current connection to end and report why. A local
    /// [`disconnect`](Self::disconnect) ends it with `Ok(())`.
    ///
    /// The session stays registered while waiting, so dropping this future
    /// early leaves `disconnect` able to stop the read loop.
    pub async fn closed(&mut self) -> Result<(), ConnectionError> {
        let session = self.session.as_mut().ok_or(ConnectionError::NotConnected)?;
        let result = (&mut session.task).await;
        self.session = None;
        result?
    }
}

impl Drop for TwitchClient {
    fn drop(&mut self) {
        self.disconnect();
    }
}

async fn send_handshake<W>(
    writer: &mut W,
    capabilities: &[String],
    nick: &str,
    channel: &str,
) -> Result<(), ConnectionError>
where
    W: AsyncWrite + Unpin,
{
    write_line(writer, &format!("CAP REQ :{}", capabilities.join(" "))).await?;
    write_line(writer, &format!("NICK {}", nick)).await?;
    write_line(writer, &format!("JOIN #{}", channel)).await?;
    Ok(())
}

async fn write_line<W>(writer: &mut W, line: &str) -> Result<(), ConnectionError>
where
    W: AsyncWrite + Unpin,
{
    writer.write_all(line.as_bytes()).await?;
    writer.write_all(b"\r\n").await?;
    writer.flush().await?;
    Ok(())
}

/// `PONG` reply for a keepalive line, or `None` if the line is not a `PING`.
pub fn pong_reply(line: &str) -> Option<String> {
    line.strip_prefix("PING").map(|rest| format!("PONG{}", rest))
}

fn is_end_of_names(line: &str) -> bool {
    let rest = match tags::split_tags(line) {
        Some((_, rest)) => rest,
        None => return false,
    };
    rest.split_whitespace().nth(1) == Some(RPL_ENDOFNAMES)
}

struct ReadLoop<R, W> {
    reader: R,
    writer: W,
    subscribers: Vec<mpsc::UnboundedSender<ChatMessage>>,
    idle_timeout: Option<Duration>,
    max_line_length: usize,
}

impl<R, W> ReadLoop<R, W>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    async fn run(mut self, cancel: &CancellationToken) -> Result<(), ConnectionError> {
        let mut buf = Vec::with_capacity(512);
        let mut skipping_tail = false;

        loop {
            buf.clear();
            let n = tokio::select! {
                biased;
                _ = cancel.cancelled() => return Ok(()),
                res = self.next_chunk(&mut buf) => res?,
            };
            if n == 0 {
                return Err(ConnectionError::Closed);
            }

            let oversized = !buf.ends_with(b"\n") && n >= self.max_line_length;
            if skipping_tail {
                skipping_tail = oversized;
                continue;
            }
            if oversized {
                let prefix = String::from_utf8_lossy(&buf[..buf.len().min(64)]);
                warn!(limit = self.max_line_length, line = %prefix, "Line too long, skipping");
                skipping_tail = true;
                continue;
            }

            let text = String::from_utf8_lossy(&buf);
            let line = text.trim_end_matches(['\r', '\n']);
            if !line.is_empty() {
                self.handle_line(line).await?;
            }
        }
    }

    /// Read up to one line (bounded by `max_line_length`), enforcing the idle
    /// timeout when one is configured.
    async fn next_chunk(&mut self, buf: &mut Vec<u8>) -> Result<usize, ConnectionError> {
        let limit = self.max_line_length as u64;
        let mut limited = (&mut self.reader).take(limit);
        let read = limited.read_until(b'\n', buf);
        let n = match self.idle_timeout {
            Some(idle) => tokio::time::timeout(idle, read)
                .await
                .map_err(|_| ConnectionError::IdleTimeout(idle))??,
            None => read.await?,
        };
        Ok(n)
    }

    async fn handle_line(&mut self, line: &str) -> Result<(), ConnectionError> {
        debug!(line, "<<");

        if let Some(pong) = pong_reply(line) {
            write_line(&mut self.writer, &pong).await?;
            debug!(line = %pong, ">>");
            return Ok(());
        }

        if is_end_of_names(line) {
            info!("Joined chat channel");
            return Ok(());
        }

        if let Some(message) = classify(line) {
            self.publish(message);
        }
        Ok(())
    }

    fn publish(&mut self, message: ChatMessage) {
        self.subscribers.retain(|tx| tx.send(message.clone()).is_ok());
    }
}
