use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::net::TcpStream;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::{timeout, Duration};
use tokio_tungstenite::{connect_async, tungstenite::Message, MaybeTlsStream, WebSocketStream};

use super::codec::{self, Envelope};
use super::error::{PubSubError, Result};

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// WebSocket connection state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Disconnected,
    Connecting,
    Connected,
    Closing,
}

/// Traffic and lifecycle signals from a connection
///
/// Every item carries the epoch of the connection it came from, so anything
/// arriving from an already replaced connection can be told apart.
#[derive(Debug)]
pub(crate) enum Inbound {
    Frame { epoch: u64, envelope: Envelope },
    Closed { epoch: u64, reason: String },
    Stale { epoch: u64 },
}

struct Link {
    epoch: u64,
    outbound: mpsc::UnboundedSender<Message>,
    reader: JoinHandle<()>,
    writer: JoinHandle<()>,
}

struct Shared {
    state: watch::Sender<ConnectionState>,
    link: Mutex<Option<Link>>,
    next_epoch: AtomicU64,
    send_timeout: Duration,
}

/// Owner of the single transport connection
///
/// One reader task is the only consumer of the socket. Writes from any task go
/// through a queue drained by one writer task, so frames never interleave.
#[derive(Clone)]
pub struct ConnectionManager {
    shared: Arc<Shared>,
}

impl ConnectionManager {
    pub fn new(send_timeout: Duration) -> Self {
        let (state, _) = watch::channel(ConnectionState::Disconnected);
        Self {
            shared: Arc::new(Shared {
                state,
                link: Mutex::new(None),
                next_epoch: AtomicU64::new(0),
                send_timeout,
            }),
        }
    }

    /// Open the WebSocket and start the reader and writer tasks
    ///
    /// Returns the epoch assigned to this connection.
    pub(crate) async fn connect(
        &self,
        url: &str,
        connect_timeout: Duration,
        inbound: mpsc::UnboundedSender<Inbound>,
    ) -> Result<u64> {
        let linked = self.link().is_some();
        if linked {
            self.close().await;
        }

        self.set_state(ConnectionState::Connecting);
        log::info!("Connecting to {}", url);

        let ws_stream = match timeout(connect_timeout, connect_async(url)).await {
            Ok(Ok((ws_stream, _))) => ws_stream,
            Ok(Err(e)) => {
                self.set_state(ConnectionState::Disconnected);
                return Err(PubSubError::ConnectError(e.to_string()));
            }
            Err(_) => {
                self.set_state(ConnectionState::Disconnected);
                return Err(PubSubError::ConnectError(format!(
                    "Timed out after {:?}",
                    connect_timeout
                )));
            }
        };

        let epoch = self.shared.next_epoch.fetch_add(1, Ordering::SeqCst) + 1;
        let (write, read) = ws_stream.split();
        let (outbound, outbound_rx) = mpsc::unbounded_channel();

        // Hold the slot while spawning so a reader that dies instantly still
        // finds its own link when it reports the loss.
        let mut slot = self.link();
        let writer = tokio::spawn(write_loop(
            self.clone(),
            write,
            outbound_rx,
            epoch,
            inbound.clone(),
        ));
        let reader = tokio::spawn(read_loop(
            self.clone(),
            read,
            outbound.clone(),
            epoch,
            inbound,
        ));
        *slot = Some(Link {
            epoch,
            outbound,
            reader,
            writer,
        });
        self.set_state(ConnectionState::Connected);
        drop(slot);

        log::info!("Connected (epoch {})", epoch);
        Ok(epoch)
    }

    /// Queue a text frame for the writer task
    pub fn send(&self, text: String) -> Result<()> {
        if self.state() != ConnectionState::Connected {
            return Err(PubSubError::NotConnected);
        }

        match self.link().as_ref() {
            Some(link) => link
                .outbound
                .send(Message::Text(text.into()))
                .map_err(|_| PubSubError::NotConnected),
            None => Err(PubSubError::NotConnected),
        }
    }

    /// Gracefully close the current connection, if any
    pub async fn close(&self) {
        let link = self.link().take();

        let Some(link) = link else {
            self.set_state(ConnectionState::Disconnected);
            return;
        };

        self.set_state(ConnectionState::Closing);
        log::info!("Closing connection (epoch {})", link.epoch);

        let Link {
            outbound,
            reader,
            mut writer,
            ..
        } = link;
        let _ = outbound.send(Message::Close(None));
        drop(outbound);

        if timeout(self.shared.send_timeout, &mut writer).await.is_err() {
            log::warn!("Close frame not flushed in time, dropping connection");
            writer.abort();
        }
        reader.abort();

        self.set_state(ConnectionState::Disconnected);
    }

    pub fn state(&self) -> ConnectionState {
        *self.shared.state.borrow()
    }

    pub fn is_connected(&self) -> bool {
        self.state() == ConnectionState::Connected
    }

    pub fn watch_state(&self) -> watch::Receiver<ConnectionState> {
        self.shared.state.subscribe()
    }

    fn set_state(&self, state: ConnectionState) {
        let previous = self.shared.state.send_replace(state);
        if previous != state {
            log::debug!("Connection state {:?} -> {:?}", previous, state);
        }
    }

    fn link(&self) -> MutexGuard<'_, Option<Link>> {
        self.shared.link.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Detach the link for `epoch` after its transport died
    fn mark_lost(&self, epoch: u64) -> Option<Link> {
        let mut slot = self.link();
        if slot.as_ref().map(|link| link.epoch) != Some(epoch) {
            return None;
        }

        let link = slot.take();
        self.set_state(ConnectionState::Disconnected);
        link
    }
}

async fn read_loop(
    connection: ConnectionManager,
    mut read: SplitStream<WsStream>,
    outbound: mpsc::UnboundedSender<Message>,
    epoch: u64,
    inbound: mpsc::UnboundedSender<Inbound>,
) {
    let reason = loop {
        match read.next().await {
            Some(Ok(Message::Text(text))) => match codec::decode(&text) {
                Ok(envelope) => {
                    log::trace!("Received {} frame", envelope.type_name());
                    if inbound.send(Inbound::Frame { epoch, envelope }).is_err() {
                        break "inbound channel closed".to_string();
                    }
                }
                Err(e) => {
                    log::warn!("Dropping frame: {}", e);
                }
            },
            Some(Ok(Message::Ping(payload))) => {
                let _ = outbound.send(Message::Pong(payload));
            }
            Some(Ok(Message::Close(frame))) => {
                let code: u16 = frame.as_ref().map(|f| f.code.into()).unwrap_or(1000);
                let reason = frame
                    .as_ref()
                    .map(|f| f.reason.to_string())
                    .unwrap_or_else(|| "Unknown".to_string());
                break format!("closed by server: code={}, reason={}", code, reason);
            }
            Some(Ok(_)) => {}
            Some(Err(e)) => break PubSubError::from(e).to_string(),
            None => break "stream ended".to_string(),
        }
    };
    drop(outbound);

    if let Some(link) = connection.mark_lost(epoch) {
        log::warn!("Connection lost (epoch {}): {}", epoch, reason);
        link.writer.abort();
        let _ = inbound.send(Inbound::Closed { epoch, reason });
    }
}

async fn write_loop(
    connection: ConnectionManager,
    mut write: SplitSink<WsStream, Message>,
    mut outbound: mpsc::UnboundedReceiver<Message>,
    epoch: u64,
    inbound: mpsc::UnboundedSender<Inbound>,
) {
    let send_timeout = connection.shared.send_timeout;

    while let Some(message) = outbound.recv().await {
        let closing = matches!(message, Message::Close(_));

        let failure = match timeout(send_timeout, write.send(message)).await {
            Ok(Ok(())) => None,
            Ok(Err(e)) => Some(format!("write failed, {}", PubSubError::from(e))),
            Err(_) => Some(format!("write timed out after {:?}", send_timeout)),
        };

        if let Some(reason) = failure {
            if let Some(link) = connection.mark_lost(epoch) {
                log::warn!("Connection lost (epoch {}): {}", epoch, reason);
                link.reader.abort();
                let _ = inbound.send(Inbound::Closed { epoch, reason });
            }
            return;
        }

        if closing {
            return;
        }
    }
}
