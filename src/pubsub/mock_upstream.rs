//! In-process PubSub server for tests
//!
//! Accepts any number of WebSocket connections, records every decoded frame and
//! by default answers PING with PONG and LISTEN/UNLISTEN with a success RESPONSE.

use futures_util::{SinkExt, StreamExt};
use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex as StdMutex};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::{mpsc, watch, Mutex};
use tokio::task::JoinHandle;
use tokio::time::{timeout, Duration};
use tokio_tungstenite::{accept_async, tungstenite::Message};

use super::codec::{self, Envelope};

const FRAME_TIMEOUT: Duration = Duration::from_secs(3);

enum Command {
    Send(String),
    Drop,
}

struct Behaviour {
    auto_pong: AtomicBool,
    auto_ack: AtomicBool,
    listen_error: StdMutex<Option<String>>,
}

pub(crate) struct MockUpstream {
    addr: SocketAddr,
    frames: Mutex<mpsc::UnboundedReceiver<(usize, Envelope)>>,
    connections: Arc<StdMutex<Vec<mpsc::UnboundedSender<Command>>>>,
    accepted: watch::Receiver<usize>,
    behaviour: Arc<Behaviour>,
    acceptor: JoinHandle<()>,
}

impl MockUpstream {
    pub async fn start() -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let (frames_tx, frames_rx) = mpsc::unbounded_channel();
        let (accepted_tx, accepted) = watch::channel(0usize);
        let connections = Arc::new(StdMutex::new(Vec::new()));
        let behaviour = Arc::new(Behaviour {
            auto_pong: AtomicBool::new(true),
            auto_ack: AtomicBool::new(true),
            listen_error: StdMutex::new(None),
        });

        let acceptor = tokio::spawn(accept_loop(
            listener,
            connections.clone(),
            behaviour.clone(),
            frames_tx,
            accepted_tx,
        ));

        Self {
            addr,
            frames: Mutex::new(frames_rx),
            connections,
            accepted,
            behaviour,
            acceptor,
        }
    }

    pub fn url(&self) -> String {
        format!("ws://{}", self.addr)
    }

    pub fn set_auto_pong(&self, enabled: bool) {
        self.behaviour.auto_pong.store(enabled, Ordering::SeqCst);
    }

    pub fn set_auto_ack(&self, enabled: bool) {
        self.behaviour.auto_ack.store(enabled, Ordering::SeqCst);
    }

    /// Error string to put in every auto-acked LISTEN response
    pub fn set_listen_error(&self, error: Option<&str>) {
        *self.behaviour.listen_error.lock().unwrap() = error.map(str::to_string);
    }

    /// Next frame received on any connection, tagged with the connection index
    pub async fn next_frame(&self) -> (usize, Envelope) {
        let mut frames = self.frames.lock().await;
        match timeout(FRAME_TIMEOUT, frames.recv()).await {
            Ok(Some(frame)) => frame,
            Ok(None) => panic!("mock upstream stopped"),
            Err(_) => panic!("no frame within {:?}", FRAME_TIMEOUT),
        }
    }

    /// Next frame that is not a keepalive PING
    pub async fn next_request(&self) -> (usize, Envelope) {
        loop {
            let frame = self.next_frame().await;
            if frame.1 != Envelope::Ping {
                return frame;
            }
        }
    }

    pub async fn try_next_frame(&self) -> Option<(usize, Envelope)> {
        let mut frames = self.frames.lock().await;
        timeout(Duration::from_millis(100), frames.recv())
            .await
            .ok()
            .flatten()
    }

    pub fn send(&self, connection: usize, text: String) {
        let connections = self.connections.lock().unwrap();
        let _ = connections[connection].send(Command::Send(text));
    }

    /// Drop the socket without a close handshake
    pub async fn drop_connection(&self, connection: usize) {
        let tx = self.connections.lock().unwrap()[connection].clone();
        let _ = tx.send(Command::Drop);
        tx.closed().await;
    }

    pub async fn wait_for_connections(&self, count: usize) {
        let mut accepted = self.accepted.clone();
        let reached = matches!(
            timeout(FRAME_TIMEOUT, accepted.wait_for(|n| *n >= count)).await,
            Ok(Ok(_))
        );
        assert!(
            reached,
            "expected {} connection(s), saw {}",
            count,
            self.connection_count()
        );
    }

    pub fn connection_count(&self) -> usize {
        *self.accepted.borrow()
    }
}

impl Drop for MockUpstream {
    fn drop(&mut self) {
        self.acceptor.abort();
    }
}

async fn accept_loop(
    listener: TcpListener,
    connections: Arc<StdMutex<Vec<mpsc::UnboundedSender<Command>>>>,
    behaviour: Arc<Behaviour>,
    frames: mpsc::UnboundedSender<(usize, Envelope)>,
    accepted: watch::Sender<usize>,
) {
    while let Ok((stream, _)) = listener.accept().await {
        let (tx, rx) = mpsc::unbounded_channel();
        let index = {
            let mut connections = connections.lock().unwrap();
            connections.push(tx);
            connections.len() - 1
        };

        tokio::spawn(serve(stream, index, rx, behaviour.clone(), frames.clone()));
        accepted.send_modify(|n| *n += 1);
    }
}

async fn serve(
    stream: TcpStream,
    index: usize,
    mut commands: mpsc::UnboundedReceiver<Command>,
    behaviour: Arc<Behaviour>,
    frames: mpsc::UnboundedSender<(usize, Envelope)>,
) {
    let Ok(ws_stream) = accept_async(stream).await else {
        return;
    };
    let (mut write, mut read) = ws_stream.split();

    loop {
        tokio::select! {
            command = commands.recv() => match command {
                Some(Command::Send(text)) => {
                    if write.send(Message::Text(text.into())).await.is_err() {
                        return;
                    }
                }
                Some(Command::Drop) | None => return,
            },
            frame = read.next() => match frame {
                Some(Ok(Message::Text(text))) => {
                    let Ok(envelope) = codec::decode(&text) else {
                        continue;
                    };
                    let reply = reply_for(&envelope, &behaviour);
                    let _ = frames.send((index, envelope));
                    if let Some(reply) = reply {
                        if write.send(Message::Text(reply.into())).await.is_err() {
                            return;
                        }
                    }
                }
                Some(Ok(Message::Close(_))) | Some(Err(_)) | None => return,
                Some(Ok(_)) => {}
            },
        }
    }
}

fn reply_for(envelope: &Envelope, behaviour: &Behaviour) -> Option<String> {
    match envelope {
        Envelope::Ping if behaviour.auto_pong.load(Ordering::SeqCst) => Some(codec::encode_pong()),
        Envelope::Listen { nonce, .. } if behaviour.auto_ack.load(Ordering::SeqCst) => {
            let error = behaviour.listen_error.lock().unwrap().clone().unwrap_or_default();
            Some(codec::encode_response(nonce, &error))
        }
        Envelope::Unlisten { nonce, .. } if behaviour.auto_ack.load(Ordering::SeqCst) => {
            Some(codec::encode_response(nonce, ""))
        }
        _ => None,
    }
}
