use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::{sleep, timeout, Duration};

use super::codec;
use super::connection::{ConnectionManager, Inbound};

/// Application-level PING/PONG watchdog for one connection
///
/// Sends a PING every `interval` and expects a PONG within `deadline`. Only one
/// PING is outstanding at a time. A missed deadline produces a single
/// [`Inbound::Stale`] and ends the monitor.
pub(crate) struct KeepaliveMonitor {
    pongs: watch::Sender<u64>,
    task: JoinHandle<()>,
}

impl KeepaliveMonitor {
    pub fn start(
        connection: ConnectionManager,
        epoch: u64,
        interval: Duration,
        deadline: Duration,
        signals: mpsc::UnboundedSender<Inbound>,
    ) -> Self {
        let (pongs, pong_rx) = watch::channel(0u64);
        let task = tokio::spawn(run(connection, epoch, interval, deadline, pong_rx, signals));
        Self { pongs, task }
    }

    pub fn pong_received(&self) {
        self.pongs.send_modify(|count| *count += 1);
    }

    pub fn stop(self) {
        self.task.abort();
    }

    #[cfg(test)]
    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }
}

impl Drop for KeepaliveMonitor {
    fn drop(&mut self) {
        self.task.abort();
    }
}

async fn run(
    connection: ConnectionManager,
    epoch: u64,
    interval: Duration,
    deadline: Duration,
    mut pongs: watch::Receiver<u64>,
    signals: mpsc::UnboundedSender<Inbound>,
) {
    loop {
        sleep(interval).await;

        if !connection.is_connected() {
            log::debug!("Keepalive stopping, connection is down");
            return;
        }

        // Forget PONGs that arrived unprompted before this PING.
        pongs.borrow_and_update();

        if let Err(e) = connection.send(codec::encode_ping()) {
            log::debug!("Keepalive could not send PING: {}", e);
            return;
        }
        log::trace!("PING sent (epoch {})", epoch);

        match timeout(deadline, pongs.changed()).await {
            Ok(Ok(())) => log::trace!("PONG received (epoch {})", epoch),
            Ok(Err(_)) => return,
            Err(_) => {
                log::warn!("No PONG within {:?}, connection is stale", deadline);
                let _ = signals.send(Inbound::Stale { epoch });
                return;
            }
        }
    }
}
