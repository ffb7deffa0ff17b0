//! Queuic broker server.
//!
//! Production glue around [`queuic_core`]: a UDP receive loop that spawns
//! one task per datagram (open envelope → dispatch → seal reply), the
//! command dispatcher in [`dispatch`], and the admin HTTP adapter in
//! [`admin`]. Parallelism is per-datagram; ordering per queue comes from
//! each queue's own lock, not from the task model.

pub mod admin;
pub mod dispatch;
mod error;

use std::{net::SocketAddr, sync::Arc, time::Duration};

use queuic_core::QueueRegistry;
use queuic_proto::Frame;
use tokio::{net::UdpSocket, sync::watch, task::JoinSet, time};
use tracing::{debug, info, warn};

pub use crate::error::ServerError;

/// Default UDP port for the datagram protocol.
pub const DEFAULT_PORT: u16 = 9523;

/// Receive buffer size. Larger datagrams are truncated by the transport and
/// then fail envelope authentication.
pub const MAX_DATAGRAM: usize = 4096;

/// Runtime configuration for the datagram server.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Address to bind the UDP socket to.
    pub bind_addr: SocketAddr,
    /// How long in-flight tasks may drain once shutdown triggers.
    pub shutdown_grace: Duration,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([0, 0, 0, 0], DEFAULT_PORT)),
            shutdown_grace: Duration::from_secs(5),
        }
    }
}

/// Cooperative shutdown trigger for a running [`Server`].
#[derive(Debug, Clone)]
pub struct ShutdownHandle {
    tx: watch::Sender<bool>,
}

impl ShutdownHandle {
    /// Ask the receive loop to stop. In-flight tasks drain for the
    /// configured grace period before the server returns.
    pub fn shutdown(&self) {
        let _ = self.tx.send(true);
    }
}

/// The datagram broker: socket, envelope key, registry handle.
pub struct Server {
    socket: Arc<UdpSocket>,
    key: [u8; 32],
    registry: Arc<QueueRegistry>,
    config: ServerConfig,
    shutdown_tx: watch::Sender<bool>,
    shutdown_rx: watch::Receiver<bool>,
}

impl Server {
    /// Bind the UDP socket.
    pub async fn bind(
        config: ServerConfig,
        key: [u8; 32],
        registry: Arc<QueueRegistry>,
    ) -> Result<Self, ServerError> {
        let socket = UdpSocket::bind(config.bind_addr).await?;
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        Ok(Self { socket: Arc::new(socket), key, registry, config, shutdown_tx, shutdown_rx })
    }

    /// Address the socket actually bound (useful when binding port 0).
    pub fn local_addr(&self) -> Result<SocketAddr, ServerError> {
        Ok(self.socket.local_addr()?)
    }

    /// Handle that can stop this server from another task.
    #[must_use]
    pub fn shutdown_handle(&self) -> ShutdownHandle {
        ShutdownHandle { tx: self.shutdown_tx.clone() }
    }

    /// Receive datagrams until shutdown, spawning one task per datagram.
    ///
    /// Returns once the receive loop has stopped and in-flight tasks have
    /// drained, or the grace period has expired and the stragglers were
    /// aborted.
    pub async fn run(mut self) -> Result<(), ServerError> {
        info!(addr = %self.local_addr()?, "datagram server listening");

        let mut tasks: JoinSet<()> = JoinSet::new();
        let mut buf = vec![0u8; MAX_DATAGRAM];

        loop {
            tokio::select! {
                received = self.socket.recv_from(&mut buf) => {
                    let (len, peer) = match received {
                        Ok(pair) => pair,
                        Err(err) => {
                            warn!(error = %err, "receive failed");
                            continue;
                        }
                    };

                    // The shared receive buffer is reused by the next
                    // iteration; the task gets its own copy.
                    let datagram = buf[..len].to_vec();
                    let socket = Arc::clone(&self.socket);
                    let registry = Arc::clone(&self.registry);
                    let key = self.key;
                    tasks.spawn(async move {
                        handle_datagram(&socket, &key, &registry, datagram, peer).await;
                    });
                }
                _ = self.shutdown_rx.changed() => {
                    info!("shutdown requested, draining in-flight requests");
                    break;
                }
            }

            // Reap finished tasks so the set does not grow without bound.
            while tasks.try_join_next().is_some() {}
        }

        let drained = time::timeout(self.config.shutdown_grace, async {
            while tasks.join_next().await.is_some() {}
        })
        .await;
        if drained.is_err() {
            warn!(
                grace = ?self.config.shutdown_grace,
                "grace period expired with requests still in flight"
            );
            tasks.abort_all();
        }

        Ok(())
    }
}

/// Process one datagram end to end.
///
/// Every failure path logs and drops the datagram; a reply is only
/// transmitted after the queue mutation (snapshot write included) has
/// completed under the queue's lock.
async fn handle_datagram(
    socket: &UdpSocket,
    key: &[u8; 32],
    registry: &QueueRegistry,
    datagram: Vec<u8>,
    peer: SocketAddr,
) {
    debug!(%peer, len = datagram.len(), "datagram received");

    let plaintext = match queuic_crypto::open(key, &datagram) {
        Ok(bytes) => bytes,
        Err(err) => {
            warn!(%peer, error = %err, "dropping unauthenticated datagram");
            return;
        }
    };

    let request = match Frame::decode(&plaintext) {
        Ok(frame) => frame,
        Err(err) => {
            warn!(%peer, error = %err, "dropping malformed frame");
            return;
        }
    };

    let reply = match dispatch::handle_request(registry, request) {
        Ok(frame) => frame,
        Err(err) if err.is_silent() => {
            debug!(%peer, error = %err, "request answered with silence");
            return;
        }
        Err(err) => {
            warn!(%peer, error = %err, "request failed, no reply");
            return;
        }
    };

    let sealed = match queuic_crypto::seal(key, &reply.encode()) {
        Ok(bytes) => bytes,
        Err(err) => {
            warn!(%peer, error = %err, "failed to seal reply");
            return;
        }
    };

    if let Err(err) = socket.send_to(&sealed, peer).await {
        warn!(%peer, error = %err, "failed to transmit reply");
    }
}
