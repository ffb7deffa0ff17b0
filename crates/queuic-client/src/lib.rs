//! Datagram client for the Queuic protocol.
//!
//! Wraps a connected UDP socket plus the shared-secret envelope. Each call
//! seals one request frame, transmits it, and waits a bounded time for the
//! matching acknowledgement. The transport guarantees nothing, so every
//! call can time out: [`QueuicClient::peek`] folds a timeout into "queue
//! empty" (the broker answers an empty queue with silence), all other calls
//! surface [`ClientError::Timeout`] and leave retransmission to the caller.

use std::time::Duration;

use queuic_crypto::EnvelopeError;
use queuic_proto::{Command, Frame, FrameError, Item, QueueName};
use thiserror::Error;
use tokio::{
    net::{ToSocketAddrs, UdpSocket},
    time,
};
use uuid::Uuid;

/// Largest datagram either side will process.
const MAX_DATAGRAM: usize = 4096;

/// Default reply timeout.
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(1);

/// Errors surfaced by client calls.
#[derive(Error, Debug)]
pub enum ClientError {
    /// Socket failure.
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// The request could not be sealed or the reply failed authentication.
    #[error(transparent)]
    Envelope(#[from] EnvelopeError),

    /// The reply plaintext did not decode as a frame.
    #[error(transparent)]
    Frame(#[from] FrameError),

    /// No reply arrived within the timeout.
    #[error("timed out waiting for a reply")]
    Timeout,

    /// The reply carried a different command than the request calls for.
    #[error("unexpected reply: expected {expected:?}, got {got:?}")]
    UnexpectedReply {
        /// Acknowledgement the request calls for.
        expected: Command,
        /// Command actually received.
        got: Command,
    },

    /// The reply was missing its item or carried a malformed payload.
    #[error("malformed reply payload")]
    MalformedReply,
}

/// Client handle: connected socket plus envelope key.
#[derive(Debug)]
pub struct QueuicClient {
    socket: UdpSocket,
    key: [u8; 32],
    timeout: Duration,
}

impl QueuicClient {
    /// Connect to a broker, deriving the envelope key from `secret`.
    pub async fn connect(addr: impl ToSocketAddrs, secret: &str) -> Result<Self, ClientError> {
        let socket = UdpSocket::bind("0.0.0.0:0").await?;
        socket.connect(addr).await?;
        Ok(Self { socket, key: queuic_crypto::derive_key(secret), timeout: DEFAULT_TIMEOUT })
    }

    /// Replace the reply timeout (default one second).
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Enqueue `payload`, returning the generated item identifier.
    pub async fn enqueue(&self, queue: QueueName, payload: Vec<u8>) -> Result<Uuid, ClientError> {
        let item = Item::new(payload);
        let id = item.id;
        self.expect_ack(Frame::with_item(Command::Enqueue, queue, item), Command::EnqueueAck)
            .await?;
        Ok(id)
    }

    /// Reserve the head item of `queue`.
    ///
    /// `None` when the broker stays silent, which the protocol defines as
    /// "queue empty" (or the request/reply was lost; callers retry).
    pub async fn peek(&self, queue: QueueName) -> Result<Option<Item>, ClientError> {
        match self.round_trip(Frame::bare(Command::Peek, queue)).await {
            Ok(reply) if reply.command == Command::PeekAck => {
                reply.item.map(Some).ok_or(ClientError::MalformedReply)
            }
            Ok(reply) => Err(ClientError::UnexpectedReply {
                expected: Command::PeekAck,
                got: reply.command,
            }),
            Err(ClientError::Timeout) => Ok(None),
            Err(err) => Err(err),
        }
    }

    /// Commit removal of a reserved item.
    pub async fn accept(&self, queue: QueueName, id: Uuid) -> Result<(), ClientError> {
        self.expect_ack(
            Frame::with_item(Command::Accept, queue, Item::id_only(id)),
            Command::AcceptAck,
        )
        .await
    }

    /// Return a reserved item to the head of its queue.
    pub async fn release(&self, queue: QueueName, id: Uuid) -> Result<(), ClientError> {
        self.expect_ack(
            Frame::with_item(Command::Release, queue, Item::id_only(id)),
            Command::ReleaseAck,
        )
        .await
    }

    /// Number of items `queue` holds, backlog plus reservations.
    pub async fn size(&self, queue: QueueName) -> Result<u64, ClientError> {
        let reply = self.round_trip(Frame::bare(Command::Size, queue)).await?;
        if reply.command != Command::SizeAck {
            return Err(ClientError::UnexpectedReply {
                expected: Command::SizeAck,
                got: reply.command,
            });
        }

        let payload = reply.item.ok_or(ClientError::MalformedReply)?.payload;
        let count: [u8; 8] =
            payload.as_slice().try_into().map_err(|_| ClientError::MalformedReply)?;
        Ok(u64::from_le_bytes(count))
    }

    async fn expect_ack(&self, request: Frame, expected: Command) -> Result<(), ClientError> {
        let reply = self.round_trip(request).await?;
        if reply.command == expected {
            Ok(())
        } else {
            Err(ClientError::UnexpectedReply { expected, got: reply.command })
        }
    }

    /// Seal, transmit, await one datagram, open, decode.
    async fn round_trip(&self, request: Frame) -> Result<Frame, ClientError> {
        let sealed = queuic_crypto::seal(&self.key, &request.encode())?;
        self.socket.send(&sealed).await?;

        let mut buf = vec![0u8; MAX_DATAGRAM];
        let received = time::timeout(self.timeout, self.socket.recv(&mut buf))
            .await
            .map_err(|_| ClientError::Timeout)??;

        let plaintext = queuic_crypto::open(&self.key, &buf[..received])?;
        Ok(Frame::decode(&plaintext)?)
    }
}

#[cfg(test)]
mod tests {
    use std::net::SocketAddr;

    use queuic_crypto::EnvelopeError;
    use queuic_proto::FrameError;

    use super::*;

    const SECRET: &str = "client-tests";

    fn name() -> QueueName {
        "tests".parse().unwrap()
    }

    fn sealed(frame: &Frame) -> Vec<u8> {
        queuic_crypto::seal(&queuic_crypto::derive_key(SECRET), &frame.encode()).unwrap()
    }

    /// Bind a fake broker that answers the first request with whatever
    /// `reply` produces from the decoded frame. `None` means stay silent,
    /// exactly like the real broker on its error paths.
    async fn fake_broker(
        reply: impl FnOnce(Frame) -> Option<Vec<u8>> + Send + 'static,
    ) -> SocketAddr {
        let key = queuic_crypto::derive_key(SECRET);
        let socket = UdpSocket::bind("127.0.0.1:0").await.unwrap();
        let addr = socket.local_addr().unwrap();

        tokio::spawn(async move {
            let mut buf = vec![0u8; MAX_DATAGRAM];
            let (len, peer) = socket.recv_from(&mut buf).await.unwrap();
            let plaintext = queuic_crypto::open(&key, &buf[..len]).unwrap();
            let request = Frame::decode(&plaintext).unwrap();
            if let Some(datagram) = reply(request) {
                socket.send_to(&datagram, peer).await.unwrap();
            }
        });

        addr
    }

    async fn client(addr: SocketAddr) -> QueuicClient {
        QueuicClient::connect(addr, SECRET)
            .await
            .unwrap()
            .with_timeout(Duration::from_millis(200))
    }

    #[tokio::test]
    async fn silence_on_peek_means_empty() {
        let addr = fake_broker(|_| None).await;
        let client = client(addr).await;

        assert!(client.peek(name()).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn silence_on_other_calls_surfaces_timeout() {
        let addr = fake_broker(|_| None).await;
        let client = client(addr).await;

        let result = client.accept(name(), Uuid::new_v4()).await;
        assert!(matches!(result, Err(ClientError::Timeout)));
    }

    #[tokio::test]
    async fn enqueue_sends_the_item_and_checks_the_ack() {
        // Reply only when the request carries the item; a malformed request
        // would surface as a timeout below.
        let addr = fake_broker(|request| {
            (request.command == Command::Enqueue
                && request.item.as_ref().is_some_and(|i| i.payload == b"job"))
            .then(|| sealed(&Frame::bare(Command::EnqueueAck, request.queue)))
        })
        .await;
        let client = client(addr).await;

        client.enqueue(name(), b"job".to_vec()).await.unwrap();
    }

    #[tokio::test]
    async fn size_decodes_the_little_endian_count() {
        let addr = fake_broker(|request| {
            let item = Item { id: Uuid::new_v4(), payload: 42u64.to_le_bytes().to_vec() };
            Some(sealed(&Frame::with_item(Command::SizeAck, request.queue, item)))
        })
        .await;
        let client = client(addr).await;

        assert_eq!(client.size(name()).await.unwrap(), 42);
    }

    #[tokio::test]
    async fn mismatched_ack_is_an_unexpected_reply() {
        let addr =
            fake_broker(|request| Some(sealed(&Frame::bare(Command::ReleaseAck, request.queue))))
                .await;
        let client = client(addr).await;

        let result = client.accept(name(), Uuid::new_v4()).await;
        assert!(matches!(
            result,
            Err(ClientError::UnexpectedReply { expected: Command::AcceptAck, got: Command::ReleaseAck })
        ));
    }

    #[tokio::test]
    async fn peek_rejects_a_foreign_ack() {
        let addr =
            fake_broker(|request| Some(sealed(&Frame::bare(Command::EnqueueAck, request.queue))))
                .await;
        let client = client(addr).await;

        let result = client.peek(name()).await;
        assert!(matches!(
            result,
            Err(ClientError::UnexpectedReply { expected: Command::PeekAck, got: Command::EnqueueAck })
        ));
    }

    #[tokio::test]
    async fn peek_ack_without_an_item_is_malformed() {
        let addr =
            fake_broker(|request| Some(sealed(&Frame::bare(Command::PeekAck, request.queue))))
                .await;
        let client = client(addr).await;

        let result = client.peek(name()).await;
        assert!(matches!(result, Err(ClientError::MalformedReply)));
    }

    #[tokio::test]
    async fn size_ack_with_a_short_count_is_malformed() {
        let addr = fake_broker(|request| {
            let item = Item { id: Uuid::new_v4(), payload: vec![42, 0, 0, 0] };
            Some(sealed(&Frame::with_item(Command::SizeAck, request.queue, item)))
        })
        .await;
        let client = client(addr).await;

        let result = client.size(name()).await;
        assert!(matches!(result, Err(ClientError::MalformedReply)));
    }

    #[tokio::test]
    async fn size_ack_without_an_item_is_malformed() {
        let addr =
            fake_broker(|request| Some(sealed(&Frame::bare(Command::SizeAck, request.queue))))
                .await;
        let client = client(addr).await;

        let result = client.size(name()).await;
        assert!(matches!(result, Err(ClientError::MalformedReply)));
    }

    #[tokio::test]
    async fn reply_under_a_foreign_key_fails_authentication() {
        let addr = fake_broker(|request| {
            let foreign = queuic_crypto::derive_key("someone-else");
            let reply = Frame::bare(Command::ReleaseAck, request.queue);
            Some(queuic_crypto::seal(&foreign, &reply.encode()).unwrap())
        })
        .await;
        let client = client(addr).await;

        let result = client.release(name(), Uuid::new_v4()).await;
        assert!(matches!(
            result,
            Err(ClientError::Envelope(EnvelopeError::Authentication))
        ));
    }

    #[tokio::test]
    async fn undecodable_reply_is_a_frame_error() {
        // Authenticates fine, but the plaintext is shorter than a header.
        let addr = fake_broker(|_| {
            Some(queuic_crypto::seal(&queuic_crypto::derive_key(SECRET), &[0u8; 5]).unwrap())
        })
        .await;
        let client = client(addr).await;

        let result = client.size(name()).await;
        assert!(matches!(
            result,
            Err(ClientError::Frame(FrameError::TooShort { actual: 5 }))
        ));
    }
}
