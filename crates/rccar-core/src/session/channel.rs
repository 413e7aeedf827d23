//! The remote communication channel: one connected TCP socket, a writer for
//! outbound messages and a [`MessageListener`] task for inbound ones.

use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tokio::io::AsyncWriteExt;
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::TcpStream;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, info, warn};

use crate::protocol::codec::encode_message;
use crate::protocol::messages::Message;
use crate::session::error::ChannelError;
use crate::session::listener::{ChannelEvent, MessageListener};

/// Owns the socket of a session.
///
/// `E` is the consumer's event type; the listener converts every
/// [`ChannelEvent`] into it before posting.
pub struct RemoteChannel<E> {
    writer: Option<OwnedWriteHalf>,
    listener: Option<MessageListener<OwnedReadHalf>>,
    events: mpsc::UnboundedSender<E>,
    interrupted: Arc<AtomicBool>,
    stop: Option<oneshot::Sender<()>>,
    peer: Option<SocketAddr>,
}

impl<E> RemoteChannel<E>
where
    E: From<ChannelEvent> + Send + 'static,
{
    /// Wraps an already connected stream. Nothing is read until
    /// [`start_listening`](Self::start_listening) is called.
    pub fn open(stream: TcpStream, events: mpsc::UnboundedSender<E>) -> Self {
        let peer = stream.peer_addr().ok();
        if let Err(e) = stream.set_nodelay(true) {
            warn!("failed to set TCP_NODELAY: {e}");
        }
        let (read_half, write_half) = stream.into_split();
        let interrupted = Arc::new(AtomicBool::new(false));
        let (stop_tx, stop_rx) = oneshot::channel();

        info!(peer = ?peer, "remote channel opened");

        Self {
            writer: Some(write_half),
            listener: Some(MessageListener::new(
                read_half,
                Arc::clone(&interrupted),
                stop_rx,
            )),
            events,
            interrupted,
            stop: Some(stop_tx),
            peer,
        }
    }

    /// Spawns the listener task. Returns `false` if it was already started
    /// or the channel is closed.
    pub fn start_listening(&mut self) -> bool {
        match self.listener.take() {
            Some(listener) if !self.is_closed() => {
                tokio::spawn(listener.run(self.events.clone()));
                debug!("listener started");
                true
            }
            _ => {
                debug!("start_listening ignored: listener already started or channel closed");
                false
            }
        }
    }

    /// Serializes `msg` and writes it to the socket.
    ///
    /// # Errors
    ///
    /// [`ChannelError::Closed`] after [`close`](Self::close), otherwise the
    /// I/O or serialization failure.
    pub async fn send(&mut self, msg: &Message) -> Result<(), ChannelError> {
        let writer = self.writer.as_mut().ok_or(ChannelError::Closed)?;
        let bytes = encode_message(msg)?;
        writer.write_all(&bytes).await?;
        writer.flush().await?;
        debug!(message_type = ?msg.message_type(), bytes = bytes.len(), "message sent");
        Ok(())
    }

    /// Stops the listener without a problem report and releases the socket.
    /// Idempotent.
    pub fn close(&mut self) {
        if self.interrupted.swap(true, Ordering::SeqCst) {
            return;
        }
        if let Some(stop) = self.stop.take() {
            let _ = stop.send(());
        }
        // Dropping the halves shuts the socket down.
        self.listener = None;
        self.writer = None;
        info!(peer = ?self.peer, "remote channel closed");
    }

    pub fn is_closed(&self) -> bool {
        self.interrupted.load(Ordering::SeqCst)
    }

    /// Address of the remote peer.
    pub fn peer_addr(&self) -> Option<SocketAddr> {
        self.peer
    }
}

impl<E> Drop for RemoteChannel<E> {
    fn drop(&mut self) {
        self.interrupted.store(true, Ordering::SeqCst);
    }
}
