//! The message listener loop.
//!
//! Runs on its own task, reads the socket, cuts the byte stream into JSON
//! values and posts each decoded message to the session's event queue in the
//! order it arrived. The loop never touches session state.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, warn};

use crate::protocol::codec::{
    decode_message, leading_whitespace, ProtocolError, MAX_MESSAGE_SIZE,
};
use crate::protocol::messages::Message;
use crate::session::error::ChannelError;

/// Read buffer size per socket read.
const READ_CHUNK_SIZE: usize = 4096;

/// What the listener loop reports to its consumer.
#[derive(Debug)]
pub enum ChannelEvent {
    MessageReceived(Message),
    /// The stream ended or broke while the channel was open. Posted at most once.
    ConnectionProblem(ChannelError),
}

/// Reads messages from `reader` until EOF, an error, or interruption.
pub struct MessageListener<R> {
    reader: R,
    interrupted: Arc<AtomicBool>,
    stop: oneshot::Receiver<()>,
}

impl<R> MessageListener<R>
where
    R: AsyncRead + Unpin,
{
    /// Creates a listener. Setting `interrupted` and then firing (or dropping)
    /// the sender side of `stop` ends the loop silently.
    pub fn new(reader: R, interrupted: Arc<AtomicBool>, stop: oneshot::Receiver<()>) -> Self {
        Self {
            reader,
            interrupted,
            stop,
        }
    }

    /// Runs the loop to completion.
    pub async fn run<E>(mut self, events: mpsc::UnboundedSender<E>)
    where
        E: From<ChannelEvent>,
    {
        let mut buffer: Vec<u8> = Vec::with_capacity(READ_CHUNK_SIZE);
        let mut chunk = [0u8; READ_CHUNK_SIZE];

        loop {
            // Post every complete message already buffered.
            loop {
                let skip = leading_whitespace(&buffer);
                buffer.drain(..skip);

                match decode_message(&buffer) {
                    Ok((msg, consumed)) => {
                        buffer.drain(..consumed);
                        if self.is_interrupted() {
                            return;
                        }
                        debug!(message_type = ?msg.message_type(), "message received");
                        if events.send(E::from(ChannelEvent::MessageReceived(msg))).is_err() {
                            debug!("event queue closed, listener exiting");
                            return;
                        }
                    }
                    Err(ProtocolError::InsufficientData { available }) => {
                        // Each read re-parses the incomplete prefix, so the prefix is capped.
                        if available > MAX_MESSAGE_SIZE {
                            let too_large = ProtocolError::MessageTooLarge {
                                size: available,
                                max: MAX_MESSAGE_SIZE,
                            };
                            self.report(&events, ChannelError::Protocol(too_large));
                            return;
                        }
                        break;
                    }
                    Err(e) => {
                        self.report(&events, ChannelError::Protocol(e));
                        return;
                    }
                }
            }

            let read = tokio::select! {
                _ = &mut self.stop => return,
                read = self.reader.read(&mut chunk) => read,
            };

            match read {
                Ok(0) => {
                    self.report(&events, ChannelError::UnexpectedEof);
                    return;
                }
                Ok(n) => buffer.extend_from_slice(&chunk[..n]),
                Err(e) => {
                    self.report(&events, ChannelError::Io(e));
                    return;
                }
            }
        }
    }

    fn is_interrupted(&self) -> bool {
        self.interrupted.load(Ordering::SeqCst)
    }

    fn report<E>(&self, events: &mpsc::UnboundedSender<E>, problem: ChannelError)
    where
        E: From<ChannelEvent>,
    {
        if self.is_interrupted() {
            debug!(error = %problem, "listener stopped after close");
            return;
        }
        warn!(error = %problem, "connection problem");
        let _ = events.send(E::from(ChannelEvent::ConnectionProblem(problem)));
    }
}
