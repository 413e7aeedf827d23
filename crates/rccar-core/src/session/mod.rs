//! One Host/Client connection: the remote channel, its listener loop and the
//! handler dispatch core.

pub mod channel;
pub mod dispatch;
pub mod error;
pub mod listener;

pub use channel::RemoteChannel;
pub use dispatch::{
    handler_fn, HandlerContext, MessageHandler, Session, SessionApp, SessionEvent, SessionHandle,
    SessionState,
};
pub use error::{ChannelError, ConnectionLost, HandlerError, SessionError};
pub use listener::{ChannelEvent, MessageListener};
