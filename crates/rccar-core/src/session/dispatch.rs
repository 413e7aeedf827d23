//! Handler registry and dispatch core.
//!
//! A [`Session`] owns one [`RemoteChannel`], the role logic `A` and the
//! registry mapping each [`MessageType`] to its [`MessageHandler`]. All of
//! this lives on a single consumer task that drains one event queue:
//!
//! ```text
//!   listener task ──ChannelEvent──┐
//!   SessionHandle::post ──Work────┼──► mpsc ──► Session::run ──► handler
//!   timers / cyclic tasks ──Work──┘
//! ```
//!
//! Handlers never hold a reference to the session. They get a
//! [`HandlerContext`] that exposes the role state and records intents
//! (send, register, clear, close); the session applies the intents in order
//! right after the handler returns.
//!
//! Every failure funnels into [`Session::handle_error`], which tears the
//! session down once and reports a single [`ConnectionLost`].

use std::collections::HashMap;
use std::marker::PhantomData;
use std::net::SocketAddr;
use std::time::Duration;

use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use crate::protocol::messages::{Message, MessageType};
use crate::service::location::{LocationService, LocationServiceFactory};
use crate::session::channel::RemoteChannel;
use crate::session::error::{
    ConnectionLost, HandlerError, SessionError, LABEL_CONNECTION_PROBLEM, LABEL_SEND_MESSAGE,
};
use crate::session::listener::ChannelEvent;

// ── Traits ────────────────────────────────────────────────────────────────────

/// Role logic (Host or Client) driven by a [`Session`].
pub trait SessionApp: Send + Sized + 'static {
    /// Called once when the session is torn down, before any
    /// [`connection_lost`](Self::connection_lost). Releases role resources.
    fn session_closed(&mut self) {}

    /// Called at most once per session when it ends because of an error.
    /// Never called after an explicit close.
    fn connection_lost(&mut self, lost: &ConnectionLost);
}

/// Handles all received messages of one [`MessageType`].
pub trait MessageHandler<A: SessionApp>: Send {
    fn message_type(&self) -> MessageType;

    /// Processes `message`. An `Err` ends the session.
    fn handle(
        &mut self,
        message: &Message,
        ctx: &mut HandlerContext<'_, A>,
    ) -> Result<(), HandlerError>;
}

/// A unit of work executed on the consumer task.
pub type Work<A> =
    Box<dyn FnOnce(&mut HandlerContext<'_, A>) -> Result<(), HandlerError> + Send + 'static>;

/// Everything the consumer task reacts to.
pub enum SessionEvent<A: SessionApp> {
    Channel(ChannelEvent),
    Work(Work<A>),
    /// Explicit close requested through a [`SessionHandle`].
    Close,
}

impl<A: SessionApp> From<ChannelEvent> for SessionEvent<A> {
    fn from(event: ChannelEvent) -> Self {
        SessionEvent::Channel(event)
    }
}

// ── Closure handlers ──────────────────────────────────────────────────────────

/// Adapts a closure into a [`MessageHandler`].
pub struct FnHandler<A, F> {
    message_type: MessageType,
    handler: F,
    _app: PhantomData<fn() -> A>,
}

/// Builds a handler for `message_type` from a closure.
pub fn handler_fn<A, F>(message_type: MessageType, handler: F) -> FnHandler<A, F>
where
    A: SessionApp,
    F: FnMut(&Message, &mut HandlerContext<'_, A>) -> Result<(), HandlerError> + Send,
{
    FnHandler {
        message_type,
        handler,
        _app: PhantomData,
    }
}

impl<A, F> MessageHandler<A> for FnHandler<A, F>
where
    A: SessionApp,
    F: FnMut(&Message, &mut HandlerContext<'_, A>) -> Result<(), HandlerError> + Send,
{
    fn message_type(&self) -> MessageType {
        self.message_type
    }

    fn handle(
        &mut self,
        message: &Message,
        ctx: &mut HandlerContext<'_, A>,
    ) -> Result<(), HandlerError> {
        (self.handler)(message, ctx)
    }
}

// ── Handle ────────────────────────────────────────────────────────────────────

/// Cloneable sender for posting work onto a session's consumer task.
pub struct SessionHandle<A: SessionApp> {
    tx: mpsc::UnboundedSender<SessionEvent<A>>,
}

impl<A: SessionApp> Clone for SessionHandle<A> {
    fn clone(&self) -> Self {
        Self {
            tx: self.tx.clone(),
        }
    }
}

impl<A: SessionApp> SessionHandle<A> {
    /// Queues `work` behind every event already pending. Returns `false`
    /// once the session is closed, even while the [`Session`] value is still
    /// alive.
    pub fn post<F>(&self, work: F) -> bool
    where
        F: FnOnce(&mut HandlerContext<'_, A>) -> Result<(), HandlerError> + Send + 'static,
    {
        self.tx.send(SessionEvent::Work(Box::new(work))).is_ok()
    }

    /// Queues `work` after `delay`. Aborting the returned task cancels it.
    pub fn post_delayed<F>(&self, delay: Duration, work: F) -> JoinHandle<()>
    where
        F: FnOnce(&mut HandlerContext<'_, A>) -> Result<(), HandlerError> + Send + 'static,
    {
        let handle = self.clone();
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            handle.post(work);
        })
    }

    /// Requests an explicit close. The session ends without notification.
    pub fn close(&self) -> bool {
        self.tx.send(SessionEvent::Close).is_ok()
    }

    /// `true` once the session is closed or dropped.
    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}

// ── Handler context ───────────────────────────────────────────────────────────

enum Intent<A: SessionApp> {
    Send(Message),
    Register(Box<dyn MessageHandler<A>>),
    ClearHandlers,
    Close,
}

#[derive(Default)]
struct LocationSlot {
    factory: Option<LocationServiceFactory>,
    service: Option<Box<dyn LocationService>>,
}

impl LocationSlot {
    fn enable(&mut self) -> bool {
        if self.service.is_some() {
            return true;
        }
        let Some(factory) = self.factory.take() else {
            warn!("location requested but this session has no location service");
            return false;
        };
        let mut service = factory();
        service.start_listen();
        info!("location service enabled");
        self.service = Some(service);
        true
    }

    fn stop(&mut self) {
        if let Some(service) = self.service.as_mut() {
            service.stop_listen();
        }
    }
}

/// What a handler or posted work item may see and do.
pub struct HandlerContext<'a, A: SessionApp> {
    app: &'a mut A,
    location: &'a mut LocationSlot,
    handle: &'a SessionHandle<A>,
    peer: Option<SocketAddr>,
    intents: Vec<Intent<A>>,
}

impl<'a, A: SessionApp> HandlerContext<'a, A> {
    fn new(
        app: &'a mut A,
        location: &'a mut LocationSlot,
        handle: &'a SessionHandle<A>,
        peer: Option<SocketAddr>,
    ) -> Self {
        Self {
            app,
            location,
            handle,
            peer,
            intents: Vec::new(),
        }
    }

    /// The role state.
    pub fn app(&mut self) -> &mut A {
        &mut *self.app
    }

    /// Queues `message` for sending.
    pub fn send(&mut self, message: Message) {
        self.intents.push(Intent::Send(message));
    }

    /// Registers `handler`, replacing any handler for the same type.
    pub fn register_handler<H>(&mut self, handler: H)
    where
        H: MessageHandler<A> + 'static,
    {
        self.intents.push(Intent::Register(Box::new(handler)));
    }

    /// Removes every registered handler.
    pub fn clear_handlers(&mut self) {
        self.intents.push(Intent::ClearHandlers);
    }

    /// Closes the session without notification once this handler returns.
    pub fn close(&mut self) {
        self.intents.push(Intent::Close);
    }

    /// Creates and starts the session's location service on first call.
    /// Returns `false` if the session was built without one.
    pub fn enable_location_service(&mut self) -> bool {
        self.location.enable()
    }

    /// The location service, once enabled.
    pub fn location_service(&mut self) -> Option<&mut (dyn LocationService + 'static)> {
        self.location.service.as_deref_mut()
    }

    /// A handle for posting future work to this session.
    pub fn handle(&self) -> SessionHandle<A> {
        self.handle.clone()
    }

    /// Address of the remote peer.
    pub fn peer_addr(&self) -> Option<SocketAddr> {
        self.peer
    }
}

// ── Session ───────────────────────────────────────────────────────────────────

/// Lifecycle of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// Handlers may be registered; the listener is not running yet.
    Constructing,
    Active,
    /// Terminal. Reached exactly once.
    Closed,
}

/// One connection between a Host and a Client.
pub struct Session<A: SessionApp> {
    state: SessionState,
    app: A,
    handlers: HashMap<MessageType, Box<dyn MessageHandler<A>>>,
    channel: RemoteChannel<SessionEvent<A>>,
    events: mpsc::UnboundedReceiver<SessionEvent<A>>,
    handle: SessionHandle<A>,
    location: LocationSlot,
}

impl<A: SessionApp> Session<A> {
    /// Wraps a connected stream. `location` builds the location service the
    /// first time a handler enables it.
    pub fn new(stream: TcpStream, app: A, location: Option<LocationServiceFactory>) -> Self {
        let (tx, events) = mpsc::unbounded_channel();
        let channel = RemoteChannel::open(stream, tx.clone());
        Self {
            state: SessionState::Constructing,
            app,
            handlers: HashMap::new(),
            channel,
            events,
            handle: SessionHandle { tx },
            location: LocationSlot {
                factory: location,
                service: None,
            },
        }
    }

    /// Starts reading from the socket.
    pub fn start(&mut self) {
        if self.state != SessionState::Constructing {
            warn!(state = ?self.state, "session already started");
            return;
        }
        self.channel.start_listening();
        self.state = SessionState::Active;
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn is_closed(&self) -> bool {
        self.state == SessionState::Closed
    }

    pub fn app(&self) -> &A {
        &self.app
    }

    pub fn app_mut(&mut self) -> &mut A {
        &mut self.app
    }

    pub fn handle(&self) -> SessionHandle<A> {
        self.handle.clone()
    }

    pub fn peer_addr(&self) -> Option<SocketAddr> {
        self.channel.peer_addr()
    }

    /// `true` if a handler for `message_type` is registered.
    pub fn has_handler(&self, message_type: MessageType) -> bool {
        self.handlers.contains_key(&message_type)
    }

    /// Number of registered handlers.
    pub fn handler_count(&self) -> usize {
        self.handlers.len()
    }

    /// Registers `handler`; a previous handler for the same type is replaced.
    pub fn register_message_handler<H>(&mut self, handler: H)
    where
        H: MessageHandler<A> + 'static,
    {
        self.register_boxed(Box::new(handler));
    }

    fn register_boxed(&mut self, handler: Box<dyn MessageHandler<A>>) {
        let message_type = handler.message_type();
        if self.handlers.insert(message_type, handler).is_some() {
            debug!(?message_type, "message handler replaced");
        } else {
            debug!(?message_type, "message handler registered");
        }
    }

    pub fn clear_message_handlers(&mut self) {
        self.handlers.clear();
        debug!("message handlers cleared");
    }

    /// Sends `message`; a write failure ends the session.
    pub async fn send_message(&mut self, message: Message) {
        if self.is_closed() {
            warn!(message_type = ?message.message_type(), "send on closed session dropped");
            return;
        }
        if let Err(e) = self.channel.send(&message).await {
            self.handle_error(SessionError::WriteFailure(e), Some(LABEL_SEND_MESSAGE));
        }
    }

    /// Ends the session without notifying the role logic. Idempotent.
    pub fn close(&mut self) {
        if self.teardown() {
            info!("session closed");
        }
    }

    /// Logs `cause` and, unless already closed, tears the session down and
    /// reports exactly one [`ConnectionLost`].
    pub fn handle_error(&mut self, cause: SessionError, label: Option<&'static str>) {
        if self.is_closed() {
            warn!(label = label.unwrap_or("-"), error = %cause, "error after session close ignored");
            return;
        }
        error!(label = label.unwrap_or("-"), error = %cause, "session error");
        self.teardown();
        self.app.connection_lost(&ConnectionLost { label, cause });
    }

    /// Processes events until the session is closed.
    pub async fn run(&mut self) {
        while self.step().await {}
        debug!("session loop finished");
    }

    /// Processes the next event. Returns `false` once the session is closed.
    pub async fn step(&mut self) -> bool {
        if self.is_closed() {
            return false;
        }
        let Some(event) = self.events.recv().await else {
            return false;
        };
        self.process(event).await;
        !self.is_closed()
    }

    async fn process(&mut self, event: SessionEvent<A>) {
        match event {
            SessionEvent::Channel(ChannelEvent::MessageReceived(message)) => {
                self.dispatch(message).await
            }
            SessionEvent::Channel(ChannelEvent::ConnectionProblem(problem)) => self.handle_error(
                SessionError::ConnectionProblem(problem),
                Some(LABEL_CONNECTION_PROBLEM),
            ),
            SessionEvent::Work(work) => {
                let (intents, result) = {
                    let peer = self.channel.peer_addr();
                    let mut ctx =
                        HandlerContext::new(&mut self.app, &mut self.location, &self.handle, peer);
                    let result = work(&mut ctx);
                    (ctx.intents, result)
                };
                self.finish(intents, result).await;
            }
            SessionEvent::Close => self.close(),
        }
    }

    async fn dispatch(&mut self, message: Message) {
        let message_type = message.message_type();
        let peer = self.channel.peer_addr();
        let Some(handler) = self.handlers.get_mut(&message_type) else {
            self.handle_error(SessionError::UnsupportedMessage(message_type), None);
            return;
        };
        debug!(?message_type, "dispatching message");

        let (intents, result) = {
            let mut ctx =
                HandlerContext::new(&mut self.app, &mut self.location, &self.handle, peer);
            let result = handler.handle(&message, &mut ctx);
            (ctx.intents, result)
        };
        self.finish(intents, result).await;
    }

    /// Applies recorded intents in order, then escalates a handler error.
    async fn finish(&mut self, intents: Vec<Intent<A>>, result: Result<(), HandlerError>) {
        for intent in intents {
            if self.is_closed() {
                break;
            }
            match intent {
                Intent::Send(message) => self.send_message(message).await,
                Intent::Register(handler) => self.register_boxed(handler),
                Intent::ClearHandlers => self.clear_message_handlers(),
                Intent::Close => self.close(),
            }
        }
        if let Err(e) = result {
            self.handle_error(SessionError::from(e), None);
        }
    }

    /// Returns `false` if the session was already closed.
    fn teardown(&mut self) -> bool {
        if self.is_closed() {
            return false;
        }
        self.state = SessionState::Closed;
        self.handlers.clear();
        self.channel.close();
        self.location.stop();
        // Posts from now on fail instead of queueing work that never runs.
        self.events.close();
        self.app.session_closed();
        true
    }
}

impl<A: SessionApp> Drop for Session<A> {
    fn drop(&mut self) {
        self.close();
    }
}
