/// Core types shared across the connection layer
use tokio::sync::mpsc;

use crate::protocol;

/// Identity of one underlying socket; a reconnect yields a new id
pub type HandleId = u64;

/// Stable positional index into a key's listener slot sequence
pub type ListenerToken = usize;

/// Identifies one shared socket
///
/// Data connections are keyed by the full (proxy, reflector, module) triple;
/// status connections by the proxy alone. Equality is field-wise, so two
/// sessions tuned to the same channel share one key.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ConnectionKey {
    Status {
        proxy: String,
    },
    Data {
        proxy: String,
        reflector: String,
        module: String,
    },
}

impl ConnectionKey {
    pub fn status(proxy: &str) -> Self {
        ConnectionKey::Status { proxy: proxy.to_string() }
    }

    pub fn data(proxy: &str, reflector: &str, module: &str) -> Self {
        ConnectionKey::Data {
            proxy: proxy.to_string(),
            reflector: reflector.to_string(),
            module: module.to_string(),
        }
    }

    pub fn is_status(&self) -> bool {
        matches!(self, ConnectionKey::Status { .. })
    }

    pub fn proxy(&self) -> &str {
        match self {
            ConnectionKey::Status { proxy } => proxy,
            ConnectionKey::Data { proxy, .. } => proxy,
        }
    }

    /// Websocket endpoint URL for this key
    pub fn endpoint(&self) -> String {
        match self {
            ConnectionKey::Status { proxy } => protocol::status_endpoint(proxy),
            ConnectionKey::Data { proxy, reflector, module } =>
                protocol::data_endpoint(proxy, reflector, module),
        }
    }
}

impl std::fmt::Display for ConnectionKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConnectionKey::Status { proxy } => write!(f, "status:{}", proxy),
            ConnectionKey::Data { proxy, reflector, module } =>
                write!(f, "data:{}/{}/{}", proxy, reflector, module),
        }
    }
}

/// Raw events a socket task forwards to the engine
#[derive(Debug, Clone)]
pub enum SocketEvent {
    /// Transport established
    Open,
    /// Inbound text frame
    Message(String),
    /// Transport-level error; non-fatal, the connection stays registered
    Error(String),
    /// Transport gone (remote- or self-initiated); the registry entry is removed
    Closed,
}

pub type SocketEventTx = mpsc::UnboundedSender<(ConnectionKey, SocketEvent)>;
pub type SocketEventRx = mpsc::UnboundedReceiver<(ConnectionKey, SocketEvent)>;

/// Capability record of one subscriber
///
/// Every field is optional; an absent capability is silently skipped during
/// dispatch. Hooks run synchronously on the engine loop, so they must not
/// block; follow-up work that touches the registry or multicaster goes back
/// through the engine's command channel instead.
#[derive(Default)]
pub struct ListenerHooks {
    pub on_open: Option<Box<dyn FnMut() + Send>>,
    pub on_close: Option<Box<dyn FnMut() + Send>>,
    pub on_error: Option<Box<dyn FnMut(&str) + Send>>,
    pub on_message: Option<Box<dyn FnMut(&str) + Send>>,
}

impl ListenerHooks {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on_open(mut self, f: impl FnMut() + Send + 'static) -> Self {
        self.on_open = Some(Box::new(f));
        self
    }

    pub fn on_close(mut self, f: impl FnMut() + Send + 'static) -> Self {
        self.on_close = Some(Box::new(f));
        self
    }

    pub fn on_error(mut self, f: impl FnMut(&str) + Send + 'static) -> Self {
        self.on_error = Some(Box::new(f));
        self
    }

    pub fn on_message(mut self, f: impl FnMut(&str) + Send + 'static) -> Self {
        self.on_message = Some(Box::new(f));
        self
    }
}

impl std::fmt::Debug for ListenerHooks {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ListenerHooks")
            .field("on_open", &self.on_open.is_some())
            .field("on_close", &self.on_close.is_some())
            .field("on_error", &self.on_error.is_some())
            .field("on_message", &self.on_message.is_some())
            .finish()
    }
}
