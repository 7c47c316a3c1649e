/// Socket-opening abstraction and the tokio-tungstenite implementation
///
/// The registry opens sockets through the `Transport` trait so the connection
/// lifecycle logic can be exercised in tests without a network. The real
/// implementation spawns one tokio task per socket; the task forwards every
/// transport event into the engine's event channel and always ends by
/// emitting `SocketEvent::Closed`.
use std::sync::atomic::{ AtomicBool, Ordering };
use std::sync::Arc;

use futures_util::{ SinkExt, StreamExt };
use tokio::sync::Notify;
use tokio_tungstenite::{ connect_async, tungstenite::Message };
use url::Url;

use crate::arguments::is_debug_websocket_enabled;
use crate::logger::{ self, LogTag };
use super::types::{ ConnectionKey, SocketEvent, SocketEventTx };

/// Handle the registry keeps to shut a socket down
#[derive(Clone)]
pub struct SocketControl {
    shutdown: Arc<Notify>,
    closed: Arc<AtomicBool>,
}

impl SocketControl {
    pub fn new() -> Self {
        Self {
            shutdown: Arc::new(Notify::new()),
            closed: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Request the socket task to close the transport
    pub fn close(&self) {
        self.closed.store(true, Ordering::SeqCst);
        self.shutdown.notify_one();
    }

    /// Whether close() was requested (used by tests and idempotence checks)
    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    /// The notify handle a socket task selects on
    pub fn shutdown_handle(&self) -> Arc<Notify> {
        self.shutdown.clone()
    }
}

impl Default for SocketControl {
    fn default() -> Self {
        Self::new()
    }
}

/// Opens sockets for connection keys
pub trait Transport: Send + Sync {
    /// Open a socket for the key. Events flow into `events` until the
    /// transport dies; the final event for a socket is always `Closed`.
    fn open(&self, key: &ConnectionKey, events: SocketEventTx) -> SocketControl;
}

/// Production transport backed by tokio-tungstenite
pub struct WsTransport;

impl Transport for WsTransport {
    fn open(&self, key: &ConnectionKey, events: SocketEventTx) -> SocketControl {
        let control = SocketControl::new();
        let shutdown = control.shutdown_handle();
        let key = key.clone();

        tokio::spawn(async move {
            run_socket(key, events, shutdown).await;
        });

        control
    }
}

/// Drive one websocket until it closes
///
/// Transport errors are forwarded and the read loop continues; only a close
/// frame, end of stream, or a shutdown request ends the task. No reconnection
/// is attempted here - the registry's lazy-reconnect-on-next-acquire policy
/// owns that behavior.
async fn run_socket(key: ConnectionKey, events: SocketEventTx, shutdown: Arc<Notify>) {
    let endpoint = key.endpoint();

    if let Err(e) = Url::parse(&endpoint) {
        logger::error(LogTag::Websocket, &format!("Invalid endpoint '{}': {}", endpoint, e));
        let _ = events.send((key.clone(), SocketEvent::Error(e.to_string())));
        let _ = events.send((key, SocketEvent::Closed));
        return;
    }

    if is_debug_websocket_enabled() {
        logger::debug(LogTag::Websocket, &format!("Connecting to {}", endpoint));
    }

    let ws_stream = match connect_async(endpoint.as_str()).await {
        Ok((stream, _)) => stream,
        Err(e) => {
            logger::warning(
                LogTag::Websocket,
                &format!("Failed to connect to {}: {}", endpoint, e)
            );
            let _ = events.send((key.clone(), SocketEvent::Error(e.to_string())));
            let _ = events.send((key, SocketEvent::Closed));
            return;
        }
    };

    let _ = events.send((key.clone(), SocketEvent::Open));
    let (mut ws_sender, mut ws_receiver) = ws_stream.split();

    loop {
        tokio::select! {
            _ = shutdown.notified() => {
                if is_debug_websocket_enabled() {
                    logger::debug(LogTag::Websocket, &format!("Closing {} (released)", key));
                }
                let _ = ws_sender.send(Message::Close(None)).await;
                break;
            }
            message = ws_receiver.next() => {
                match message {
                    Some(Ok(Message::Text(text))) => {
                        let _ = events.send((key.clone(), SocketEvent::Message(text)));
                    }
                    Some(Ok(Message::Close(_))) => {
                        if is_debug_websocket_enabled() {
                            logger::debug(
                                LogTag::Websocket,
                                &format!("{} closed by server", key)
                            );
                        }
                        break;
                    }
                    Some(Ok(_)) => {
                        // Binary, ping and pong frames carry nothing for us
                    }
                    Some(Err(e)) => {
                        // Errors are non-fatal at this layer; the connection
                        // stays registered until the stream actually ends
                        let _ = events.send((key.clone(), SocketEvent::Error(e.to_string())));
                    }
                    None => {
                        break;
                    }
                }
            }
        }
    }

    let _ = events.send((key, SocketEvent::Closed));
}

#[cfg(test)]
pub(crate) mod testing {
    //! Scriptable transport for registry/engine tests
    use std::sync::Mutex;

    use super::*;

    pub struct MockSocket {
        pub key: ConnectionKey,
        pub events: SocketEventTx,
        pub control: SocketControl,
    }

    /// Records every opened socket and lets tests inject events as if they
    /// arrived from the network.
    #[derive(Default)]
    pub struct MockTransport {
        pub sockets: Mutex<Vec<MockSocket>>,
    }

    impl MockTransport {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn open_count(&self) -> usize {
            self.sockets.lock().unwrap().len()
        }

        /// Controls of every socket opened for `key`, in open order
        pub fn controls_for(&self, key: &ConnectionKey) -> Vec<SocketControl> {
            self.sockets
                .lock()
                .unwrap()
                .iter()
                .filter(|s| &s.key == key)
                .map(|s| s.control.clone())
                .collect()
        }

        /// Inject an event on the most recently opened socket for `key`
        pub fn inject(&self, key: &ConnectionKey, event: SocketEvent) {
            let sockets = self.sockets.lock().unwrap();
            let socket = sockets
                .iter()
                .rev()
                .find(|s| &s.key == key)
                .expect("no socket opened for key");
            socket.events.send((key.clone(), event)).expect("event channel closed");
        }
    }

    impl Transport for MockTransport {
        fn open(&self, key: &ConnectionKey, events: SocketEventTx) -> SocketControl {
            let control = SocketControl::new();
            self.sockets.lock().unwrap().push(MockSocket {
                key: key.clone(),
                events,
                control: control.clone(),
            });
            control
        }
    }
}
