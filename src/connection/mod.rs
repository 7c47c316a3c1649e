//! Shared-connection layer: one live socket per channel key, reference-counted
//! sharing for data connections, and ordered event fan-out to listeners.
//!
//! - `types` — connection keys, socket events, listener capability records
//! - `transport` — the socket-opening abstraction and its tokio-tungstenite implementation
//! - `registry` — the reference-counted connection table
//! - `multicaster` — per-key listener slots with stable tombstoning tokens

pub mod multicaster;
pub mod registry;
pub mod transport;
pub mod types;

pub use multicaster::{ ListenerMulticaster, ListenerSlot };
pub use registry::ConnectionRegistry;
pub use transport::{ SocketControl, Transport, WsTransport };
pub use types::{
    ConnectionKey,
    HandleId,
    ListenerHooks,
    ListenerToken,
    SocketEvent,
    SocketEventRx,
    SocketEventTx,
};
