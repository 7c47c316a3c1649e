/// Reference-counted connection table
///
/// Owns at most one live socket per key. Data connections are shared through
/// a refcount incremented on every acquire; the socket closes when the count
/// reaches exactly zero. Status connections carry no refcount - one shared
/// instance per proxy, torn down only when the transport itself closes.
///
/// Reconnection policy is "lazy reconnect, no retry loop": a transport close
/// removes the entry immediately and unconditionally, and nothing reopens the
/// socket until the next acquire for the same key.
use std::collections::HashMap;
use std::sync::Arc;

use crate::arguments::is_debug_registry_enabled;
use crate::logger::{ self, LogTag };
use super::transport::{ SocketControl, Transport };
use super::types::{ ConnectionKey, HandleId, SocketEventTx };

struct Connection {
    handle_id: HandleId,
    control: SocketControl,
    /// Number of subscribers sharing the socket; always 0 for status keys
    refcount: usize,
}

pub struct ConnectionRegistry {
    transport: Arc<dyn Transport>,
    events: SocketEventTx,
    connections: HashMap<ConnectionKey, Connection>,
    next_handle_id: HandleId,
}

impl ConnectionRegistry {
    pub fn new(transport: Arc<dyn Transport>, events: SocketEventTx) -> Self {
        Self {
            transport,
            events,
            connections: HashMap::new(),
            next_handle_id: 1,
        }
    }

    /// Return the status connection for a proxy, opening it if needed
    ///
    /// Idempotent with respect to handle identity while the connection is
    /// alive; no refcount is kept.
    pub fn acquire_status(&mut self, proxy: &str) -> HandleId {
        let key = ConnectionKey::status(proxy);
        if let Some(connection) = self.connections.get(&key) {
            return connection.handle_id;
        }
        self.open_connection(key, 0)
    }

    /// Return the data connection for a channel triple, opening it if needed
    ///
    /// Every call represents one new subscriber wanting the socket kept open,
    /// so the refcount is incremented on every call.
    pub fn acquire_data(&mut self, proxy: &str, reflector: &str, module: &str) -> HandleId {
        let key = ConnectionKey::data(proxy, reflector, module);
        if let Some(connection) = self.connections.get_mut(&key) {
            connection.refcount += 1;

            if is_debug_registry_enabled() {
                logger::debug(
                    LogTag::Registry,
                    &format!("Acquired {} (refcount {})", key, connection.refcount)
                );
            }

            return connection.handle_id;
        }
        self.open_connection(key, 1)
    }

    /// Release one reference to a connection
    ///
    /// Data keys decrement the refcount and close the transport when it
    /// reaches zero. Status keys are a no-op on the transport - they close
    /// only through transport-level close events.
    pub fn release(&mut self, key: &ConnectionKey) {
        if key.is_status() {
            return;
        }

        let Some(connection) = self.connections.get_mut(key) else {
            // Already gone (e.g. the transport closed first); nothing to do
            return;
        };

        connection.refcount = connection.refcount.saturating_sub(1);

        if is_debug_registry_enabled() {
            logger::debug(
                LogTag::Registry,
                &format!("Released {} (refcount {})", key, connection.refcount)
            );
        }

        if connection.refcount == 0 {
            connection.control.close();
            self.connections.remove(key);
            logger::info(LogTag::Registry, &format!("Closed {}", key));
        }
    }

    /// Handle a transport-level close for a key
    ///
    /// The entry is removed immediately and unconditionally, regardless of the
    /// recorded refcount; a subsequent acquire creates a fresh connection.
    pub fn handle_transport_closed(&mut self, key: &ConnectionKey) {
        if self.connections.remove(key).is_some() {
            logger::info(LogTag::Registry, &format!("Transport closed, removed {}", key));
        }
    }

    /// Close every remaining transport and clear the table
    pub fn shutdown(&mut self) {
        for (key, connection) in self.connections.drain() {
            connection.control.close();
            if is_debug_registry_enabled() {
                logger::debug(LogTag::Registry, &format!("Shutdown closed {}", key));
            }
        }
    }

    pub fn contains(&self, key: &ConnectionKey) -> bool {
        self.connections.contains_key(key)
    }

    pub fn refcount(&self, key: &ConnectionKey) -> Option<usize> {
        self.connections.get(key).map(|c| c.refcount)
    }

    pub fn handle_id(&self, key: &ConnectionKey) -> Option<HandleId> {
        self.connections.get(key).map(|c| c.handle_id)
    }

    pub fn connection_count(&self) -> usize {
        self.connections.len()
    }

    fn open_connection(&mut self, key: ConnectionKey, refcount: usize) -> HandleId {
        let control = self.transport.open(&key, self.events.clone());
        let handle_id = self.next_handle_id;
        self.next_handle_id += 1;

        logger::info(LogTag::Registry, &format!("Opened {} (handle {})", key, handle_id));

        self.connections.insert(key, Connection {
            handle_id,
            control,
            refcount,
        });

        handle_id
    }
}
